//! Quotes and the pricing catalog

use axum::{Router, extract::State, routing::get};
use shared::models::{PricingOptions, PricingQuote, PricingRequest};
use shared::pricing::{calculate_quote, pricing_options};
use shared::{ApiResponse, AppResult, ErrorCode};

use crate::api::JsonBody;
use crate::error::IntegrationResultExt;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/pricing-calculate", get(options).post(calculate))
}

/// POST /api/pricing-calculate
pub async fn calculate(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<PricingRequest>,
) -> AppResult<ApiResponse<PricingQuote>> {
    let quote = calculate_quote(&req);
    let quote = state
        .database
        .save_pricing(&quote)
        .await
        .or_app(ErrorCode::PricingFailed)?;

    tracing::info!(
        pricing_id = %quote.id,
        material = %quote.material.name,
        total = quote.breakdown.total,
        "Quote calculated"
    );
    Ok(ApiResponse::success(quote))
}

/// GET /api/pricing-calculate
pub async fn options() -> ApiResponse<PricingOptions> {
    ApiResponse::success(pricing_options())
}
