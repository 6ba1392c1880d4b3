//! Shipping rates, labels and tracking

use axum::extract::{Path, Query, State};
use axum::{Router, routing::{get, post}};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::models::{
    Address, CreateLabelRequest, OrderStatus, ShippingLabel, ShippingRate, ShippingRatesRequest,
    TrackingInfo,
};
use shared::{ApiResponse, AppError, AppResult, ErrorCode};

use crate::api::JsonBody;
use crate::error::IntegrationResultExt;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/shipping-rates", post(rates))
        .route("/api/shipping-label", post(create_label))
        .route("/api/shipping-track", get(track_query).post(track_query))
        .route(
            "/api/shipping-track/{tracking_number}",
            get(track_path).post(track_path),
        )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatesResponse {
    pub rates: Vec<ShippingRate>,
    pub shipping_address: Address,
}

#[derive(Debug, Serialize)]
pub struct LabelResponse {
    #[serde(flatten)]
    pub label: ShippingLabel,
    /// Whether the label reached a real database
    pub saved: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackQuery {
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
}

/// POST /api/shipping-rates
pub async fn rates(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ShippingRatesRequest>,
) -> AppResult<ApiResponse<RatesResponse>> {
    tracing::info!(
        city = %req.to_address.city,
        state = %req.to_address.state,
        items = req.items.len(),
        "Fetching shipping rates"
    );
    let rates = state
        .shipping
        .get_rates(&req.to_address, &req.items)
        .await
        .or_app(ErrorCode::ShippingRatesFailed)?;

    Ok(ApiResponse::success(RatesResponse {
        rates,
        shipping_address: req.to_address,
    }))
}

/// POST /api/shipping-label
///
/// Buys the label, saves it and marks the order shipped. A failure after
/// the purchase is reported as-is; the purchased label is not voided.
pub async fn create_label(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateLabelRequest>,
) -> AppResult<ApiResponse<LabelResponse>> {
    if req.rate_id.is_empty() || req.order_id.is_empty() {
        return Err(AppError::with_message(
            ErrorCode::RequiredField,
            "rateId and orderId are required",
        ));
    }

    let purchased = state
        .shipping
        .create_label(&req.rate_id, &req.order_id)
        .await
        .or_app(ErrorCode::ShippingLabelFailed)?;

    let label = ShippingLabel {
        shipping_id: format!("ship_{}", shared::util::now_millis()),
        order_id: req.order_id.clone(),
        carrier: purchased.carrier,
        tracking_number: purchased.tracking_number,
        tracking_url: purchased.tracking_url,
        label_url: purchased.label_url,
        cost: purchased.cost,
        currency: purchased.currency,
        rate_id: req.rate_id,
        transaction_id: purchased.transaction_id,
        created: Utc::now(),
    };

    let label = state
        .database
        .save_shipping_label(&label)
        .await
        .or_app(ErrorCode::ShippingLabelFailed)?;
    state
        .database
        .update_order_status(&req.order_id, OrderStatus::Shipped)
        .await
        .or_app(ErrorCode::ShippingLabelFailed)?;

    match state.database.get_order(&req.order_id).await {
        Ok(Some(order)) => tracing::info!(
            order_id = %req.order_id,
            to = %order.customer.email,
            tracking_number = %label.tracking_number,
            "Shipping notification pending"
        ),
        Ok(None) => {}
        Err(e) => tracing::warn!(order_id = %req.order_id, error = %e, "Order lookup for notification failed"),
    }

    Ok(ApiResponse::success(LabelResponse {
        saved: state.database.is_configured(),
        label,
    }))
}

/// Letters, digits, `_` and `-`, at most 64 characters
fn is_plain_token(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= 64
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

async fn track(state: &AppState, tracking_number: &str, carrier: Option<&str>) -> AppResult<TrackingInfo> {
    let carrier = carrier.filter(|c| !c.is_empty()).unwrap_or("usps");
    for (field, value) in [("trackingNumber", tracking_number), ("carrier", carrier)] {
        if !is_plain_token(value) {
            return Err(AppError::with_message(
                ErrorCode::InvalidFormat,
                format!("{field} may only contain letters, digits, '_' and '-'"),
            )
            .with_detail(field, value));
        }
    }
    tracing::info!(tracking_number = %tracking_number, carrier = %carrier, "Tracking package");
    state
        .shipping
        .track(tracking_number, carrier)
        .await
        .or_app(ErrorCode::TrackingFailed)?
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::NotFound, "Tracking information not found")
        })
}

/// GET|POST /api/shipping-track/{tracking_number}
pub async fn track_path(
    State(state): State<AppState>,
    Path(tracking_number): Path<String>,
    Query(query): Query<TrackQuery>,
) -> AppResult<ApiResponse<TrackingInfo>> {
    track(&state, &tracking_number, query.carrier.as_deref())
        .await
        .map(ApiResponse::success)
}

/// GET|POST /api/shipping-track?trackingNumber=&carrier=
pub async fn track_query(
    State(state): State<AppState>,
    Query(query): Query<TrackQuery>,
) -> AppResult<ApiResponse<TrackingInfo>> {
    let tracking_number = query
        .tracking_number
        .as_deref()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::RequiredField, "trackingNumber is required")
        })?;
    track(&state, tracking_number, query.carrier.as_deref())
        .await
        .map(ApiResponse::success)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_token() {
        assert!(is_plain_token("9400111899223197428490"));
        assert!(is_plain_token("SHIPPO_TRANSIT"));
        assert!(is_plain_token("dhl_express"));
        assert!(!is_plain_token(""));
        assert!(!is_plain_token("../shipments"));
        assert!(!is_plain_token("usps/9400"));
        assert!(!is_plain_token("9400?results=100"));
        assert!(!is_plain_token(&"9".repeat(65)));
    }
}
