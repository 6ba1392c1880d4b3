//! Payment intents and payment processing

use axum::{Router, extract::State, routing::post};
use shared::models::payment::DEFAULT_INTENT_AMOUNT;
use shared::models::{CreateIntentRequest, OrderStatus, Payment, PaymentIntent, ProcessPaymentRequest};
use shared::{ApiResponse, AppError, AppResult, ErrorCode};

use crate::api::JsonBody;
use crate::error::IntegrationResultExt;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/payments-create-intent", post(create_intent))
        .route("/api/payments-process", post(process_payment))
}

/// `pi_` followed by letters, digits or underscores
fn is_intent_id(id: &str) -> bool {
    id.strip_prefix("pi_").is_some_and(|rest| {
        !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

/// POST /api/payments-create-intent
pub async fn create_intent(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateIntentRequest>,
) -> AppResult<ApiResponse<PaymentIntent>> {
    let amount = req.amount.filter(|a| *a > 0).unwrap_or(DEFAULT_INTENT_AMOUNT);
    let order_id = req
        .order_id
        .unwrap_or_else(|| format!("order_{}", shared::util::now_millis()));

    let intent = state
        .payments
        .create_intent(amount, &req.currency, &order_id)
        .await
        .or_app(ErrorCode::PaymentIntentFailed)?;

    tracing::info!(
        order_id = %order_id,
        intent_id = %intent.payment_intent_id,
        amount,
        "Payment intent created"
    );
    Ok(ApiResponse::success(intent))
}

/// POST /api/payments-process
///
/// Records the intent's current state; a succeeded intent also confirms
/// the order.
pub async fn process_payment(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ProcessPaymentRequest>,
) -> AppResult<ApiResponse<Payment>> {
    let intent_id = req
        .payment_intent_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::RequiredField, "paymentIntentId is required")
        })?;

    if !is_intent_id(&intent_id) {
        return Err(AppError::with_message(
            ErrorCode::InvalidFormat,
            "paymentIntentId is not a valid payment intent id",
        )
        .with_detail("paymentIntentId", intent_id));
    }

    let intent = state
        .payments
        .retrieve_intent(&intent_id)
        .await
        .or_app(ErrorCode::PaymentFailed)?
        .ok_or_else(|| {
            AppError::new(ErrorCode::PaymentIntentNotFound)
                .with_detail("paymentIntentId", intent_id.clone())
        })?;

    let payment = Payment::from_intent(
        &intent,
        req.order_id.clone().unwrap_or_else(|| "unknown".into()),
    );
    let payment = state
        .database
        .save_payment(&payment)
        .await
        .or_app(ErrorCode::PaymentFailed)?;

    if intent.is_succeeded() {
        if let Some(order_id) = &req.order_id {
            state
                .database
                .update_order_status(order_id, OrderStatus::PaymentConfirmed)
                .await
                .or_app(ErrorCode::PaymentFailed)?;
        }
        tracing::info!(intent_id = %intent_id, "Payment succeeded");
    } else {
        tracing::warn!(intent_id = %intent_id, status = %intent.status, "Payment not completed");
    }

    Ok(ApiResponse::success(payment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_id_shape() {
        assert!(is_intent_id("pi_3MtwBwLkdIwHu7ix28a3tqPa"));
        assert!(is_intent_id("pi_mock_1700000000000"));
        assert!(!is_intent_id("pi_"));
        assert!(!is_intent_id("cus_123"));
        assert!(!is_intent_id("pi_../customers/cus_1"));
        assert!(!is_intent_id("pi_1?expand[]=customer"));
        assert!(!is_intent_id("pi_1%2F..%2Fcustomers"));
    }
}
