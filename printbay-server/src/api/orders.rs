//! Order creation and status

use axum::extract::{Path, Query, State};
use axum::{Router, routing::{get, post}};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::models::{
    CreateOrderRequest, Order, OrderStatus, OrderTracking, ShippingLabel,
};
use shared::{ApiResponse, AppError, AppResult, ErrorCode};

use crate::api::JsonBody;
use crate::error::IntegrationResultExt;
use crate::state::AppState;

/// Fallback total when the request carries none
const DEFAULT_ORDER_TOTAL: f64 = 24.25;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders-create", post(create_order))
        .route("/api/orders-status", get(get_status_query).put(update_status_query))
        .route(
            "/api/orders-status/{order_id}",
            get(get_status).put(update_status),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderIdQuery {
    pub order_id: Option<String>,
}

impl OrderIdQuery {
    fn require(self) -> AppResult<String> {
        self.order_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::with_message(ErrorCode::RequiredField, "orderId is required"))
    }
}

/// Status update body, kept as text so unknown values map to 4008
#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

impl StatusBody {
    fn parse(self) -> AppResult<OrderStatus> {
        self.status.parse().map_err(|_| {
            AppError::new(ErrorCode::InvalidOrderStatus).with_detail("status", self.status)
        })
    }
}

/// Tracking view, plus the label once the order has shipped
#[derive(Debug, Serialize)]
pub struct OrderStatusResponse {
    #[serde(flatten)]
    pub tracking: OrderTracking,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping: Option<ShippingLabel>,
}

/// POST /api/orders-create
pub async fn create_order(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateOrderRequest>,
) -> AppResult<ApiResponse<Order>> {
    let now = Utc::now();
    let millis = now.timestamp_millis();
    let order = Order {
        order_id: format!("TPB-{millis}"),
        order_number: shared::util::order_number(millis),
        customer: req.resolved_customer(),
        status: OrderStatus::PendingPayment,
        total: req.total.filter(|t| *t > 0.0).unwrap_or(DEFAULT_ORDER_TOTAL),
        currency: req.currency,
        file_url: req.file_url,
        file_name: req.file_name,
        created: now,
        updated: None,
    };

    let order = state
        .database
        .create_order(&order)
        .await
        .or_app(ErrorCode::OrderCreateFailed)?;

    tracing::info!(
        order_id = %order.order_id,
        customer = %order.customer.email,
        total = order.total,
        "Order created"
    );
    Ok(ApiResponse::success(order))
}

async fn load_status(state: &AppState, order_id: &str) -> AppResult<OrderStatusResponse> {
    let order = state
        .database
        .get_order(order_id)
        .await
        .or_app(ErrorCode::OrderStatusFailed)?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    let shipping = if order.status.step() >= OrderStatus::Shipped.step() {
        state
            .database
            .get_shipping_info(order_id)
            .await
            .or_app(ErrorCode::OrderStatusFailed)?
    } else {
        None
    };

    Ok(OrderStatusResponse {
        tracking: OrderTracking::from_order(order, Utc::now()),
        shipping,
    })
}

async fn store_status(state: &AppState, order_id: &str, status: OrderStatus) -> AppResult<Order> {
    let order = state
        .database
        .update_order_status(order_id, status)
        .await
        .or_app(ErrorCode::OrderStatusFailed)?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    tracing::info!(order_id = %order_id, status = %status, "Order status updated");
    Ok(order)
}

/// GET /api/orders-status/{order_id}
pub async fn get_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> AppResult<ApiResponse<OrderStatusResponse>> {
    load_status(&state, &order_id).await.map(ApiResponse::success)
}

/// GET /api/orders-status?orderId=
pub async fn get_status_query(
    State(state): State<AppState>,
    Query(query): Query<OrderIdQuery>,
) -> AppResult<ApiResponse<OrderStatusResponse>> {
    let order_id = query.require()?;
    load_status(&state, &order_id).await.map(ApiResponse::success)
}

/// PUT /api/orders-status/{order_id}
pub async fn update_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    JsonBody(req): JsonBody<StatusBody>,
) -> AppResult<ApiResponse<Order>> {
    let status = req.parse()?;
    store_status(&state, &order_id, status)
        .await
        .map(ApiResponse::success)
}

/// PUT /api/orders-status?orderId=
pub async fn update_status_query(
    State(state): State<AppState>,
    Query(query): Query<OrderIdQuery>,
    JsonBody(req): JsonBody<StatusBody>,
) -> AppResult<ApiResponse<Order>> {
    let order_id = query.require()?;
    let status = req.parse()?;
    store_status(&state, &order_id, status)
        .await
        .map(ApiResponse::success)
}
