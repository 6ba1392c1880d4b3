//! HTTP API
//!
//! | Path | Methods |
//! |------|---------|
//! | /api/files-upload | POST |
//! | /api/models-analyze | POST |
//! | /api/pricing-calculate | GET, POST |
//! | /api/orders-create | POST |
//! | /api/orders-status[/{order_id}] | GET, PUT |
//! | /api/payments-create-intent | POST |
//! | /api/payments-process | POST |
//! | /api/shipping-rates | POST |
//! | /api/shipping-label | POST |
//! | /api/shipping-track[/{tracking_number}] | GET, POST |
//! | /api/notifications-send | POST |
//! | /api/health | GET |

use axum::Router;
use http::{HeaderName, HeaderValue, Method, header};
use shared::{AppError, ErrorCode};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::state::AppState;

pub mod analyze;
pub mod extract;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod pricing;
pub mod shipping;
pub mod upload;

pub use extract::JsonBody;

pub const CUSTOMER_ID_HEADER: &str = "x-customer-id";
const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

async fn method_not_allowed() -> AppError {
    AppError::method_not_allowed()
}

async fn not_found() -> AppError {
    AppError::with_message(ErrorCode::NotFound, "Route not found")
}

/// All routes, no middleware
pub fn build_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(upload::router(state.config.max_upload_bytes))
        .merge(analyze::router())
        .merge(pricing::router())
        .merge(orders::router())
        .merge(payments::router())
        .merge(shipping::router())
        .merge(notifications::router())
        .merge(health::router())
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
}

/// Routes plus middleware and state, ready to serve
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(CUSTOMER_ID_HEADER),
        ]);

    // Outermost first: the id must exist before tracing and propagation see it
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .layer(cors);

    build_router(&state).layer(middleware).with_state(state)
}
