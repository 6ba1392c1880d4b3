//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::NotFound | Self::OrderNotFound | Self::PaymentIntentNotFound => {
                StatusCode::NOT_FOUND
            }

            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::FileTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedFileFormat => StatusCode::UNSUPPORTED_MEDIA_TYPE,

            // 503 Service Unavailable
            Self::NetworkError | Self::TimeoutError => StatusCode::SERVICE_UNAVAILABLE,

            // Vendor and storage failures surface as 500
            Self::OrderCreateFailed
            | Self::OrderStatusFailed
            | Self::PricingFailed
            | Self::PaymentFailed
            | Self::PaymentIntentFailed
            | Self::FileStorageFailed
            | Self::ShippingRatesFailed
            | Self::ShippingLabelFailed
            | Self::TrackingFailed
            | Self::NotificationFailed
            | Self::InternalError
            | Self::DatabaseError
            | Self::VendorError => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request
            Self::ValidationFailed
            | Self::InvalidRequest
            | Self::InvalidFormat
            | Self::RequiredField
            | Self::InvalidOrderStatus
            | Self::NoFileProvided
            | Self::EmptyFile
            | Self::InvalidMultipart => StatusCode::BAD_REQUEST,
        }
    }
}
