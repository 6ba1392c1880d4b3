//! Error codes for The Printed Bay
//!
//! Codes serialize as plain numbers in the `code` field of the error envelope.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// HTTP method not supported by the route
    MethodNotAllowed = 9,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order creation failed
    OrderCreateFailed = 4002,
    /// Order status lookup or update failed
    OrderStatusFailed = 4003,
    /// Unknown order status value
    InvalidOrderStatus = 4008,
    /// Quote could not be computed or saved
    PricingFailed = 4010,

    // ==================== 5xxx: Payment ====================
    /// Payment failed
    PaymentFailed = 5001,
    /// Payment intent could not be created
    PaymentIntentFailed = 5002,
    /// Payment intent not found
    PaymentIntentNotFound = 5006,

    // ==================== 6xxx: File ====================
    /// Upload exceeds the size limit
    FileTooLarge = 6501,
    /// File extension is not an accepted model format
    UnsupportedFileFormat = 6502,
    /// Multipart form had no `file` part
    NoFileProvided = 6504,
    /// Uploaded file is empty
    EmptyFile = 6505,
    /// Blob storage write failed
    FileStorageFailed = 6509,
    /// Multipart body could not be parsed
    InvalidMultipart = 6510,

    // ==================== 7xxx: Fulfillment ====================
    /// Shipping rate lookup failed
    ShippingRatesFailed = 7001,
    /// Shipping label purchase failed
    ShippingLabelFailed = 7002,
    /// Shipment tracking failed
    TrackingFailed = 7003,
    /// Notification delivery failed
    NotificationFailed = 7101,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Timeout error
    TimeoutError = 9004,
    /// Third-party service error
    VendorError = 9006,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the default English message
    pub fn message(&self) -> &'static str {
        match self {
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::InvalidRequest => "Invalid request",
            Self::InvalidFormat => "Invalid format",
            Self::RequiredField => "Required field is missing",
            Self::MethodNotAllowed => "Method not allowed",

            Self::OrderNotFound => "Order not found",
            Self::OrderCreateFailed => "Failed to create order",
            Self::OrderStatusFailed => "Failed to process order status request",
            Self::InvalidOrderStatus => "Invalid order status",
            Self::PricingFailed => "Failed to calculate pricing",

            Self::PaymentFailed => "Failed to process payment",
            Self::PaymentIntentFailed => "Failed to create payment intent",
            Self::PaymentIntentNotFound => "Payment intent not found",

            Self::FileTooLarge => "File too large",
            Self::UnsupportedFileFormat => "Unsupported file format",
            Self::NoFileProvided => "No file provided",
            Self::EmptyFile => "File is empty",
            Self::FileStorageFailed => "Failed to store file",
            Self::InvalidMultipart => "Invalid multipart request",

            Self::ShippingRatesFailed => "Failed to get shipping rates",
            Self::ShippingLabelFailed => "Failed to create shipping label",
            Self::TrackingFailed => "Failed to get tracking info",
            Self::NotificationFailed => "Failed to send email notification",

            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
            Self::NetworkError => "Network error",
            Self::TimeoutError => "Operation timed out",
            Self::VendorError => "External service error",
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

/// Error returned when converting an unknown numeric code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            2 => Self::ValidationFailed,
            3 => Self::NotFound,
            5 => Self::InvalidRequest,
            6 => Self::InvalidFormat,
            7 => Self::RequiredField,
            9 => Self::MethodNotAllowed,

            4001 => Self::OrderNotFound,
            4002 => Self::OrderCreateFailed,
            4003 => Self::OrderStatusFailed,
            4008 => Self::InvalidOrderStatus,
            4010 => Self::PricingFailed,

            5001 => Self::PaymentFailed,
            5002 => Self::PaymentIntentFailed,
            5006 => Self::PaymentIntentNotFound,

            6501 => Self::FileTooLarge,
            6502 => Self::UnsupportedFileFormat,
            6504 => Self::NoFileProvided,
            6505 => Self::EmptyFile,
            6509 => Self::FileStorageFailed,
            6510 => Self::InvalidMultipart,

            7001 => Self::ShippingRatesFailed,
            7002 => Self::ShippingLabelFailed,
            7003 => Self::TrackingFailed,
            7101 => Self::NotificationFailed,

            9001 => Self::InternalError,
            9002 => Self::DatabaseError,
            9003 => Self::NetworkError,
            9004 => Self::TimeoutError,
            9006 => Self::VendorError,

            _ => return Err(InvalidErrorCode(value)),
        };
        Ok(code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}
