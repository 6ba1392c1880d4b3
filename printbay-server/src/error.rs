//! Integration errors
//!
//! Vendor adapters return [`IntegrationError`]. Handlers turn it into the
//! public envelope with [`IntegrationResultExt::or_app`], which logs the
//! cause and keeps vendor detail out of the response body.

use shared::{AppError, AppResult, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("{service} error: {message}")]
    Vendor {
        service: &'static str,
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IntegrationError {
    pub fn vendor(service: &'static str, message: impl Into<String>) -> Self {
        Self::Vendor {
            service,
            message: message.into(),
        }
    }

    /// Code used when no handler-specific code applies
    pub fn fallback_code(&self) -> ErrorCode {
        match self {
            Self::Http(e) if e.is_timeout() => ErrorCode::TimeoutError,
            Self::Http(e) if e.is_connect() => ErrorCode::NetworkError,
            Self::Http(_) | Self::Vendor { .. } => ErrorCode::VendorError,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::Storage(_) => ErrorCode::FileStorageFailed,
            Self::Serialization(_) => ErrorCode::InternalError,
        }
    }
}

impl From<IntegrationError> for AppError {
    fn from(err: IntegrationError) -> Self {
        let code = err.fallback_code();
        tracing::error!(error = %err, code = %code, "Integration call failed");
        AppError::new(code)
    }
}

/// Map integration failures to a handler's public error code
pub trait IntegrationResultExt<T> {
    fn or_app(self, code: ErrorCode) -> AppResult<T>;
}

impl<T> IntegrationResultExt<T> for Result<T, IntegrationError> {
    fn or_app(self, code: ErrorCode) -> AppResult<T> {
        self.map_err(|err| {
            tracing::error!(error = %err, code = %code, "Integration call failed");
            AppError::new(code)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_message_stays_private() {
        let result: Result<(), _> = Err(IntegrationError::vendor("stripe", "card_declined: sk_live"));
        let err = result.or_app(ErrorCode::PaymentIntentFailed).unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentIntentFailed);
        assert!(!err.message.contains("sk_live"));
        assert_eq!(err.http_status(), http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_fallback_codes() {
        assert_eq!(
            AppError::from(IntegrationError::Storage("denied".into())).code,
            ErrorCode::FileStorageFailed
        );
        assert_eq!(
            AppError::from(IntegrationError::vendor("shippo", "bad rate")).code,
            ErrorCode::VendorError
        );
    }
}
