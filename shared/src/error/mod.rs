//! Errors as the storefront API reports them
//!
//! Every failure carries a numeric [`ErrorCode`]. The code picks the HTTP
//! status and, by its range, an [`ErrorCategory`].
//!
//! # Code ranges
//!
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: File and model errors
//! - 7xxx: Fulfillment errors (shipping, notifications)
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! let err = AppError::with_message(ErrorCode::UnsupportedFileFormat, "Unsupported file format")
//!     .with_detail("fileId", "");
//!
//! let response = ApiResponse::<()>::from(err);
//! assert!(!response.success);
//! assert_eq!(response.status().as_u16(), 415);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
