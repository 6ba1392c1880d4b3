//! Shared types for The Printed Bay
//!
//! Types used by both the HTTP service and the client library: the error
//! system, the `{success, ...}` response envelope, domain models, the
//! pricing engine and the mesh analyzer.

pub mod error;
pub mod geometry;
pub mod models;
pub mod pricing;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
