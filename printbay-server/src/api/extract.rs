//! Request extractors that reject with the JSON error envelope

use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use shared::{AppError, ErrorCode};

/// `axum::Json` whose rejection is a 400 `{success: false, ...}` body
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::with_message(
                ErrorCode::InvalidRequest,
                rejection.body_text(),
            )),
        }
    }
}
