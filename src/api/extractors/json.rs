use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use crate::error::AppError;

/// `axum::Json` whose rejections (malformed body, unknown enum name,
/// missing field) surface as a 400 validation error.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        Ok(ApiJson(value))
    }
}
