use axum::{extract::FromRequestParts, http::request::Parts};
use crate::domain::models::idempotency::MAX_KEY_LEN;
use crate::error::AppError;

pub const IDEMPOTENCY_KEY: &str = "idempotency-key";
pub const IDEMPOTENT_REPLAYED: &str = "idempotent-replayed";

/// Optional `Idempotency-Key` request header.
pub struct IdempotencyKey(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for IdempotencyKey {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(raw) = parts.headers.get(IDEMPOTENCY_KEY) else {
            return Ok(IdempotencyKey(None));
        };

        let key = raw
            .to_str()
            .map_err(|_| AppError::Validation("Idempotency-Key must be visible ASCII".into()))?
            .trim();
        if key.is_empty() {
            return Err(AppError::Validation("Idempotency-Key must not be empty".into()));
        }
        if key.len() > MAX_KEY_LEN {
            return Err(AppError::Validation(format!(
                "Idempotency-Key must be at most {} characters",
                MAX_KEY_LEN
            )));
        }
        Ok(IdempotencyKey(Some(key.to_string())))
    }
}
