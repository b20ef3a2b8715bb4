pub mod availability;
pub mod blocked_dates;
pub mod bookings;
pub mod health;
pub mod providers;
pub mod schedules;
pub mod services;
pub mod staff;
pub mod users;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::borrow::Cow;
use tracing::warn;
use crate::error::AppError;

/// Percent-encodes an id for use as a path segment or query value.
pub(crate) fn enc(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// 201 with a `Location` pointing at the get-by-id route. The row is already
/// written, so a header that cannot be represented is dropped, not turned
/// into an error.
pub(crate) fn created<T: Serialize>(location: String, body: T) -> Response {
    let mut response = (StatusCode::CREATED, Json(body)).into_response();
    match HeaderValue::try_from(location) {
        Ok(value) => {
            response.headers_mut().insert(header::LOCATION, value);
        }
        Err(e) => warn!("Omitting Location header: {}", e),
    }
    response
}

pub(crate) fn ensure_id_matches(path_id: &str, body_id: &str) -> Result<(), AppError> {
    if path_id != body_id {
        return Err(AppError::Validation("ID mismatch".into()));
    }
    Ok(())
}

pub(crate) fn require(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}
