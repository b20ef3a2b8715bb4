use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use crate::api::dtos::requests::{ClientQuery, CreateBookingRequest};
use crate::api::extractors::idempotency::{IdempotencyKey, IDEMPOTENT_REPLAYED};
use crate::api::extractors::json::ApiJson;
use crate::api::handlers::{created, enc, ensure_id_matches};
use crate::domain::models::booking::Booking;
use crate::domain::services::booking_service::BookingOutcome;
use crate::error::AppError;
use crate::state::AppState;

fn location(booking: &Booking) -> String {
    format!("/api/bookings/{}?clientId={}", enc(&booking.id), enc(&booking.client_id))
}

pub async fn list_bookings(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.booking_service.list_all().await?))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ClientQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.booking_service.get(&query.client_id, &id).await?))
}

pub async fn list_bookings_by_client(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.booking_service.list_by_client(&client_id).await?))
}

pub async fn list_bookings_by_provider(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.booking_service.list_by_provider(&provider_id).await?))
}

/// 201 for a new booking; 200 with `Idempotent-Replayed: true` when the
/// idempotency key was already used for the same request.
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    IdempotencyKey(key): IdempotencyKey,
    ApiJson(payload): ApiJson<CreateBookingRequest>,
) -> Result<Response, AppError> {
    let draft = payload.into_draft()?;

    match state.booking_service.create(draft, key).await? {
        BookingOutcome::Created(booking) => Ok(created(location(&booking), booking)),
        BookingOutcome::Replayed(booking) => {
            let mut response = Json(booking).into_response();
            response.headers_mut().insert(IDEMPOTENT_REPLAYED, HeaderValue::from_static("true"));
            Ok(response)
        }
    }
}

pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(booking): ApiJson<Booking>,
) -> Result<impl IntoResponse, AppError> {
    ensure_id_matches(&id, &booking.id)?;
    Ok(Json(state.booking_service.update(booking).await?))
}

pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ClientQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.booking_service.confirm(&query.client_id, &id).await?))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ClientQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.booking_service.cancel(&query.client_id, &id).await?))
}

pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ClientQuery>,
) -> Result<impl IntoResponse, AppError> {
    state.booking_service.delete(&query.client_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
