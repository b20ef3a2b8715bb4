use axum::{extract::{Path, Query, State}, response::IntoResponse, Json};
use std::sync::Arc;
use crate::api::dtos::requests::{parse_date, AvailableDatesQuery, DayAvailabilityQuery};
use crate::api::dtos::responses::AvailableDatesResponse;
use crate::domain::services::availability_service::SlotQuery;
use crate::error::AppError;
use crate::state::AppState;

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn get_day_availability(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<String>,
    Query(query): Query<DayAvailabilityQuery>,
) -> Result<impl IntoResponse, AppError> {
    let date = parse_date(&query.date)?;
    let slot_query = SlotQuery {
        service_id: blank_to_none(query.service_id),
        staff_id: blank_to_none(query.staff_id),
    };
    let view = state.availability_service.day(&provider_id, date, &slot_query).await?;
    Ok(Json(view))
}

pub async fn get_available_dates(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<String>,
    Query(query): Query<AvailableDatesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let start = parse_date(&query.start)?;
    let end = parse_date(&query.end)?;
    let slot_query = SlotQuery {
        service_id: blank_to_none(query.service_id),
        staff_id: blank_to_none(query.staff_id),
    };
    let dates = state.availability_service
        .available_dates(&provider_id, start, end, &slot_query)
        .await?;
    Ok(Json(AvailableDatesResponse { provider_id, start, end, dates }))
}
