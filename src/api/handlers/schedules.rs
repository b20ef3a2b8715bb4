use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::{info, warn};
use crate::api::dtos::requests::{CreateScheduleRequest, ProviderQuery};
use crate::api::extractors::json::ApiJson;
use crate::api::handlers::{created, enc, ensure_id_matches, require};
use crate::domain::models::schedule::WeeklySchedule;
use crate::error::AppError;
use crate::state::AppState;

/// Malformed hours are kept as typed; the resolver treats them as closed.
fn warn_on_malformed(schedule: &WeeklySchedule) {
    let days = schedule.malformed_days();
    if !days.is_empty() {
        warn!(
            provider_id = %schedule.provider_id,
            days = ?days,
            "Weekly schedule has enabled days without usable hours; they will be treated as closed"
        );
    }
}

pub async fn list_schedules(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.schedule_store.list_all().await?))
}

pub async fn get_schedule_by_provider(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let schedule = state.schedule_store.list_partition(&provider_id).await?
        .into_iter()
        .next()
        .ok_or(AppError::NotFound("Schedule not found".into()))?;
    Ok(Json(schedule))
}

pub async fn create_schedule(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreateScheduleRequest>,
) -> Result<impl IntoResponse, AppError> {
    require(&payload.provider_id, "providerId")?;
    let _guard = state.catalog_locks.lock(format!("schedule:{}", payload.provider_id)).await;
    if !state.schedule_store.list_partition(&payload.provider_id).await?.is_empty() {
        return Err(AppError::Conflict("Provider already has a weekly schedule".into()));
    }

    let schedule = payload.into_schedule();
    warn_on_malformed(&schedule);

    let schedule = state.schedule_store.create(&schedule).await?;
    info!(schedule_id = %schedule.id, provider_id = %schedule.provider_id, "Weekly schedule created");
    Ok(created(format!("/api/weeklyschedules/by-provider/{}", enc(&schedule.provider_id)), schedule))
}

pub async fn update_schedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(schedule): ApiJson<WeeklySchedule>,
) -> Result<impl IntoResponse, AppError> {
    ensure_id_matches(&id, &schedule.id)?;
    warn_on_malformed(&schedule);

    let updated = state.schedule_store.replace(&schedule, schedule.etag.as_deref()).await?;
    info!(schedule_id = %updated.id, provider_id = %updated.provider_id, "Weekly schedule updated");
    Ok(Json(updated))
}

pub async fn delete_schedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ProviderQuery>,
) -> Result<impl IntoResponse, AppError> {
    state.schedule_store.delete(&query.provider_id, &id).await?;
    info!(schedule_id = %id, "Weekly schedule deleted");
    Ok(StatusCode::NO_CONTENT)
}
