use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;
use crate::api::dtos::requests::{parse_date, CreateBlockedDateRequest, ProviderQuery};
use crate::api::extractors::json::ApiJson;
use crate::api::handlers::{created, enc, ensure_id_matches, require};
use crate::domain::models::blocked_date::BlockedDate;
use crate::domain::services::locks::KeyedGuard;
use crate::error::AppError;
use crate::state::AppState;

/// Holds the (provider, date) lock and checks nobody else blocked that date.
/// Keep the guard until the write is done.
async fn claim_date(state: &AppState, provider_id: &str, date: NaiveDate, except_id: Option<&str>) -> Result<KeyedGuard, AppError> {
    let guard = state.catalog_locks.lock(format!("blocked:{}:{}", provider_id, date)).await;
    let taken = state.blocked_date_store.list_partition(provider_id).await?
        .iter()
        .any(|b| b.date == date && Some(b.id.as_str()) != except_id);
    if taken {
        return Err(AppError::Conflict(format!("{} is already blocked", date)));
    }
    Ok(guard)
}

pub async fn list_blocked_dates(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.blocked_date_store.list_all().await?))
}

pub async fn get_blocked_date(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ProviderQuery>,
) -> Result<impl IntoResponse, AppError> {
    let blocked = state.blocked_date_store.get(&query.provider_id, &id).await?
        .ok_or(AppError::NotFound("Blocked date not found".into()))?;
    Ok(Json(blocked))
}

pub async fn list_blocked_dates_by_provider(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut blocked = state.blocked_date_store.list_partition(&provider_id).await?;
    blocked.sort_by_key(|b| b.date);
    Ok(Json(blocked))
}

pub async fn create_blocked_date(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreateBlockedDateRequest>,
) -> Result<impl IntoResponse, AppError> {
    require(&payload.provider_id, "providerId")?;
    let date = parse_date(&payload.date)?;
    let _guard = claim_date(&state, &payload.provider_id, date, None).await?;

    let blocked = BlockedDate::new(payload.provider_id, date, payload.reason);
    let blocked = state.blocked_date_store.create(&blocked).await?;
    info!(provider_id = %blocked.provider_id, date = %blocked.date, "Date blocked");
    Ok(created(format!("/api/blockeddates/{}?providerId={}", enc(&blocked.id), enc(&blocked.provider_id)), blocked))
}

pub async fn update_blocked_date(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(blocked): ApiJson<BlockedDate>,
) -> Result<impl IntoResponse, AppError> {
    ensure_id_matches(&id, &blocked.id)?;
    let _guard = claim_date(&state, &blocked.provider_id, blocked.date, Some(&id)).await?;

    let updated = state.blocked_date_store.replace(&blocked, blocked.etag.as_deref()).await?;
    Ok(Json(updated))
}

pub async fn delete_blocked_date(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ProviderQuery>,
) -> Result<impl IntoResponse, AppError> {
    state.blocked_date_store.delete(&query.provider_id, &id).await?;
    info!(blocked_date_id = %id, "Blocked date removed");
    Ok(StatusCode::NO_CONTENT)
}
