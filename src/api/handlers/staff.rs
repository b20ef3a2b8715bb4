use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::info;
use crate::api::dtos::requests::{CreateStaffRequest, ProviderQuery};
use crate::api::extractors::json::ApiJson;
use crate::api::handlers::{created, enc, ensure_id_matches, require};
use crate::domain::models::staff::Staff;
use crate::error::AppError;
use crate::state::AppState;

pub async fn list_staff(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.staff_store.list_all().await?))
}

pub async fn get_staff(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ProviderQuery>,
) -> Result<impl IntoResponse, AppError> {
    let member = state.staff_store.get(&query.provider_id, &id).await?
        .ok_or(AppError::NotFound("Staff not found".into()))?;
    Ok(Json(member))
}

pub async fn list_staff_by_provider(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.staff_store.list_partition(&provider_id).await?))
}

pub async fn create_staff(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreateStaffRequest>,
) -> Result<impl IntoResponse, AppError> {
    require(&payload.provider_id, "providerId")?;
    require(&payload.name, "name")?;

    let member = Staff::new(payload.provider_id, payload.name, payload.role, payload.avatar);
    let member = state.staff_store.create(&member).await?;
    info!(staff_id = %member.id, provider_id = %member.provider_id, "Staff member created");
    Ok(created(format!("/api/staff/{}?providerId={}", enc(&member.id), enc(&member.provider_id)), member))
}

pub async fn update_staff(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(member): ApiJson<Staff>,
) -> Result<impl IntoResponse, AppError> {
    ensure_id_matches(&id, &member.id)?;
    require(&member.name, "name")?;
    let updated = state.staff_store.replace(&member, member.etag.as_deref()).await?;
    Ok(Json(updated))
}

pub async fn delete_staff(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ProviderQuery>,
) -> Result<impl IntoResponse, AppError> {
    state.staff_store.delete(&query.provider_id, &id).await?;
    info!(staff_id = %id, "Staff member deleted");
    Ok(StatusCode::NO_CONTENT)
}
