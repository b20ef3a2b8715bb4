use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use crate::api::dtos::requests::{CreateServiceRequest, ProviderQuery};
use crate::api::extractors::json::ApiJson;
use crate::api::handlers::{created, enc, ensure_id_matches, require};
use crate::domain::models::provider::PROVIDER_PARTITION;
use crate::domain::models::service::{Service, ServiceType};
use crate::error::AppError;
use crate::state::AppState;

/// Field rules plus referential checks: the provider exists and every
/// assigned staff id belongs to it.
async fn validate_service(state: &AppState, service: &Service) -> Result<(), AppError> {
    service.validate().map_err(AppError::Validation)?;

    state.provider_store.get(PROVIDER_PARTITION, &service.provider_id).await?
        .ok_or(AppError::Validation("Unknown provider".into()))?;

    if !service.assigned_staff_ids.is_empty() {
        let roster: HashSet<String> = state.staff_store.list_partition(&service.provider_id).await?
            .into_iter()
            .map(|s| s.id)
            .collect();
        if let Some(unknown) = service.assigned_staff_ids.iter().find(|id| !roster.contains(*id)) {
            return Err(AppError::Validation(format!("Unknown staff member '{}' for this provider", unknown)));
        }
    }

    if service.requires_staff_selection && service.assigned_staff_ids.is_empty() {
        warn!(service_id = %service.id, "Service requires staff selection but has no assigned staff; it cannot be booked");
    }
    Ok(())
}

pub async fn list_services(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.service_store.list_all().await?))
}

pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ProviderQuery>,
) -> Result<impl IntoResponse, AppError> {
    let service = state.service_store.get(&query.provider_id, &id).await?
        .ok_or(AppError::NotFound("Service not found".into()))?;
    Ok(Json(service))
}

pub async fn list_services_by_provider(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.service_store.list_partition(&provider_id).await?))
}

pub async fn create_service(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreateServiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let service_type: ServiceType = payload.service_type.parse()
        .map_err(|_| AppError::Validation("Invalid service type".into()))?;
    require(&payload.provider_id, "providerId")?;

    let mut service = Service::new(payload.provider_id, payload.name, payload.price, payload.duration_minutes, service_type);
    service.description = payload.description;
    service.category = payload.category;
    service.image = payload.image;
    service.requires_staff_selection = payload.requires_staff_selection;
    service.max_capacity = payload.max_capacity;
    service.assigned_staff_ids = payload.assigned_staff_ids.unwrap_or_default().into_iter().collect();

    validate_service(&state, &service).await?;

    let service = state.service_store.create(&service).await?;
    info!(service_id = %service.id, provider_id = %service.provider_id, "Service created");
    Ok(created(format!("/api/services/{}?providerId={}", enc(&service.id), enc(&service.provider_id)), service))
}

pub async fn update_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(service): ApiJson<Service>,
) -> Result<impl IntoResponse, AppError> {
    ensure_id_matches(&id, &service.id)?;
    validate_service(&state, &service).await?;

    let updated = state.service_store.replace(&service, service.etag.as_deref()).await?;
    Ok(Json(updated))
}

pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ProviderQuery>,
) -> Result<impl IntoResponse, AppError> {
    state.service_store.delete(&query.provider_id, &id).await?;
    info!(service_id = %id, "Service deleted");
    Ok(StatusCode::NO_CONTENT)
}
