use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::info;
use crate::api::dtos::requests::CreateProviderProfileRequest;
use crate::api::extractors::json::ApiJson;
use crate::api::handlers::{created, enc, ensure_id_matches, require};
use crate::domain::models::provider::{ProviderProfile, PROVIDER_PARTITION};
use crate::domain::services::locks::KeyedGuard;
use crate::error::AppError;
use crate::state::AppState;

async fn claim_slug(state: &AppState, slug: &str, except_id: Option<&str>) -> Result<KeyedGuard, AppError> {
    let guard = state.catalog_locks.lock(format!("slug:{}", slug.to_ascii_lowercase())).await;
    let taken = state
        .provider_store
        .list_partition(PROVIDER_PARTITION)
        .await?
        .iter()
        .any(|p| p.slug_matches(slug) && Some(p.id.as_str()) != except_id);
    if taken {
        return Err(AppError::Conflict(format!("Slug '{}' is already taken", slug)));
    }
    Ok(guard)
}

pub async fn list_providers(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.provider_store.list_partition(PROVIDER_PARTITION).await?))
}

pub async fn get_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let profile = state.provider_store.get(PROVIDER_PARTITION, &id).await?
        .ok_or(AppError::NotFound("Provider not found".into()))?;
    Ok(Json(profile))
}

pub async fn get_provider_by_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let profile = state.provider_store.list_partition(PROVIDER_PARTITION).await?
        .into_iter()
        .find(|p| p.slug_matches(&slug))
        .ok_or(AppError::NotFound("Provider not found".into()))?;
    Ok(Json(profile))
}

pub async fn create_provider(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreateProviderProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    require(&payload.name, "name")?;
    require(&payload.slug, "slug")?;
    let slug = payload.slug.trim().to_string();
    let _guard = claim_slug(&state, &slug, None).await?;

    let mut profile = ProviderProfile::new(payload.name, slug);
    profile.description = payload.description;
    profile.hero_image = payload.hero_image;
    profile.category = payload.category;
    profile.theme_color = payload.theme_color;
    profile.address = payload.address;
    profile.phone = payload.phone;
    profile.instagram = payload.instagram;
    profile.working_hours_json = payload.working_hours_json;

    let profile = state.provider_store.create(&profile).await?;
    info!(provider_id = %profile.id, slug = %profile.slug, "Provider profile created");
    Ok(created(format!("/api/providerprofiles/{}", enc(&profile.id)), profile))
}

pub async fn update_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(profile): ApiJson<ProviderProfile>,
) -> Result<impl IntoResponse, AppError> {
    ensure_id_matches(&id, &profile.id)?;
    require(&profile.slug, "slug")?;
    let _guard = claim_slug(&state, &profile.slug, Some(&id)).await?;

    let updated = state.provider_store.replace(&profile, profile.etag.as_deref()).await?;
    Ok(Json(updated))
}

/// Services, staff and bookings of the provider are left in place.
pub async fn delete_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.provider_store.delete(PROVIDER_PARTITION, &id).await?;
    info!(provider_id = %id, "Provider profile deleted");
    Ok(StatusCode::NO_CONTENT)
}
