use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::info;
use crate::api::dtos::requests::{CreateUserRequest, RoleQuery};
use crate::api::extractors::json::ApiJson;
use crate::api::handlers::{created, enc, ensure_id_matches, require};
use crate::domain::models::user::{User, UserRole};
use crate::domain::services::locks::KeyedGuard;
use crate::error::AppError;
use crate::state::AppState;

fn parse_role(raw: &str) -> Result<UserRole, AppError> {
    raw.parse().map_err(|_| AppError::Validation("Invalid role".into()))
}

async fn claim_email(state: &AppState, email: &str, except_id: Option<&str>) -> Result<KeyedGuard, AppError> {
    let guard = state.catalog_locks.lock(format!("email:{}", email.to_ascii_lowercase())).await;
    let taken = state
        .user_store
        .list_all()
        .await?
        .iter()
        .any(|u| u.email.eq_ignore_ascii_case(email) && Some(u.id.as_str()) != except_id);
    if taken {
        return Err(AppError::Conflict("Email already registered".into()));
    }
    Ok(guard)
}

pub async fn list_users(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.user_store.list_all().await?))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<RoleQuery>,
) -> Result<impl IntoResponse, AppError> {
    let role = parse_role(&query.role)?;
    let user = state.user_store.get(role.as_str(), &id).await?
        .ok_or(AppError::NotFound("User not found".into()))?;
    Ok(Json(user))
}

pub async fn get_user_by_email(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_store.list_all().await?
        .into_iter()
        .find(|u| u.email.eq_ignore_ascii_case(&email))
        .ok_or(AppError::NotFound("User not found".into()))?;
    Ok(Json(user))
}

pub async fn list_users_by_role(
    State(state): State<Arc<AppState>>,
    Path(role): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let role = parse_role(&role)?;
    Ok(Json(state.user_store.list_partition(role.as_str()).await?))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let role = parse_role(&payload.role)?;
    require(&payload.email, "email")?;
    require(&payload.name, "name")?;
    let email = payload.email.trim().to_string();
    let _guard = claim_email(&state, &email, None).await?;

    let mut user = User::new(email, payload.name, role);
    user.avatar = payload.avatar;

    let user = state.user_store.create(&user).await?;
    info!(user_id = %user.id, role = %user.role, "User created");
    Ok(created(format!("/api/users/{}?role={}", enc(&user.id), user.role), user))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(user): ApiJson<User>,
) -> Result<impl IntoResponse, AppError> {
    ensure_id_matches(&id, &user.id)?;
    require(&user.email, "email")?;
    let _guard = claim_email(&state, &user.email, Some(&id)).await?;

    let updated = state.user_store.replace(&user, user.etag.as_deref()).await?;
    Ok(Json(updated))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<RoleQuery>,
) -> Result<impl IntoResponse, AppError> {
    let role = parse_role(&query.role)?;
    state.user_store.delete(role.as_str(), &id).await?;
    info!(user_id = %id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}
