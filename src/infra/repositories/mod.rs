pub mod sqlite_table_store;
pub mod postgres_table_store;
pub mod timed_store;

use chrono::Utc;
use uuid::Uuid;
use crate::domain::ports::TableEntity;
use crate::error::AppError;

/// Returns a copy of `entity` carrying a fresh etag and timestamp, plus its
/// JSON body as it will be stored.
pub(crate) fn stamp_and_encode<T: TableEntity>(entity: &T) -> Result<(T, String), AppError> {
    let mut stamped = entity.clone();
    stamped.stamp(Uuid::new_v4().to_string(), Utc::now());
    let body = serde_json::to_string(&stamped)
        .map_err(|e| AppError::Store(format!("Failed to encode {} entity: {}", T::TABLE, e)))?;
    Ok((stamped, body))
}

pub(crate) fn decode<T: TableEntity>(body: &str) -> Result<T, AppError> {
    serde_json::from_str(body)
        .map_err(|e| AppError::Store(format!("Malformed {} entity in storage: {}", T::TABLE, e)))
}

pub(crate) fn map_insert_error<T: TableEntity>(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(format!("{} entity already exists", T::TABLE))
        }
        _ => AppError::Database(e),
    }
}

pub(crate) fn stale<T: TableEntity>() -> AppError {
    AppError::Conflict(format!("{} entity was modified by another request (stale etag)", T::TABLE))
}

pub(crate) fn missing<T: TableEntity>() -> AppError {
    AppError::NotFound(format!("{} entity not found", T::TABLE))
}
