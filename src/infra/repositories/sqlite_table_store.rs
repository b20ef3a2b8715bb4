use std::marker::PhantomData;
use async_trait::async_trait;
use sqlx::SqlitePool;
use crate::domain::ports::{EntityStore, TableEntity};
use crate::error::AppError;
use super::{decode, map_insert_error, missing, stale, stamp_and_encode};

pub struct SqliteTableStore<T> {
    pool: SqlitePool,
    _entity: PhantomData<fn() -> T>,
}

impl<T> SqliteTableStore<T> {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool, _entity: PhantomData }
    }
}

fn decode_all<T: TableEntity>(bodies: Vec<String>) -> Result<Vec<T>, AppError> {
    bodies.iter().map(|b| decode(b)).collect()
}

#[async_trait]
impl<T: TableEntity> EntityStore<T> for SqliteTableStore<T> {
    async fn get(&self, partition_key: &str, row_key: &str) -> Result<Option<T>, AppError> {
        let body: Option<String> = sqlx::query_scalar(
            "SELECT body FROM entities WHERE table_name = ? AND partition_key = ? AND row_key = ?"
        )
            .bind(T::TABLE).bind(partition_key).bind(row_key)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?;
        body.as_deref().map(decode).transpose()
    }

    async fn list_all(&self) -> Result<Vec<T>, AppError> {
        let bodies: Vec<String> = sqlx::query_scalar(
            "SELECT body FROM entities WHERE table_name = ? ORDER BY partition_key, row_key"
        )
            .bind(T::TABLE)
            .fetch_all(&self.pool).await.map_err(AppError::Database)?;
        decode_all(bodies)
    }

    async fn list_partition(&self, partition_key: &str) -> Result<Vec<T>, AppError> {
        let bodies: Vec<String> = sqlx::query_scalar(
            "SELECT body FROM entities WHERE table_name = ? AND partition_key = ? ORDER BY row_key"
        )
            .bind(T::TABLE).bind(partition_key)
            .fetch_all(&self.pool).await.map_err(AppError::Database)?;
        decode_all(bodies)
    }

    async fn list_secondary(&self, secondary_key: &str) -> Result<Vec<T>, AppError> {
        let bodies: Vec<String> = sqlx::query_scalar(
            "SELECT body FROM entities WHERE table_name = ? AND secondary_key = ? ORDER BY partition_key, row_key"
        )
            .bind(T::TABLE).bind(secondary_key)
            .fetch_all(&self.pool).await.map_err(AppError::Database)?;
        decode_all(bodies)
    }

    async fn create(&self, entity: &T) -> Result<T, AppError> {
        let (stamped, body) = stamp_and_encode(entity)?;
        sqlx::query(
            "INSERT INTO entities (table_name, partition_key, row_key, secondary_key, etag, body, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)"
        )
            .bind(T::TABLE).bind(stamped.partition_key()).bind(stamped.row_key())
            .bind(stamped.secondary_key()).bind(stamped.etag()).bind(&body).bind(chrono::Utc::now())
            .execute(&self.pool).await.map_err(map_insert_error::<T>)?;
        Ok(stamped)
    }

    async fn replace(&self, entity: &T, if_match: Option<&str>) -> Result<T, AppError> {
        let (stamped, body) = stamp_and_encode(entity)?;
        let result = sqlx::query(
            "UPDATE entities SET secondary_key = ?, etag = ?, body = ?, updated_at = ?
             WHERE table_name = ? AND partition_key = ? AND row_key = ? AND (? IS NULL OR etag = ?)"
        )
            .bind(stamped.secondary_key()).bind(stamped.etag()).bind(&body).bind(chrono::Utc::now())
            .bind(T::TABLE).bind(stamped.partition_key()).bind(stamped.row_key())
            .bind(if_match).bind(if_match)
            .execute(&self.pool).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            let exists = self.get(&stamped.partition_key(), stamped.row_key()).await?.is_some();
            return Err(if exists && if_match.is_some() { stale::<T>() } else { missing::<T>() });
        }
        Ok(stamped)
    }

    async fn delete(&self, partition_key: &str, row_key: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            "DELETE FROM entities WHERE table_name = ? AND partition_key = ? AND row_key = ?"
        )
            .bind(T::TABLE).bind(partition_key).bind(row_key)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(missing::<T>());
        }
        Ok(())
    }
}
