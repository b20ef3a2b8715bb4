use std::marker::PhantomData;
use async_trait::async_trait;
use sqlx::PgPool;
use crate::domain::ports::{EntityStore, TableEntity};
use crate::error::AppError;
use super::{decode, map_insert_error, missing, stale, stamp_and_encode};

pub struct PostgresTableStore<T> {
    pool: PgPool,
    _entity: PhantomData<fn() -> T>,
}

impl<T> PostgresTableStore<T> {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, _entity: PhantomData }
    }
}

#[async_trait]
impl<T: TableEntity> EntityStore<T> for PostgresTableStore<T> {
    async fn get(&self, partition_key: &str, row_key: &str) -> Result<Option<T>, AppError> {
        let body: Option<String> = sqlx::query_scalar(
            "SELECT body FROM entities WHERE table_name = $1 AND partition_key = $2 AND row_key = $3"
        )
            .bind(T::TABLE).bind(partition_key).bind(row_key)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?;
        body.as_deref().map(decode).transpose()
    }

    async fn list_all(&self) -> Result<Vec<T>, AppError> {
        let bodies: Vec<String> = sqlx::query_scalar(
            "SELECT body FROM entities WHERE table_name = $1 ORDER BY partition_key, row_key"
        )
            .bind(T::TABLE)
            .fetch_all(&self.pool).await.map_err(AppError::Database)?;
        bodies.iter().map(|b| decode(b)).collect()
    }

    async fn list_partition(&self, partition_key: &str) -> Result<Vec<T>, AppError> {
        let bodies: Vec<String> = sqlx::query_scalar(
            "SELECT body FROM entities WHERE table_name = $1 AND partition_key = $2 ORDER BY row_key"
        )
            .bind(T::TABLE).bind(partition_key)
            .fetch_all(&self.pool).await.map_err(AppError::Database)?;
        bodies.iter().map(|b| decode(b)).collect()
    }

    async fn list_secondary(&self, secondary_key: &str) -> Result<Vec<T>, AppError> {
        let bodies: Vec<String> = sqlx::query_scalar(
            "SELECT body FROM entities WHERE table_name = $1 AND secondary_key = $2 ORDER BY partition_key, row_key"
        )
            .bind(T::TABLE).bind(secondary_key)
            .fetch_all(&self.pool).await.map_err(AppError::Database)?;
        bodies.iter().map(|b| decode(b)).collect()
    }

    async fn create(&self, entity: &T) -> Result<T, AppError> {
        let (stamped, body) = stamp_and_encode(entity)?;
        sqlx::query(
            "INSERT INTO entities (table_name, partition_key, row_key, secondary_key, etag, body, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, NOW())"
        )
            .bind(T::TABLE).bind(stamped.partition_key()).bind(stamped.row_key())
            .bind(stamped.secondary_key()).bind(stamped.etag()).bind(&body)
            .execute(&self.pool).await.map_err(map_insert_error::<T>)?;
        Ok(stamped)
    }

    async fn replace(&self, entity: &T, if_match: Option<&str>) -> Result<T, AppError> {
        let (stamped, body) = stamp_and_encode(entity)?;
        let result = sqlx::query(
            "UPDATE entities SET secondary_key = $1, etag = $2, body = $3, updated_at = NOW()
             WHERE table_name = $4 AND partition_key = $5 AND row_key = $6
               AND ($7::TEXT IS NULL OR etag = $7)"
        )
            .bind(stamped.secondary_key()).bind(stamped.etag()).bind(&body)
            .bind(T::TABLE).bind(stamped.partition_key()).bind(stamped.row_key())
            .bind(if_match)
            .execute(&self.pool).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            let exists = self.get(&stamped.partition_key(), stamped.row_key()).await?.is_some();
            return Err(if exists && if_match.is_some() { stale::<T>() } else { missing::<T>() });
        }
        Ok(stamped)
    }

    async fn delete(&self, partition_key: &str, row_key: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            "DELETE FROM entities WHERE table_name = $1 AND partition_key = $2 AND row_key = $3"
        )
            .bind(T::TABLE).bind(partition_key).bind(row_key)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(missing::<T>());
        }
        Ok(())
    }
}
