use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use tokio::time::timeout;
use crate::domain::ports::{EntityStore, TableEntity};
use crate::error::AppError;

/// Bounds every call of the wrapped store by `limit`. Expiry surfaces as
/// `AppError::StoreTimeout`. Reads are safe to retry. A timed-out write has an
/// unknown outcome: the statement may have committed before it was dropped.
pub struct TimedStore<T> {
    inner: Arc<dyn EntityStore<T>>,
    limit: Duration,
}

impl<T: TableEntity> TimedStore<T> {
    pub fn new(inner: Arc<dyn EntityStore<T>>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<R>(&self, op: &str, fut: impl Future<Output = Result<R, AppError>> + Send) -> Result<R, AppError> {
        match timeout(self.limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(AppError::StoreTimeout(format!("{} on {}", op, T::TABLE))),
        }
    }
}

#[async_trait]
impl<T: TableEntity> EntityStore<T> for TimedStore<T> {
    async fn get(&self, partition_key: &str, row_key: &str) -> Result<Option<T>, AppError> {
        self.bounded("get", self.inner.get(partition_key, row_key)).await
    }

    async fn list_all(&self) -> Result<Vec<T>, AppError> {
        self.bounded("list_all", self.inner.list_all()).await
    }

    async fn list_partition(&self, partition_key: &str) -> Result<Vec<T>, AppError> {
        self.bounded("list_partition", self.inner.list_partition(partition_key)).await
    }

    async fn list_secondary(&self, secondary_key: &str) -> Result<Vec<T>, AppError> {
        self.bounded("list_secondary", self.inner.list_secondary(secondary_key)).await
    }

    async fn create(&self, entity: &T) -> Result<T, AppError> {
        self.bounded("create", self.inner.create(entity)).await
    }

    async fn replace(&self, entity: &T, if_match: Option<&str>) -> Result<T, AppError> {
        self.bounded("replace", self.inner.replace(entity, if_match)).await
    }

    async fn delete(&self, partition_key: &str, row_key: &str) -> Result<(), AppError> {
        self.bounded("delete", self.inner.delete(partition_key, row_key)).await
    }
}
