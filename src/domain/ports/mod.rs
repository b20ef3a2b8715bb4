use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

/// An entity addressable by a (partition, row) key pair.
///
/// `etag` and `timestamp` are owned by the store: every successful write
/// stamps a fresh value, and callers pass the etag they read back to
/// [`EntityStore::replace`] when they need a conditional overwrite.
pub trait TableEntity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const TABLE: &'static str;

    fn partition_key(&self) -> String;
    fn row_key(&self) -> &str;

    /// Optional secondary index value (e.g. the provider of a booking).
    fn secondary_key(&self) -> Option<&str> {
        None
    }

    fn etag(&self) -> Option<&str>;
    fn stamp(&mut self, etag: String, timestamp: DateTime<Utc>);
}

#[async_trait]
pub trait EntityStore<T: TableEntity>: Send + Sync {
    async fn get(&self, partition_key: &str, row_key: &str) -> Result<Option<T>, AppError>;
    async fn list_all(&self) -> Result<Vec<T>, AppError>;
    async fn list_partition(&self, partition_key: &str) -> Result<Vec<T>, AppError>;
    async fn list_secondary(&self, secondary_key: &str) -> Result<Vec<T>, AppError>;
    async fn create(&self, entity: &T) -> Result<T, AppError>;
    /// Full-record overwrite. With `if_match` set, the write only succeeds
    /// when the stored etag still equals it.
    async fn replace(&self, entity: &T, if_match: Option<&str>) -> Result<T, AppError>;
    async fn delete(&self, partition_key: &str, row_key: &str) -> Result<(), AppError>;
}
