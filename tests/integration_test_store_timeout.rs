mod common;

use async_trait::async_trait;
use axum::http::{header, StatusCode};
use common::TestApp;
use reservaya_backend::{
    domain::{
        models::{booking::Booking, provider::ProviderProfile},
        ports::EntityStore,
    },
    error::AppError,
    infra::repositories::timed_store::TimedStore,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Never answers within any reasonable deadline.
struct StalledStore;

impl StalledStore {
    async fn stall<R>() -> Result<R, AppError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(AppError::Internal)
    }
}

#[async_trait]
impl EntityStore<ProviderProfile> for StalledStore {
    async fn get(&self, _pk: &str, _rk: &str) -> Result<Option<ProviderProfile>, AppError> {
        Self::stall().await
    }
    async fn list_all(&self) -> Result<Vec<ProviderProfile>, AppError> {
        Self::stall().await
    }
    async fn list_partition(&self, _pk: &str) -> Result<Vec<ProviderProfile>, AppError> {
        Self::stall().await
    }
    async fn list_secondary(&self, _key: &str) -> Result<Vec<ProviderProfile>, AppError> {
        Self::stall().await
    }
    async fn create(&self, _entity: &ProviderProfile) -> Result<ProviderProfile, AppError> {
        Self::stall().await
    }
    async fn replace(&self, _entity: &ProviderProfile, _if_match: Option<&str>) -> Result<ProviderProfile, AppError> {
        Self::stall().await
    }
    async fn delete(&self, _pk: &str, _rk: &str) -> Result<(), AppError> {
        Self::stall().await
    }
}

async fn app_with_stalled_providers() -> TestApp {
    TestApp::with_stores(|mut stores| {
        stores.providers = Arc::new(TimedStore::new(Arc::new(StalledStore), Duration::from_millis(50)));
        stores
    })
    .await
}

#[tokio::test]
async fn test_store_timeout_is_retryable_503() {
    let app = app_with_stalled_providers().await;

    let res = app.get("/api/providerprofiles").await;
    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.headers.get(header::RETRY_AFTER).unwrap(), "1");
    assert_eq!(res.body["retryable"], true);
    assert_eq!(res.body["error"], "Storage temporarily unavailable");
}

#[tokio::test]
async fn test_booking_create_times_out_without_partial_write() {
    let app = app_with_stalled_providers().await;

    let res = app.book(json!({
        "serviceId": "s1",
        "clientId": "client-a",
        "providerId": "p1",
        "date": "2025-01-06",
        "time": "09:00"
    })).await;
    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);

    let bookings = app.get("/api/bookings").await;
    assert_eq!(bookings.status, StatusCode::OK);
    assert!(bookings.body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_other_stores_keep_working() {
    let app = app_with_stalled_providers().await;

    let res = app.post("/api/staff", json!({
        "providerId": "p1",
        "name": "Ana"
    })).await;
    assert_eq!(res.status, StatusCode::CREATED);
}

/// Writes through to the real store, then hangs before acknowledging.
struct SlowAckBookings {
    inner: Arc<dyn EntityStore<Booking>>,
}

#[async_trait]
impl EntityStore<Booking> for SlowAckBookings {
    async fn get(&self, pk: &str, rk: &str) -> Result<Option<Booking>, AppError> {
        self.inner.get(pk, rk).await
    }
    async fn list_all(&self) -> Result<Vec<Booking>, AppError> {
        self.inner.list_all().await
    }
    async fn list_partition(&self, pk: &str) -> Result<Vec<Booking>, AppError> {
        self.inner.list_partition(pk).await
    }
    async fn list_secondary(&self, key: &str) -> Result<Vec<Booking>, AppError> {
        self.inner.list_secondary(key).await
    }
    async fn create(&self, entity: &Booking) -> Result<Booking, AppError> {
        let created = self.inner.create(entity).await?;
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(created)
    }
    async fn replace(&self, entity: &Booking, if_match: Option<&str>) -> Result<Booking, AppError> {
        self.inner.replace(entity, if_match).await
    }
    async fn delete(&self, pk: &str, rk: &str) -> Result<(), AppError> {
        self.inner.delete(pk, rk).await
    }
}

#[tokio::test]
async fn test_committed_booking_is_reported_after_create_timeout() {
    let app = TestApp::with_stores(|mut stores| {
        let slow = Arc::new(SlowAckBookings { inner: stores.bookings });
        stores.bookings = Arc::new(TimedStore::new(slow, Duration::from_millis(200)));
        stores
    })
    .await;
    let provider_id = app.create_provider("slow-ack").await;
    app.create_morning_schedule(&provider_id).await;
    let service = app.create_service(&provider_id, json!({})).await;

    let res = app.book(json!({
        "serviceId": service["id"],
        "clientId": "client-a",
        "providerId": provider_id,
        "date": "2025-01-06",
        "time": "09:00"
    })).await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["clientId"], "client-a");

    let bookings = app.get("/api/bookings").await;
    let listed = bookings.body.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], res.body["id"]);
}
