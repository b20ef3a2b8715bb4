use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use reservaya_backend::{
    api::router::create_router,
    config::Config,
    infra::factory::{connect_sqlite, run_sqlite_migrations, sqlite_stores},
    state::{AppState, Stores},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub db_filename: String,
    pub state: Arc<AppState>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        Self::with_stores(|stores| stores).await
    }

    /// Builds the app over a fresh SQLite file, letting the caller swap
    /// individual stores before the state is assembled.
    pub async fn with_stores(customize: impl FnOnce(Stores) -> Stores) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let pool = connect_sqlite(&db_url).await.expect("Failed to connect to test db");
        run_sqlite_migrations(&pool).await.expect("Failed to migrate test db");

        let config = Config {
            database_url: db_url,
            port: 0,
            ..Config::default()
        };
        let stores = customize(sqlite_stores(&pool, config.store_timeout));
        let state = Arc::new(AppState::new(config, stores));
        let router = create_router(state.clone());

        Self { router, db_filename, state }
    }

    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>, headers: &[(&str, &str)]) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        TestResponse { status, headers, body }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send("GET", uri, None, &[]).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.send("POST", uri, Some(body), &[]).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> TestResponse {
        self.send("PUT", uri, Some(body), &[]).await
    }

    pub async fn patch(&self, uri: &str) -> TestResponse {
        self.send("PATCH", uri, None, &[]).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.send("DELETE", uri, None, &[]).await
    }

    pub async fn create_provider(&self, slug: &str) -> String {
        let res = self.post("/api/providerprofiles", json!({
            "name": format!("Provider {}", slug),
            "slug": slug,
            "category": "Beauty"
        })).await;
        assert_eq!(res.status, StatusCode::CREATED, "provider setup failed: {}", res.body);
        res.body["id"].as_str().unwrap().to_string()
    }

    /// Creates a schedule from `overrides` merged over the provider id.
    pub async fn create_schedule(&self, provider_id: &str, overrides: Value) -> Value {
        let mut body = json!({ "providerId": provider_id });
        if let (Some(target), Some(extra)) = (body.as_object_mut(), overrides.as_object()) {
            for (k, v) in extra {
                target.insert(k.clone(), v.clone());
            }
        }
        let res = self.post("/api/weeklyschedules", body).await;
        assert_eq!(res.status, StatusCode::CREATED, "schedule setup failed: {}", res.body);
        res.body
    }

    /// Monday-only schedule, open 09:00-12:00.
    pub async fn create_morning_schedule(&self, provider_id: &str) -> Value {
        self.create_schedule(provider_id, json!({
            "mondayEnabled": true,
            "mondayHours": "09:00-12:00",
            "tuesdayEnabled": false,
            "wednesdayEnabled": false,
            "thursdayEnabled": false,
            "fridayEnabled": false
        })).await
    }

    pub async fn create_service(&self, provider_id: &str, overrides: Value) -> Value {
        let mut body = json!({
            "providerId": provider_id,
            "name": "Haircut",
            "price": 25.0,
            "durationMinutes": 60,
            "type": "APPOINTMENT"
        });
        if let (Some(target), Some(extra)) = (body.as_object_mut(), overrides.as_object()) {
            for (k, v) in extra {
                target.insert(k.clone(), v.clone());
            }
        }
        let res = self.post("/api/services", body).await;
        assert_eq!(res.status, StatusCode::CREATED, "service setup failed: {}", res.body);
        res.body
    }

    pub async fn create_staff(&self, provider_id: &str, name: &str) -> String {
        let res = self.post("/api/staff", json!({
            "providerId": provider_id,
            "name": name,
            "role": "Stylist"
        })).await;
        assert_eq!(res.status, StatusCode::CREATED, "staff setup failed: {}", res.body);
        res.body["id"].as_str().unwrap().to_string()
    }

    pub async fn book(&self, body: Value) -> TestResponse {
        self.post("/api/bookings", body).await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
