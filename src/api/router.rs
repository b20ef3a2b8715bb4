use axum::{
    body::Body,
    extract::Request,
    http::{HeaderName, HeaderValue, Method},
    routing::{get, patch, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{availability, blocked_dates, bookings, health, providers, schedules, services, staff, users};
use tower_http::{
    cors::CorsLayer,
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info, warn};
use uuid::Uuid;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            HeaderName::from_static("idempotency-key"),
        ])
        .expose_headers([
            axum::http::header::LOCATION,
            HeaderName::from_static("idempotent-replayed"),
        ])
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Users
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route("/api/users/by-email/{email}", get(users::get_user_by_email))
        .route("/api/users/by-role/{role}", get(users::list_users_by_role))
        .route("/api/users/{id}", get(users::get_user).put(users::update_user).delete(users::delete_user))

        // Provider profiles
        .route("/api/providerprofiles", get(providers::list_providers).post(providers::create_provider))
        .route("/api/providerprofiles/by-slug/{slug}", get(providers::get_provider_by_slug))
        .route("/api/providerprofiles/{id}", get(providers::get_provider).put(providers::update_provider).delete(providers::delete_provider))

        // Catalog
        .route("/api/services", get(services::list_services).post(services::create_service))
        .route("/api/services/by-provider/{provider_id}", get(services::list_services_by_provider))
        .route("/api/services/{id}", get(services::get_service).put(services::update_service).delete(services::delete_service))
        .route("/api/staff", get(staff::list_staff).post(staff::create_staff))
        .route("/api/staff/by-provider/{provider_id}", get(staff::list_staff_by_provider))
        .route("/api/staff/{id}", get(staff::get_staff).put(staff::update_staff).delete(staff::delete_staff))

        // Schedules & exceptions
        .route("/api/weeklyschedules", get(schedules::list_schedules).post(schedules::create_schedule))
        .route("/api/weeklyschedules/by-provider/{provider_id}", get(schedules::get_schedule_by_provider))
        .route("/api/weeklyschedules/{id}", put(schedules::update_schedule).delete(schedules::delete_schedule))
        .route("/api/blockeddates", get(blocked_dates::list_blocked_dates).post(blocked_dates::create_blocked_date))
        .route("/api/blockeddates/by-provider/{provider_id}", get(blocked_dates::list_blocked_dates_by_provider))
        .route("/api/blockeddates/{id}", get(blocked_dates::get_blocked_date).put(blocked_dates::update_blocked_date).delete(blocked_dates::delete_blocked_date))

        // Bookings
        .route("/api/bookings", get(bookings::list_bookings).post(bookings::create_booking))
        .route("/api/bookings/by-client/{client_id}", get(bookings::list_bookings_by_client))
        .route("/api/bookings/by-provider/{provider_id}", get(bookings::list_bookings_by_provider))
        .route("/api/bookings/{id}", get(bookings::get_booking).put(bookings::update_booking).delete(bookings::delete_booking))
        .route("/api/bookings/{id}/confirm", patch(bookings::confirm_booking))
        .route("/api/bookings/{id}/cancel", patch(bookings::cancel_booking))

        // Availability
        .route("/api/availability/{provider_id}", get(availability::get_day_availability))
        .route("/api/availability/{provider_id}/dates", get(availability::get_available_dates))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
