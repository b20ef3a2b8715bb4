mod common;

use axum::http::{header, StatusCode};
use common::TestApp;
use serde_json::{json, Value};

const MONDAY: &str = "2025-01-06";

struct Setup {
    app: TestApp,
    provider_id: String,
    service_id: String,
}

/// Provider open Mondays 09:00-12:00 with a 60 minute appointment service.
async fn setup() -> Setup {
    let app = TestApp::new().await;
    let provider_id = app.create_provider("salon").await;
    app.create_morning_schedule(&provider_id).await;
    let service = app.create_service(&provider_id, json!({})).await;
    let service_id = service["id"].as_str().unwrap().to_string();
    Setup { app, provider_id, service_id }
}

fn booking(s: &Setup, client: &str, time: &str) -> Value {
    json!({
        "serviceId": s.service_id,
        "clientId": client,
        "providerId": s.provider_id,
        "date": MONDAY,
        "time": time
    })
}

#[tokio::test]
async fn test_example_scenario_double_booking_and_cancel() {
    let s = setup().await;

    let first = s.app.book(booking(&s, "client-a", "09:00")).await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(first.body["status"], "PENDING");
    assert_eq!(first.body["time"], "09:00");
    assert_eq!(first.body["date"], MONDAY);
    assert_eq!(first.body["durationMinutes"], 60);
    let first_id = first.body["id"].as_str().unwrap().to_string();
    assert_eq!(
        first.headers.get(header::LOCATION).unwrap(),
        &format!("/api/bookings/{}?clientId=client-a", first_id)
    );

    let second = s.app.book(booking(&s, "client-b", "09:00")).await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.body["error"], "slot is no longer available");

    let cancelled = s.app.patch(&format!("/api/bookings/{}/cancel?clientId=client-a", first_id)).await;
    assert_eq!(cancelled.status, StatusCode::OK);
    assert_eq!(cancelled.body["status"], "CANCELLED");

    let retry = s.app.book(booking(&s, "client-b", "09:00")).await;
    assert_eq!(retry.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_overlapping_start_times_conflict() {
    let s = setup().await;
    assert_eq!(s.app.book(booking(&s, "a", "09:30")).await.status, StatusCode::CREATED);

    assert_eq!(s.app.book(booking(&s, "b", "09:00")).await.status, StatusCode::CONFLICT);
    assert_eq!(s.app.book(booking(&s, "b", "10:00")).await.status, StatusCode::CONFLICT);
    assert_eq!(s.app.book(booking(&s, "b", "10:30")).await.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_booking_outside_opening_hours_is_rejected() {
    let s = setup().await;

    let too_late = s.app.book(booking(&s, "a", "11:30")).await;
    assert_eq!(too_late.status, StatusCode::CONFLICT);
    assert_eq!(too_late.body["error"], "requested time is outside opening hours");

    let mut tuesday = booking(&s, "a", "09:00");
    tuesday["date"] = json!("2025-01-07");
    let closed = s.app.book(tuesday).await;
    assert_eq!(closed.status, StatusCode::CONFLICT);
    assert_eq!(closed.body["error"], "provider closed this weekday");
}

#[tokio::test]
async fn test_blocked_date_rejects_booking() {
    let s = setup().await;
    s.app.post("/api/blockeddates", json!({
        "providerId": s.provider_id,
        "date": MONDAY,
        "reason": "Inventory"
    })).await;

    let res = s.app.book(booking(&s, "a", "09:00")).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.body["error"], "date blocked: Inventory");
}

#[tokio::test]
async fn test_invalid_references_and_formats() {
    let s = setup().await;

    let mut unknown_service = booking(&s, "a", "09:00");
    unknown_service["serviceId"] = json!("ghost");
    assert_eq!(s.app.book(unknown_service).await.status, StatusCode::BAD_REQUEST);

    let mut unknown_provider = booking(&s, "a", "09:00");
    unknown_provider["providerId"] = json!("ghost");
    assert_eq!(s.app.book(unknown_provider).await.status, StatusCode::BAD_REQUEST);

    let bad_time = s.app.book(booking(&s, "a", "9 o'clock")).await;
    assert_eq!(bad_time.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_time.body["error"], "Invalid time format (HH:MM)");

    let mut bad_date = booking(&s, "a", "09:00");
    bad_date["date"] = json!("2025-13-01");
    assert_eq!(s.app.book(bad_date).await.status, StatusCode::BAD_REQUEST);

    assert!(s.app.get("/api/bookings").await.body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_status_machine() {
    let s = setup().await;
    let created = s.app.book(booking(&s, "a", "09:00")).await;
    let id = created.body["id"].as_str().unwrap().to_string();

    let confirmed = s.app.patch(&format!("/api/bookings/{}/confirm?clientId=a", id)).await;
    assert_eq!(confirmed.status, StatusCode::OK);
    assert_eq!(confirmed.body["status"], "CONFIRMED");

    let confirm_again = s.app.patch(&format!("/api/bookings/{}/confirm?clientId=a", id)).await;
    assert_eq!(confirm_again.status, StatusCode::CONFLICT);

    let cancelled = s.app.patch(&format!("/api/bookings/{}/cancel?clientId=a", id)).await;
    assert_eq!(cancelled.body["status"], "CANCELLED");

    let revive = s.app.patch(&format!("/api/bookings/{}/confirm?clientId=a", id)).await;
    assert_eq!(revive.status, StatusCode::CONFLICT);

    let cancel_again = s.app.patch(&format!("/api/bookings/{}/cancel?clientId=a", id)).await;
    assert_eq!(cancel_again.status, StatusCode::CONFLICT);

    let wrong_client = s.app.patch(&format!("/api/bookings/{}/cancel?clientId=b", id)).await;
    assert_eq!(wrong_client.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_round_trip_and_listings() {
    let s = setup().await;
    let mut body = booking(&s, "client-a", "10:00");
    body["notes"] = json!("first visit");
    let created = s.app.book(body).await;
    let id = created.body["id"].as_str().unwrap().to_string();
    s.app.book(booking(&s, "client-b", "09:00")).await;

    let fetched = s.app.get(&format!("/api/bookings/{}?clientId=client-a", id)).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["serviceId"], s.service_id.as_str());
    assert_eq!(fetched.body["providerId"], s.provider_id.as_str());
    assert_eq!(fetched.body["notes"], "first visit");
    assert_eq!(fetched.body["time"], "10:00");

    let by_client = s.app.get("/api/bookings/by-client/client-a").await;
    assert_eq!(by_client.body.as_array().unwrap().len(), 1);

    let by_provider = s.app.get(&format!("/api/bookings/by-provider/{}", s.provider_id)).await;
    let times: Vec<&str> = by_provider.body.as_array().unwrap()
        .iter()
        .map(|b| b["time"].as_str().unwrap())
        .collect();
    assert_eq!(times, vec!["09:00", "10:00"]);

    let deleted = s.app.delete(&format!("/api/bookings/{}?clientId=client-a", id)).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    let gone = s.app.get(&format!("/api/bookings/{}?clientId=client-a", id)).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_capacity_enforcement() {
    let s = setup().await;
    let class = s.app.create_service(&s.provider_id, json!({
        "name": "Pilates",
        "type": "EVENT",
        "maxCapacity": 4
    })).await;
    let class_id = class["id"].as_str().unwrap();

    let seat = |client: &str, guests: Option<u32>| {
        let mut body = json!({
            "serviceId": class_id,
            "clientId": client,
            "providerId": s.provider_id,
            "date": MONDAY,
            "time": "09:00"
        });
        if let Some(g) = guests {
            body["guests"] = json!(g);
        }
        body
    };

    assert_eq!(s.app.book(seat("a", Some(2))).await.status, StatusCode::CREATED);
    // Missing guests counts as one seat.
    assert_eq!(s.app.book(seat("b", None)).await.status, StatusCode::CREATED);

    let over = s.app.book(seat("c", Some(2))).await;
    assert_eq!(over.status, StatusCode::CONFLICT);
    assert_eq!(over.body["error"], "not enough capacity for this slot (1 places left)");

    assert_eq!(s.app.book(seat("c", Some(1))).await.status, StatusCode::CREATED);
    assert_eq!(s.app.book(seat("d", Some(1))).await.status, StatusCode::CONFLICT);

    let too_many = s.app.book(seat("e", Some(5))).await;
    assert_eq!(too_many.status, StatusCode::BAD_REQUEST);

    // The class shares its slot; the exclusive appointment is unaffected.
    let appointment = s.app.book(booking(&s, "f", "09:00")).await;
    assert_eq!(appointment.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_staff_rules() {
    let s = setup().await;
    let ana = s.app.create_staff(&s.provider_id, "Ana").await;
    let ben = s.app.create_staff(&s.provider_id, "Ben").await;
    let carla = s.app.create_staff(&s.provider_id, "Carla").await;
    let color = s.app.create_service(&s.provider_id, json!({
        "name": "Color",
        "requiresStaffSelection": true,
        "assignedStaffIds": [ana, ben]
    })).await;
    let color_id = color["id"].as_str().unwrap();

    let with_staff = |client: &str, staff: Option<&str>| {
        let mut body = json!({
            "serviceId": color_id,
            "clientId": client,
            "providerId": s.provider_id,
            "date": MONDAY,
            "time": "09:00"
        });
        if let Some(staff) = staff {
            body["staffId"] = json!(staff);
        }
        body
    };

    let no_staff = s.app.book(with_staff("a", None)).await;
    assert_eq!(no_staff.status, StatusCode::BAD_REQUEST);

    let unassigned = s.app.book(with_staff("a", Some(carla.as_str()))).await;
    assert_eq!(unassigned.status, StatusCode::BAD_REQUEST);

    let unknown = s.app.book(with_staff("a", Some("ghost"))).await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);

    assert_eq!(s.app.book(with_staff("a", Some(ana.as_str()))).await.status, StatusCode::CREATED);
    assert_eq!(s.app.book(with_staff("b", Some(ana.as_str()))).await.status, StatusCode::CONFLICT);
    assert_eq!(s.app.book(with_staff("b", Some(ben.as_str()))).await.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_staff_required_service_without_assignees_is_unbookable() {
    let s = setup().await;
    let ana = s.app.create_staff(&s.provider_id, "Ana").await;
    let color = s.app.create_service(&s.provider_id, json!({
        "name": "Color",
        "requiresStaffSelection": true
    })).await;

    let res = s.app.book(json!({
        "serviceId": color["id"],
        "clientId": "a",
        "providerId": s.provider_id,
        "staffId": ana,
        "date": MONDAY,
        "time": "10:00"
    })).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(s.app.get("/api/bookings").await.body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_on_site_requires_location() {
    let s = setup().await;
    let visit = s.app.create_service(&s.provider_id, json!({
        "name": "Home visit",
        "type": "ON_SITE"
    })).await;

    let mut body = json!({
        "serviceId": visit["id"],
        "clientId": "a",
        "providerId": s.provider_id,
        "date": MONDAY,
        "time": "09:00"
    });
    assert_eq!(s.app.book(body.clone()).await.status, StatusCode::BAD_REQUEST);

    body["location"] = json!("Calle Mayor 1");
    let ok = s.app.book(body).await;
    assert_eq!(ok.status, StatusCode::CREATED);
    assert_eq!(ok.body["location"], "Calle Mayor 1");
}

#[tokio::test]
async fn test_update_keeps_service_rules_without_moving() {
    let s = setup().await;
    let visit = s.app.create_service(&s.provider_id, json!({
        "name": "Home visit",
        "type": "ON_SITE"
    })).await;
    let created = s.app.book(json!({
        "serviceId": visit["id"],
        "clientId": "a",
        "providerId": s.provider_id,
        "date": MONDAY,
        "time": "09:00",
        "location": "Calle Mayor 1"
    })).await.body;
    let id = created["id"].as_str().unwrap().to_string();

    let mut cleared = created.clone();
    cleared["location"] = Value::Null;
    let res = s.app.put(&format!("/api/bookings/{}", id), cleared).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let mut noted = created;
    noted["notes"] = json!("ring twice");
    let res = s.app.put(&format!("/api/bookings/{}", id), noted).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["location"], "Calle Mayor 1");

    // Cancelling is allowed whatever the service rules say.
    let mut cancelled = res.body;
    cancelled["status"] = json!("CANCELLED");
    cancelled["location"] = Value::Null;
    let res = s.app.put(&format!("/api/bookings/{}", id), cancelled).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn test_location_header_encodes_client_id() {
    let s = setup().await;

    let res = s.app.book(booking(&s, "ana maria&co", "09:00")).await;
    assert_eq!(res.status, StatusCode::CREATED);
    let id = res.body["id"].as_str().unwrap();
    assert_eq!(
        res.headers.get(header::LOCATION).unwrap(),
        format!("/api/bookings/{}?clientId=ana%20maria%26co", id).as_str()
    );
    let fetched = s.app.get(res.headers.get(header::LOCATION).unwrap().to_str().unwrap()).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["clientId"], "ana maria&co");

    let res = s.app.book(booking(&s, "line\nbreak", "10:00")).await;
    assert_eq!(res.status, StatusCode::CREATED);
    let id = res.body["id"].as_str().unwrap();
    assert_eq!(
        res.headers.get(header::LOCATION).unwrap(),
        format!("/api/bookings/{}?clientId=line%0Abreak", id).as_str()
    );
}

#[tokio::test]
async fn test_update_reschedules_and_keeps_invariants() {
    let s = setup().await;
    let a = s.app.book(booking(&s, "a", "09:00")).await.body;
    s.app.book(booking(&s, "b", "11:00")).await;
    let id = a["id"].as_str().unwrap().to_string();

    // Moving onto another booking's slot is refused.
    let mut moved = a.clone();
    moved["time"] = json!("11:00");
    let clash = s.app.put(&format!("/api/bookings/{}", id), moved).await;
    assert_eq!(clash.status, StatusCode::CONFLICT);

    // Moving within its own window does not conflict with itself.
    let mut shifted = a.clone();
    shifted["time"] = json!("09:30");
    shifted["durationMinutes"] = json!(5);
    let ok = s.app.put(&format!("/api/bookings/{}", id), shifted).await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.body["time"], "09:30");
    assert_eq!(ok.body["durationMinutes"], 60);

    let current = ok.body;
    let mut new_service = current.clone();
    new_service["serviceId"] = json!("other");
    let res = s.app.put(&format!("/api/bookings/{}", id), new_service).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let mut new_client = current.clone();
    new_client["clientId"] = json!("z");
    let res = s.app.put(&format!("/api/bookings/{}", id), new_client).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let mut cancelled = current.clone();
    cancelled["status"] = json!("CANCELLED");
    let res = s.app.put(&format!("/api/bookings/{}", id), cancelled).await;
    assert_eq!(res.status, StatusCode::OK);

    let mut revived = res.body.clone();
    revived["status"] = json!("PENDING");
    let res = s.app.put(&format!("/api/bookings/{}", id), revived).await;
    assert_eq!(res.status, StatusCode::CONFLICT);

    // The stale etag from before the cancellation no longer matches.
    let mut stale = current;
    stale["status"] = json!("CANCELLED");
    stale["notes"] = json!("late edit");
    let res = s.app.put(&format!("/api/bookings/{}", id), stale).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_status_name_is_a_bad_request() {
    let s = setup().await;
    let a = s.app.book(booking(&s, "a", "09:00")).await.body;
    let id = a["id"].as_str().unwrap().to_string();

    let mut bad = a;
    bad["status"] = json!("ARCHIVED");
    let res = s.app.put(&format!("/api/bookings/{}", id), bad).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}
