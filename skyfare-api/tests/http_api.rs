//! HTTP-level tests: the full router driven through tower's oneshot,
//! against in-memory SQLite.

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use chrono::{Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use skyfare_api::state::{AppState, AuthConfig};
use skyfare_api::{app, users};
use skyfare_booking::{BookingService, DemandSimulator};
use skyfare_core::{Clock, FixedClock, Flight, SimulatedGateway, User};
use skyfare_store::{DbClient, FlightRepo, UserRepo};

async fn test_state() -> AppState {
    let db = DbClient::in_memory().await.unwrap();
    db.migrate().await.unwrap();

    let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap(),
    ));
    let bookings = Arc::new(BookingService::new(
        db.clone(),
        clock.clone(),
        Arc::new(SimulatedGateway::new(1.0)),
    ));
    let simulator = Arc::new(DemandSimulator::new(db.clone(), clock.clone()));

    AppState {
        db,
        bookings,
        simulator,
        clock,
        auth: AuthConfig {
            secret: "test-secret".to_string(),
            // exp is validated against the real clock, not the fixture
            // clock, so keep issued tokens valid far into the future.
            expiration: 10 * 365 * 24 * 3600,
        },
        fare_history_limit: 50,
    }
}

async fn seed_flight(state: &AppState) -> Flight {
    let now = state.clock.now();
    let flight = Flight {
        id: Uuid::new_v4(),
        flight_number: "SF100".to_string(),
        airline: "Skyfare".to_string(),
        source: "Lisbon".to_string(),
        destination: "Vienna".to_string(),
        departure_time: now + Duration::days(10),
        arrival_time: now + Duration::days(10) + Duration::hours(3),
        base_price: 250.0,
        total_seats: 180,
        available_seats: 180,
        demand_factor: 1.0,
    };
    let mut conn = state.db.pool.acquire().await.unwrap();
    FlightRepo::insert(&mut conn, &flight).await.unwrap();
    flight
}

async fn seed_admin(state: &AppState) {
    let admin = User {
        id: Uuid::new_v4(),
        name: "Ops".to_string(),
        email: "ops@example.com".to_string(),
        mobile_no: None,
        password_hash: users::hash_password("admin-pass"),
        is_admin: true,
        created_at: state.clock.now(),
    };
    let mut conn = state.db.pool.acquire().await.unwrap();
    UserRepo::insert(&mut conn, &admin).await.unwrap();
}

fn post_json(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_req(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn register(app: &axum::Router, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/register",
            json!({
                "name": "Ana Costa",
                "email": email,
                "password": "s3cret-pass"
            }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn register_login_and_profile() {
    let state = test_state().await;
    let app = app(state);

    let token = register(&app, "ana@example.com").await;

    let response = app
        .clone()
        .oneshot(get_req("/api/users/me", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["email"], "ana@example.com");

    // Wrong password is a 401, not a hint.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/login",
            json!({ "email": "ana@example.com", "password": "nope" }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Duplicate registration refused.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/register",
            json!({
                "name": "Ana Again",
                "email": "ana@example.com",
                "password": "s3cret-pass"
            }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn booking_flow_over_http() {
    let state = test_state().await;
    let flight = seed_flight(&state).await;
    let app = app(state);

    let token = register(&app, "ana@example.com").await;

    // Search shows the flight with its dynamic price.
    let response = app
        .clone()
        .oneshot(get_req("/api/flights?source=Lis", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["flights"][0]["dynamic_price"], 250.0);

    // Step 1: seat.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/bookings/select-seat",
            json!({ "flight_id": flight.id, "seat_no": "12A" }),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let booking_id = body["booking_id"].as_str().unwrap().to_string();
    assert_eq!(body["status"], "PENDING");

    // Step 2: passenger.
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/bookings/{booking_id}/passenger"),
            json!({ "passenger_name": "Ana Costa", "passenger_email": "ana@example.com" }),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Step 3: payment (gateway pinned to approve).
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/bookings/{booking_id}/payment"),
            json!({
                "card_number": "4111111111111111",
                "expiry_month": 12,
                "expiry_year": 2030,
                "cvv": "123"
            }),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "CONFIRMED");
    let pnr = body["pnr"].as_str().unwrap().to_string();
    assert_eq!(pnr.len(), 6);

    // Public PNR lookup needs no token.
    let response = app
        .clone()
        .oneshot(get_req(&format!("/api/bookings/pnr/{pnr}"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["seat_no"], "12A");
    assert_eq!(body["flight"]["flight_number"], "SF100");

    // Double-booking the same seat is a conflict.
    let other = register(&app, "rui@example.com").await;
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/bookings/select-seat",
            json!({ "flight_id": flight.id, "seat_no": "12A" }),
            Some(&other),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn auth_boundaries_are_enforced() {
    let state = test_state().await;
    seed_admin(&state).await;
    let app = app(state);

    // No token.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/bookings/select-seat",
            json!({ "flight_id": Uuid::new_v4(), "seat_no": "1A" }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Customer token on an admin route.
    let customer = register(&app, "ana@example.com").await;
    let response = app
        .clone()
        .oneshot(get_req("/api/admin/stats", Some(&customer)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admin token works and can trigger a demand pass.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/login",
            json!({ "email": "ops@example.com", "password": "admin-pass" }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let admin_token = body_json(response).await["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(get_req("/api/admin/stats", Some(&admin_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post_json("/api/admin/demand/run", json!({}), Some(&admin_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["scanned"], 0);
}
