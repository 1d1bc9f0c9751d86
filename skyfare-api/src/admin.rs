use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use skyfare_booking::DemandPassSummary;
use skyfare_core::flight::{DEMAND_FACTOR_MAX, DEMAND_FACTOR_MIN};
use skyfare_core::{BookingStatus, Flight};
use skyfare_store::{is_unique_violation, BookingRepo, FareHistoryRepo, FlightRepo, UserRepo};

use crate::error::AppError;
use crate::middleware::auth::admin_auth_middleware;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct AdminStats {
    total_users: i64,
    total_flights: i64,
    total_bookings: i64,
    confirmed_bookings: i64,
    pending_bookings: i64,
    total_revenue: f64,
}

#[derive(Debug, Deserialize)]
struct FlightCreateRequest {
    flight_number: String,
    airline: String,
    source: String,
    destination: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    base_price: f64,
    #[serde(default = "default_total_seats")]
    total_seats: i64,
}

fn default_total_seats() -> i64 {
    180
}

#[derive(Debug, Deserialize)]
struct FlightUpdateRequest {
    airline: Option<String>,
    source: Option<String>,
    destination: Option<String>,
    departure_time: Option<DateTime<Utc>>,
    arrival_time: Option<DateTime<Utc>>,
    base_price: Option<f64>,
    total_seats: Option<i64>,
    demand_factor: Option<f64>,
}

#[derive(Debug, Serialize)]
struct FlightCreatedResponse {
    flight_id: Uuid,
    message: String,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

// ============================================================================
// Routes
// ============================================================================

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin/stats", get(stats))
        .route("/api/admin/flights", get(list_flights).post(create_flight))
        .route(
            "/api/admin/flights/{flight_id}",
            put(update_flight).delete(delete_flight),
        )
        .route(
            "/api/admin/flights/{flight_id}/fare-snapshot",
            post(record_fare_snapshot),
        )
        .route("/api/admin/demand/run", post(run_demand_pass))
        .route_layer(from_fn_with_state(state, admin_auth_middleware))
}

async fn stats(State(state): State<AppState>) -> Result<Json<AdminStats>, AppError> {
    let pool = &state.db.pool;
    Ok(Json(AdminStats {
        total_users: UserRepo::count(pool).await?,
        total_flights: FlightRepo::count(pool).await?,
        total_bookings: BookingRepo::count(pool).await?,
        confirmed_bookings: BookingRepo::count_with_status(pool, &[BookingStatus::Confirmed])
            .await?,
        pending_bookings: BookingRepo::count_with_status(
            pool,
            &[BookingStatus::Pending, BookingStatus::InfoAdded],
        )
        .await?,
        total_revenue: BookingRepo::confirmed_revenue(pool).await?,
    }))
}

async fn list_flights(State(state): State<AppState>) -> Result<Json<Vec<Flight>>, AppError> {
    Ok(Json(FlightRepo::list_all(&state.db.pool).await?))
}

async fn create_flight(
    State(state): State<AppState>,
    Json(req): Json<FlightCreateRequest>,
) -> Result<(StatusCode, Json<FlightCreatedResponse>), AppError> {
    if req.arrival_time <= req.departure_time {
        return Err(AppError::ValidationError(
            "arrival time must be after departure time".to_string(),
        ));
    }
    if req.base_price <= 0.0 {
        return Err(AppError::ValidationError(
            "base price must be positive".to_string(),
        ));
    }
    if req.total_seats <= 0 {
        return Err(AppError::ValidationError(
            "total seats must be positive".to_string(),
        ));
    }

    let flight = Flight {
        id: Uuid::new_v4(),
        flight_number: req.flight_number,
        airline: req.airline,
        source: req.source,
        destination: req.destination,
        departure_time: req.departure_time,
        arrival_time: req.arrival_time,
        base_price: req.base_price,
        total_seats: req.total_seats,
        available_seats: req.total_seats,
        demand_factor: 1.0,
    };

    let mut conn = state.db.pool.acquire().await.map_err(AppError::from)?;
    if let Err(e) = FlightRepo::insert(&mut conn, &flight).await {
        return if is_unique_violation(&e) {
            Err(AppError::ConflictError(
                "flight number already exists".to_string(),
            ))
        } else {
            Err(e.into())
        };
    }

    tracing::info!(flight_id = %flight.id, number = %flight.flight_number, "flight created");
    Ok((
        StatusCode::CREATED,
        Json(FlightCreatedResponse {
            flight_id: flight.id,
            message: "Flight created successfully".to_string(),
        }),
    ))
}

async fn update_flight(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
    Json(req): Json<FlightUpdateRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let mut conn = state.db.pool.acquire().await.map_err(AppError::from)?;
    let mut flight = FlightRepo::get(&mut conn, flight_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError("flight not found".to_string()))?;
    drop(conn);

    if let Some(airline) = req.airline {
        flight.airline = airline;
    }
    if let Some(source) = req.source {
        flight.source = source;
    }
    if let Some(destination) = req.destination {
        flight.destination = destination;
    }
    if let Some(departure_time) = req.departure_time {
        flight.departure_time = departure_time;
    }
    if let Some(arrival_time) = req.arrival_time {
        flight.arrival_time = arrival_time;
    }
    if let Some(base_price) = req.base_price {
        if base_price <= 0.0 {
            return Err(AppError::ValidationError(
                "base price must be positive".to_string(),
            ));
        }
        flight.base_price = base_price;
    }
    if let Some(demand_factor) = req.demand_factor {
        if !(DEMAND_FACTOR_MIN..=DEMAND_FACTOR_MAX).contains(&demand_factor) {
            return Err(AppError::ValidationError(format!(
                "demand factor must be within [{DEMAND_FACTOR_MIN}, {DEMAND_FACTOR_MAX}]"
            )));
        }
        flight.demand_factor = demand_factor;
    }
    if let Some(total_seats) = req.total_seats {
        // Resizing the cabin must keep every held seat and the
        // availability invariant intact.
        let held = BookingRepo::count_holding_for_flight(&state.db.pool, flight_id).await?;
        if total_seats < held {
            return Err(AppError::BusinessRuleError(format!(
                "cannot shrink to {total_seats} seats: {held} are held"
            )));
        }
        flight.total_seats = total_seats;
        flight.available_seats = total_seats - held;
    }
    if flight.arrival_time <= flight.departure_time {
        return Err(AppError::ValidationError(
            "arrival time must be after departure time".to_string(),
        ));
    }

    let mut conn = state.db.pool.acquire().await.map_err(AppError::from)?;
    FlightRepo::update(&mut conn, &flight).await?;

    Ok(Json(MessageResponse {
        message: format!("Flight {} updated successfully", flight.flight_number),
    }))
}

/// A flight with bookings on record is never deleted.
async fn delete_flight(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    let mut conn = state.db.pool.acquire().await.map_err(AppError::from)?;
    let flight = FlightRepo::get(&mut conn, flight_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError("flight not found".to_string()))?;

    if BookingRepo::exists_for_flight(&mut conn, flight_id).await? {
        return Err(AppError::BusinessRuleError(
            "cannot delete a flight with existing bookings".to_string(),
        ));
    }
    FlightRepo::delete(&mut conn, flight_id).await?;

    Ok(Json(MessageResponse {
        message: format!("Flight {} deleted successfully", flight.flight_number),
    }))
}

/// Append a fare snapshot for a flight on demand, outside the simulator's
/// own change-driven appends.
async fn record_fare_snapshot(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let now = state.clock.now();
    let mut conn = state.db.pool.acquire().await.map_err(AppError::from)?;
    let flight = FlightRepo::get(&mut conn, flight_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError("flight not found".to_string()))?;

    FareHistoryRepo::append(
        &mut conn,
        flight.id,
        skyfare_pricing::quote(&flight, now),
        flight.demand_factor,
        flight.available_seats,
        now,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: format!("Fare snapshot recorded for flight {}", flight.flight_number),
        }),
    ))
}

/// Manual single-shot demand pass, same logic as the background loop.
async fn run_demand_pass(
    State(state): State<AppState>,
) -> Result<Json<DemandPassSummary>, AppError> {
    let summary = state
        .simulator
        .run_once()
        .await
        .map_err(|e| AppError::InternalServerError(e.into()))?;
    Ok(Json(summary))
}
