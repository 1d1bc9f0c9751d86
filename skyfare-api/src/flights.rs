use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use skyfare_core::{seatmap, FareSnapshot, Flight};
use skyfare_pricing::PriceBreakdown;
use skyfare_store::{BookingRepo, FareHistoryRepo, FlightRepo, FlightSearch};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct FlightSearchParams {
    source: Option<String>,
    destination: Option<String>,
    /// YYYY-MM-DD; an unparseable date is ignored rather than rejected.
    departure_date: Option<String>,
    min_price: Option<f64>,
    max_price: Option<f64>,
}

#[derive(Debug, Serialize)]
struct FlightResponse {
    id: Uuid,
    flight_number: String,
    airline: String,
    source: String,
    destination: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    base_price: f64,
    dynamic_price: f64,
    total_seats: i64,
    available_seats: i64,
    duration_minutes: i64,
}

#[derive(Debug, Serialize)]
struct FlightListResponse {
    flights: Vec<FlightResponse>,
    total_count: usize,
}

#[derive(Debug, Serialize)]
struct SeatMapResponse {
    flight_id: Uuid,
    total_seats: i64,
    available_seats: i64,
    available_seat_list: Vec<String>,
}

#[derive(Debug, Serialize)]
struct FareHistoryItem {
    price: f64,
    demand_factor: f64,
    available_seats: i64,
    recorded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct FareHistoryResponse {
    flight_id: Uuid,
    history: Vec<FareHistoryItem>,
}

#[derive(Debug, Deserialize)]
struct FareHistoryParams {
    limit: Option<i64>,
}

impl From<FareSnapshot> for FareHistoryItem {
    fn from(snapshot: FareSnapshot) -> Self {
        FareHistoryItem {
            price: snapshot.price,
            demand_factor: snapshot.demand_factor,
            available_seats: snapshot.available_seats,
            recorded_at: snapshot.recorded_at,
        }
    }
}

fn flight_response(flight: Flight, now: DateTime<Utc>) -> FlightResponse {
    FlightResponse {
        dynamic_price: skyfare_pricing::quote(&flight, now),
        duration_minutes: flight.duration_minutes(),
        id: flight.id,
        flight_number: flight.flight_number,
        airline: flight.airline,
        source: flight.source,
        destination: flight.destination,
        departure_time: flight.departure_time,
        arrival_time: flight.arrival_time,
        base_price: flight.base_price,
        total_seats: flight.total_seats,
        available_seats: flight.available_seats,
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/flights", get(search_flights))
        .route("/api/flights/{flight_id}", get(flight_details))
        .route("/api/flights/{flight_id}/seats", get(seat_map))
        .route("/api/flights/{flight_id}/fare-history", get(fare_history))
        .route("/api/flights/{flight_id}/pricing", get(pricing_breakdown))
}

/// Future flights with seats left, filters optional, dynamic price per row.
async fn search_flights(
    State(state): State<AppState>,
    Query(params): Query<FlightSearchParams>,
) -> Result<Json<FlightListResponse>, AppError> {
    let now = state.clock.now();
    let filters = FlightSearch {
        source: params.source,
        destination: params.destination,
        departure_date: params
            .departure_date
            .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        min_price: params.min_price,
        max_price: params.max_price,
    };

    let flights = FlightRepo::search(&state.db.pool, &filters, now).await?;
    let flights: Vec<FlightResponse> = flights
        .into_iter()
        .map(|f| flight_response(f, now))
        .collect();

    Ok(Json(FlightListResponse {
        total_count: flights.len(),
        flights,
    }))
}

async fn flight_details(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> Result<Json<FlightResponse>, AppError> {
    let mut conn = state.db.pool.acquire().await.map_err(AppError::from)?;
    let flight = FlightRepo::get(&mut conn, flight_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError("flight not found".to_string()))?;
    Ok(Json(flight_response(flight, state.clock.now())))
}

/// Free seats on a flight: the full cabin layout minus held labels.
async fn seat_map(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> Result<Json<SeatMapResponse>, AppError> {
    let mut conn = state.db.pool.acquire().await.map_err(AppError::from)?;
    let flight = FlightRepo::get(&mut conn, flight_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError("flight not found".to_string()))?;
    drop(conn);

    let held = BookingRepo::held_seats(&state.db.pool, flight_id).await?;
    let available_seat_list = seatmap::generate_labels(flight.total_seats)
        .into_iter()
        .filter(|label| !held.contains(label))
        .collect();

    Ok(Json(SeatMapResponse {
        flight_id,
        total_seats: flight.total_seats,
        available_seats: flight.available_seats,
        available_seat_list,
    }))
}

async fn fare_history(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
    Query(params): Query<FareHistoryParams>,
) -> Result<Json<FareHistoryResponse>, AppError> {
    let mut conn = state.db.pool.acquire().await.map_err(AppError::from)?;
    if FlightRepo::get(&mut conn, flight_id).await?.is_none() {
        return Err(AppError::NotFoundError("flight not found".to_string()));
    }
    drop(conn);

    let limit = params
        .limit
        .unwrap_or(state.fare_history_limit)
        .clamp(1, state.fare_history_limit);
    let history = FareHistoryRepo::recent(&state.db.pool, flight_id, limit).await?;

    Ok(Json(FareHistoryResponse {
        flight_id,
        history: history.into_iter().map(FareHistoryItem::from).collect(),
    }))
}

/// Transparency endpoint: every input to the fare formula. No side effects.
async fn pricing_breakdown(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> Result<Json<PriceBreakdown>, AppError> {
    let mut conn = state.db.pool.acquire().await.map_err(AppError::from)?;
    let flight = FlightRepo::get(&mut conn, flight_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError("flight not found".to_string()))?;

    Ok(Json(skyfare_pricing::breakdown(&flight, state.clock.now())))
}
