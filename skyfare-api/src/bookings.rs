use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use skyfare_core::{Booking, CardDetails, PaymentOutcome};
use skyfare_store::FlightRepo;

use crate::error::AppError;
use crate::middleware::auth::{auth_middleware, Claims};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct SeatSelectionRequest {
    flight_id: Uuid,
    seat_no: String,
}

#[derive(Debug, Serialize)]
struct SeatSelectionResponse {
    booking_id: Uuid,
    flight_id: Uuid,
    seat_no: String,
    status: String,
    dynamic_price: f64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct PassengerInfoRequest {
    passenger_name: String,
    passenger_email: String,
}

#[derive(Debug, Serialize)]
struct PassengerInfoResponse {
    booking_id: Uuid,
    passenger_name: String,
    passenger_email: String,
    status: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct PaymentResponse {
    booking_id: Uuid,
    pnr: Option<String>,
    status: String,
    payment_status: PaymentOutcome,
    final_price: f64,
    message: String,
}

#[derive(Debug, Serialize)]
struct BookingFlightInfo {
    flight_number: String,
    airline: String,
    source: String,
    destination: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct BookingResponse {
    id: Uuid,
    pnr: Option<String>,
    user_id: Uuid,
    flight_id: Uuid,
    seat_no: String,
    passenger_name: Option<String>,
    passenger_email: Option<String>,
    final_price: f64,
    status: String,
    booking_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    flight: Option<BookingFlightInfo>,
}

#[derive(Debug, Serialize)]
struct BookingHistoryResponse {
    bookings: Vec<BookingResponse>,
    total_count: usize,
}

#[derive(Debug, Serialize)]
struct CancellationResponse {
    booking_id: Uuid,
    pnr: Option<String>,
    status: String,
    message: String,
    refund_amount: Option<f64>,
}

// ============================================================================
// Routes
// ============================================================================

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/bookings/select-seat", post(select_seat))
        .route("/api/bookings/history", get(booking_history))
        .route(
            "/api/bookings/{booking_id}",
            get(get_booking).delete(cancel_booking),
        )
        .route("/api/bookings/{booking_id}/passenger", post(add_passenger))
        .route("/api/bookings/{booking_id}/payment", post(process_payment))
        .route_layer(from_fn_with_state(state, auth_middleware))
}

/// PNR lookup stays outside the auth layer: anyone holding a code may use it.
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/api/bookings/pnr/{pnr}", get(lookup_by_pnr))
}

// ============================================================================
// Multi-step booking flow
// ============================================================================

async fn select_seat(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SeatSelectionRequest>,
) -> Result<(StatusCode, Json<SeatSelectionResponse>), AppError> {
    let booking = state
        .bookings
        .select_seat(claims.user_id()?, req.flight_id, &req.seat_no)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SeatSelectionResponse {
            booking_id: booking.id,
            flight_id: booking.flight_id,
            message: format!(
                "Seat {} reserved. Add passenger details and pay to confirm.",
                booking.seat_no
            ),
            seat_no: booking.seat_no,
            status: booking.status.to_string(),
            dynamic_price: booking.final_price,
        }),
    ))
}

async fn add_passenger(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<PassengerInfoRequest>,
) -> Result<Json<PassengerInfoResponse>, AppError> {
    if req.passenger_name.trim().len() < 2 {
        return Err(AppError::ValidationError(
            "passenger name is too short".to_string(),
        ));
    }
    if !req.passenger_email.contains('@') {
        return Err(AppError::ValidationError(
            "invalid passenger email".to_string(),
        ));
    }

    let booking = state
        .bookings
        .add_passenger_info(
            claims.user_id()?,
            booking_id,
            req.passenger_name.trim(),
            &req.passenger_email,
        )
        .await?;

    Ok(Json(PassengerInfoResponse {
        booking_id: booking.id,
        passenger_name: booking.passenger_name.unwrap_or_default(),
        passenger_email: booking.passenger_email.unwrap_or_default(),
        status: booking.status.to_string(),
        message: "Passenger information added. Please proceed to payment.".to_string(),
    }))
}

async fn process_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(card): Json<CardDetails>,
) -> Result<Json<PaymentResponse>, AppError> {
    let receipt = state
        .bookings
        .process_payment(claims.user_id()?, booking_id, &card)
        .await?;

    let message = match (&receipt.outcome, &receipt.booking.pnr) {
        (PaymentOutcome::Success, Some(pnr)) => format!("Payment successful! Your PNR is: {pnr}"),
        _ => "Payment failed. The seat has been released; please start a new booking.".to_string(),
    };

    Ok(Json(PaymentResponse {
        booking_id: receipt.booking.id,
        pnr: receipt.booking.pnr,
        status: receipt.booking.status.to_string(),
        payment_status: receipt.outcome,
        final_price: receipt.booking.final_price,
        message,
    }))
}

// ============================================================================
// Retrieval and cancellation
// ============================================================================

async fn booking_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<BookingHistoryResponse>, AppError> {
    let bookings = state.bookings.list_bookings(claims.user_id()?).await?;

    let mut responses = Vec::with_capacity(bookings.len());
    for booking in bookings {
        responses.push(booking_response(&state, booking).await?);
    }

    Ok(Json(BookingHistoryResponse {
        total_count: responses.len(),
        bookings: responses,
    }))
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = state
        .bookings
        .get_booking(claims.user_id()?, booking_id)
        .await?;
    Ok(Json(booking_response(&state, booking).await?))
}

async fn lookup_by_pnr(
    State(state): State<AppState>,
    Path(pnr): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = state
        .bookings
        .find_by_pnr(&pnr)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("no booking found for PNR {pnr}")))?;
    Ok(Json(booking_response(&state, booking).await?))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<CancellationResponse>, AppError> {
    let cancellation = state.bookings.cancel(claims.user_id()?, booking_id).await?;

    Ok(Json(CancellationResponse {
        booking_id: cancellation.booking.id,
        pnr: cancellation.booking.pnr,
        status: cancellation.booking.status.to_string(),
        message: "Booking cancelled successfully".to_string(),
        refund_amount: cancellation.refund_amount,
    }))
}

async fn booking_response(state: &AppState, booking: Booking) -> Result<BookingResponse, AppError> {
    let mut conn = state.db.pool.acquire().await.map_err(AppError::from)?;
    let flight = FlightRepo::get(&mut conn, booking.flight_id)
        .await?
        .map(|f| BookingFlightInfo {
            flight_number: f.flight_number,
            airline: f.airline,
            source: f.source,
            destination: f.destination,
            departure_time: f.departure_time,
            arrival_time: f.arrival_time,
        });

    Ok(BookingResponse {
        id: booking.id,
        pnr: booking.pnr,
        user_id: booking.user_id,
        flight_id: booking.flight_id,
        seat_no: booking.seat_no,
        passenger_name: booking.passenger_name,
        passenger_email: booking.passenger_email,
        final_price: booking.final_price,
        status: booking.status.to_string(),
        booking_date: booking.booking_date,
        created_at: booking.created_at,
        flight,
    })
}
