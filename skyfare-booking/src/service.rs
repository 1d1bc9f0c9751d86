//! The booking state machine.
//!
//! Every transition that touches a flight's `available_seats` counter or
//! the set of seat-holding bookings runs as one transaction; nothing else
//! in the system writes either. The schema's partial unique index on
//! (flight_id, seat_no) rejects the losing side of a seat race at insert,
//! which this service surfaces as a conflict.

use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use skyfare_core::{
    seatmap, Booking, BookingStatus, CardDetails, Clock, PaymentGateway, PaymentOutcome,
};
use skyfare_pricing as pricing;
use skyfare_store::{is_unique_violation, BookingRepo, DbClient, FlightRepo};

use crate::error::BookingError;
use crate::pnr;

/// Share of the fare refunded when a confirmed booking is cancelled.
pub const REFUND_RATE: f64 = 0.8;

#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub booking: Booking,
    pub outcome: PaymentOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct Cancellation {
    pub booking: Booking,
    pub refund_amount: Option<f64>,
}

pub struct BookingService {
    db: DbClient,
    clock: Arc<dyn Clock>,
    gateway: Arc<dyn PaymentGateway>,
}

impl BookingService {
    pub fn new(db: DbClient, clock: Arc<dyn Clock>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { db, clock, gateway }
    }

    /// Step 1: reserve a seat. Creates a PENDING booking with the fare
    /// snapshotted at this instant; the snapshot is never recomputed.
    pub async fn select_seat(
        &self,
        user_id: Uuid,
        flight_id: Uuid,
        seat_no: &str,
    ) -> Result<Booking, BookingError> {
        let now = self.clock.now();
        let mut tx = self.db.pool.begin().await?;

        let mut flight = FlightRepo::get(&mut tx, flight_id)
            .await?
            .ok_or(BookingError::FlightNotFound)?;

        if flight.has_departed(now) {
            return Err(BookingError::FlightDeparted);
        }
        if flight.available_seats <= 0 {
            return Err(BookingError::NoSeatsAvailable);
        }
        if !seatmap::is_valid_label(seat_no, flight.total_seats) {
            return Err(BookingError::InvalidSeatNumber(seat_no.to_string()));
        }
        if BookingRepo::is_seat_taken(&mut tx, flight_id, seat_no).await? {
            return Err(BookingError::SeatAlreadyTaken(seat_no.to_string()));
        }

        // A newer selection supersedes the user's open booking on this
        // flight: cancel it and return its seat before taking the new one.
        if let Some(open) =
            BookingRepo::find_open_for_user_flight(&mut tx, user_id, flight_id).await?
        {
            BookingRepo::set_status(&mut tx, open.id, BookingStatus::Cancelled, now).await?;
            FlightRepo::adjust_available_seats(&mut tx, flight_id, 1).await?;
            flight = FlightRepo::get(&mut tx, flight_id)
                .await?
                .ok_or(BookingError::FlightNotFound)?;
            info!(booking_id = %open.id, seat = %open.seat_no, "superseded open booking");
        }

        let final_price = pricing::quote(&flight, now);
        let booking = Booking {
            id: Uuid::new_v4(),
            pnr: None,
            user_id,
            flight_id,
            seat_no: seat_no.to_string(),
            passenger_name: None,
            passenger_email: None,
            final_price,
            status: BookingStatus::Pending,
            booking_date: None,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = BookingRepo::insert(&mut tx, &booking).await {
            // The partial unique index caught a concurrent writer.
            return if is_unique_violation(&e) {
                Err(BookingError::SeatConflict)
            } else {
                Err(e.into())
            };
        }
        FlightRepo::adjust_available_seats(&mut tx, flight_id, -1).await?;
        tx.commit().await?;

        info!(
            booking_id = %booking.id,
            %flight_id,
            seat = %seat_no,
            price = final_price,
            "seat reserved"
        );
        Ok(booking)
    }

    /// Step 2: attach passenger details. PENDING -> INFO_ADDED.
    pub async fn add_passenger_info(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
        name: &str,
        email: &str,
    ) -> Result<Booking, BookingError> {
        let now = self.clock.now();
        let mut tx = self.db.pool.begin().await?;

        let booking = BookingRepo::find_owned(&mut tx, booking_id, user_id)
            .await?
            .ok_or(BookingError::BookingNotFound)?;
        if booking.status != BookingStatus::Pending {
            return Err(BookingError::WrongState {
                action: "add passenger info",
                status: booking.status,
            });
        }

        BookingRepo::set_passenger_info(&mut tx, booking_id, name, email, now).await?;
        tx.commit().await?;

        Ok(Booking {
            passenger_name: Some(name.to_string()),
            passenger_email: Some(email.to_string()),
            status: BookingStatus::InfoAdded,
            updated_at: now,
            ..booking
        })
    }

    /// Step 3: charge and settle. Success confirms the booking and issues
    /// its PNR; failure releases the seat and parks the booking in FAILED
    /// for good, so the caller starts over with a fresh selection.
    pub async fn process_payment(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
        card: &CardDetails,
    ) -> Result<PaymentReceipt, BookingError> {
        let now = self.clock.now();

        let booking = {
            let mut conn = self.db.pool.acquire().await?;
            BookingRepo::find_owned(&mut conn, booking_id, user_id)
                .await?
                .ok_or(BookingError::BookingNotFound)?
        };
        if !booking.status.is_payable() {
            return Err(BookingError::WrongState {
                action: "process payment",
                status: booking.status,
            });
        }
        if !card.is_valid(now) {
            return Err(BookingError::InvalidCardDetails);
        }

        let outcome = self.gateway.charge(booking.id, booking.final_price).await;

        let mut tx = self.db.pool.begin().await?;
        // The status may have moved since the charge decision; re-check
        // inside the transaction before touching inventory.
        let current = BookingRepo::find_owned(&mut tx, booking_id, user_id)
            .await?
            .ok_or(BookingError::BookingNotFound)?;
        if !current.status.is_payable() {
            return Err(BookingError::WrongState {
                action: "process payment",
                status: current.status,
            });
        }

        let receipt = match outcome {
            PaymentOutcome::Success => {
                let code = pnr::allocate(&mut tx).await?;
                BookingRepo::confirm(&mut tx, booking_id, &code, now).await?;
                info!(%booking_id, pnr = %code, "payment succeeded, booking confirmed");
                PaymentReceipt {
                    booking: Booking {
                        pnr: Some(code),
                        status: BookingStatus::Confirmed,
                        booking_date: Some(now),
                        updated_at: now,
                        ..current
                    },
                    outcome,
                }
            }
            PaymentOutcome::Failed => {
                FlightRepo::adjust_available_seats(&mut tx, current.flight_id, 1).await?;
                BookingRepo::set_status(&mut tx, booking_id, BookingStatus::Failed, now).await?;
                info!(%booking_id, "payment declined, seat released");
                PaymentReceipt {
                    booking: Booking {
                        status: BookingStatus::Failed,
                        updated_at: now,
                        ..current
                    },
                    outcome,
                }
            }
        };
        tx.commit().await?;
        Ok(receipt)
    }

    /// Cancel an open or confirmed booking, releasing its seat. Confirmed
    /// cancellations report an 80% refund; no money actually moves.
    pub async fn cancel(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
    ) -> Result<Cancellation, BookingError> {
        let now = self.clock.now();
        let mut tx = self.db.pool.begin().await?;

        let booking = BookingRepo::find_owned(&mut tx, booking_id, user_id)
            .await?
            .ok_or(BookingError::BookingNotFound)?;
        match booking.status {
            BookingStatus::Cancelled => return Err(BookingError::AlreadyCancelled),
            BookingStatus::Failed => return Err(BookingError::CannotCancelFailed),
            _ => {}
        }

        FlightRepo::adjust_available_seats(&mut tx, booking.flight_id, 1).await?;
        let refund_amount = (booking.status == BookingStatus::Confirmed)
            .then(|| pricing::round2(booking.final_price * REFUND_RATE));
        BookingRepo::set_status(&mut tx, booking_id, BookingStatus::Cancelled, now).await?;
        tx.commit().await?;

        info!(%booking_id, refund = ?refund_amount, "booking cancelled");
        Ok(Cancellation {
            booking: Booking {
                status: BookingStatus::Cancelled,
                updated_at: now,
                ..booking
            },
            refund_amount,
        })
    }

    pub async fn get_booking(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
    ) -> Result<Booking, BookingError> {
        let mut conn = self.db.pool.acquire().await?;
        BookingRepo::find_owned(&mut conn, booking_id, user_id)
            .await?
            .ok_or(BookingError::BookingNotFound)
    }

    /// Newest first.
    pub async fn list_bookings(&self, user_id: Uuid) -> Result<Vec<Booking>, BookingError> {
        Ok(BookingRepo::list_for_user(&self.db.pool, user_id).await?)
    }

    /// Public lookup; no ownership check.
    pub async fn find_by_pnr(&self, pnr: &str) -> Result<Option<Booking>, BookingError> {
        Ok(BookingRepo::find_by_pnr(&self.db.pool, &pnr.to_ascii_uppercase()).await?)
    }
}
