//! Demand-responsive fare calculation.
//!
//! `price = base_price * seat_factor * time_factor * demand_factor`,
//! rounded to 2 decimals. Pure and deterministic given flight state and a
//! caller-supplied `now`; the result is snapshotted into a booking at seat
//! selection and never recomputed for that booking.

use chrono::{DateTime, Utc};
use serde::Serialize;
use skyfare_core::Flight;

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Scarcity multiplier from remaining availability.
///
/// >80% available -> 1.0, >50% -> 1.2, >20% -> 1.5, otherwise 2.0.
/// A zero-capacity flight prices at base.
pub fn seat_factor(flight: &Flight) -> f64 {
    if flight.total_seats == 0 {
        return 1.0;
    }
    let availability_pct = flight.available_seats as f64 / flight.total_seats as f64 * 100.0;

    if availability_pct > 80.0 {
        1.0
    } else if availability_pct > 50.0 {
        1.2
    } else if availability_pct > 20.0 {
        1.5
    } else {
        2.0
    }
}

/// Urgency multiplier from time to departure.
///
/// >7 days out -> 1.0, 3-7 days -> 1.2, 1-3 days -> 1.3, same day -> 1.5.
/// An already-departed flight falls through to 1.0; booking rejects those
/// flights before pricing ever matters.
pub fn time_factor(flight: &Flight, now: DateTime<Utc>) -> f64 {
    let until_departure = flight.departure_time - now;
    let days = until_departure.num_days();
    let hours = until_departure.num_seconds() as f64 / 3600.0;

    if days > 7 {
        1.0
    } else if days >= 3 {
        1.2
    } else if days >= 1 {
        1.3
    } else if hours > 0.0 {
        1.5
    } else {
        1.0
    }
}

/// Current fare for a flight.
pub fn quote(flight: &Flight, now: DateTime<Utc>) -> f64 {
    round2(flight.base_price * seat_factor(flight) * time_factor(flight, now) * flight.demand_factor)
}

/// Every input to the fare calculation, for transparency endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct PriceBreakdown {
    pub base_price: f64,
    pub seat_factor: f64,
    pub time_factor: f64,
    pub demand_factor: f64,
    pub final_price: f64,
    pub available_seats: i64,
    pub total_seats: i64,
    pub availability_pct: f64,
    pub departure_time: DateTime<Utc>,
}

pub fn breakdown(flight: &Flight, now: DateTime<Utc>) -> PriceBreakdown {
    let availability_pct = if flight.total_seats > 0 {
        (flight.available_seats as f64 / flight.total_seats as f64 * 1000.0).round() / 10.0
    } else {
        0.0
    };

    PriceBreakdown {
        base_price: flight.base_price,
        seat_factor: seat_factor(flight),
        time_factor: time_factor(flight, now),
        demand_factor: flight.demand_factor,
        final_price: quote(flight, now),
        available_seats: flight.available_seats,
        total_seats: flight.total_seats,
        availability_pct,
        departure_time: flight.departure_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn flight(available: i64, total: i64, departs_in: Duration, demand: f64) -> Flight {
        let now = fixed_now();
        Flight {
            id: Uuid::new_v4(),
            flight_number: "SF101".to_string(),
            airline: "Skyfare".to_string(),
            source: "Lisbon".to_string(),
            destination: "Vienna".to_string(),
            departure_time: now + departs_in,
            arrival_time: now + departs_in + Duration::hours(3),
            base_price: 1000.0,
            total_seats: total,
            available_seats: available,
            demand_factor: demand,
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn seat_factor_tiers() {
        assert_eq!(seat_factor(&flight(90, 100, Duration::days(30), 1.0)), 1.0);
        assert_eq!(seat_factor(&flight(80, 100, Duration::days(30), 1.0)), 1.2);
        assert_eq!(seat_factor(&flight(51, 100, Duration::days(30), 1.0)), 1.2);
        assert_eq!(seat_factor(&flight(50, 100, Duration::days(30), 1.0)), 1.5);
        assert_eq!(seat_factor(&flight(21, 100, Duration::days(30), 1.0)), 1.5);
        assert_eq!(seat_factor(&flight(20, 100, Duration::days(30), 1.0)), 2.0);
        assert_eq!(seat_factor(&flight(0, 100, Duration::days(30), 1.0)), 2.0);
    }

    #[test]
    fn zero_capacity_prices_at_base() {
        assert_eq!(seat_factor(&flight(0, 0, Duration::days(30), 1.0)), 1.0);
    }

    #[test]
    fn time_factor_tiers() {
        let now = fixed_now();
        let at = |d: Duration| time_factor(&flight(100, 100, d, 1.0), now);

        assert_eq!(at(Duration::days(30)), 1.0);
        assert_eq!(at(Duration::days(8)), 1.0);
        assert_eq!(at(Duration::days(7)), 1.2);
        assert_eq!(at(Duration::days(3)), 1.2);
        assert_eq!(at(Duration::hours(71)), 1.3);
        assert_eq!(at(Duration::days(1)), 1.3);
        assert_eq!(at(Duration::hours(12)), 1.5);
        assert_eq!(at(Duration::minutes(30)), 1.5);
        // Degenerate: already departed. Kept at 1.0 for compatibility;
        // seat selection rejects departed flights before pricing runs.
        assert_eq!(at(Duration::zero()), 1.0);
        assert_eq!(at(Duration::hours(-5)), 1.0);
    }

    #[test]
    fn quote_multiplies_all_factors() {
        // 10% availability (2.0), 12h out (1.5), demand 1.0 -> 3000.00
        let f = flight(10, 100, Duration::hours(12), 1.0);
        assert_eq!(quote(&f, fixed_now()), 3000.0);

        // Demand drift scales linearly.
        let f = flight(10, 100, Duration::hours(12), 1.25);
        assert_eq!(quote(&f, fixed_now()), 3750.0);
    }

    #[test]
    fn quote_rounds_to_cents() {
        let mut f = flight(90, 100, Duration::days(30), 1.13);
        f.base_price = 99.99;
        // 99.99 * 1.0 * 1.0 * 1.13 = 112.9887
        assert_eq!(quote(&f, fixed_now()), 112.99);
    }

    #[test]
    fn breakdown_matches_quote() {
        let f = flight(10, 100, Duration::hours(12), 1.0);
        let b = breakdown(&f, fixed_now());
        assert_eq!(b.seat_factor, 2.0);
        assert_eq!(b.time_factor, 1.5);
        assert_eq!(b.final_price, quote(&f, fixed_now()));
        assert_eq!(b.availability_pct, 10.0);
    }
}
