use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle of a booking.
///
/// PENDING -> INFO_ADDED -> CONFIRMED is the success path. PENDING and
/// INFO_ADDED can also move to CANCELLED (user action or superseded by a
/// newer selection) or FAILED (payment declined). CONFIRMED can still be
/// CANCELLED by the owner. CANCELLED and FAILED accept no transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    InfoAdded,
    Confirmed,
    Cancelled,
    Failed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::InfoAdded => "INFO_ADDED",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Failed => "FAILED",
        }
    }

    /// A seat-holding booking still occupies inventory on its flight.
    pub fn holds_seat(&self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::InfoAdded | BookingStatus::Confirmed
        )
    }

    /// Payment may only run while the booking is still in the funnel.
    pub fn is_payable(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::InfoAdded)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(BookingStatus::Pending),
            "INFO_ADDED" => Ok(BookingStatus::InfoAdded),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            "FAILED" => Ok(BookingStatus::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown booking status: {0}")]
pub struct UnknownStatus(pub String);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    /// 6-character alphanumeric confirmation code, issued once payment
    /// succeeds. Globally unique. The public lookup key.
    pub pnr: Option<String>,
    pub user_id: Uuid,
    pub flight_id: Uuid,
    pub seat_no: String,
    pub passenger_name: Option<String>,
    pub passenger_email: Option<String>,
    /// Price snapshot taken at seat selection. Never recomputed.
    pub final_price: f64,
    pub status: BookingStatus,
    /// Set when payment succeeds.
    pub booking_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::InfoAdded,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
            BookingStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
        }
        assert!("IN_FLIGHT".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn holding_states_match_the_funnel() {
        assert!(BookingStatus::Pending.holds_seat());
        assert!(BookingStatus::InfoAdded.holds_seat());
        assert!(BookingStatus::Confirmed.holds_seat());
        assert!(!BookingStatus::Cancelled.holds_seat());
        assert!(!BookingStatus::Failed.holds_seat());

        assert!(BookingStatus::Pending.is_payable());
        assert!(BookingStatus::InfoAdded.is_payable());
        assert!(!BookingStatus::Confirmed.is_payable());
    }
}
