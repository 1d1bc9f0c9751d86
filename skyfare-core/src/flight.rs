use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lower bound for the per-flight demand multiplier.
pub const DEMAND_FACTOR_MIN: f64 = 0.8;
/// Upper bound for the per-flight demand multiplier.
pub const DEMAND_FACTOR_MAX: f64 = 1.5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub id: Uuid,
    pub flight_number: String,
    pub airline: String,
    pub source: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub base_price: f64,
    pub total_seats: i64,
    pub available_seats: i64,
    /// Demand multiplier in [DEMAND_FACTOR_MIN, DEMAND_FACTOR_MAX],
    /// adjusted by the background demand simulator.
    pub demand_factor: f64,
}

impl Flight {
    pub fn has_departed(&self, now: DateTime<Utc>) -> bool {
        self.departure_time <= now
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.arrival_time - self.departure_time).num_minutes()
    }
}
