use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only record of a flight's computed price and pricing context at a
/// point in time. Never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareSnapshot {
    pub id: i64,
    pub flight_id: Uuid,
    pub price: f64,
    pub demand_factor: f64,
    pub available_seats: i64,
    pub recorded_at: DateTime<Utc>,
}
