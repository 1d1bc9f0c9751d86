use std::sync::Arc;

use skyfare_booking::{BookingService, DemandSimulator};
use skyfare_core::Clock;
use skyfare_store::DbClient;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub db: DbClient,
    pub bookings: Arc<BookingService>,
    pub simulator: Arc<DemandSimulator>,
    pub clock: Arc<dyn Clock>,
    pub auth: AuthConfig,
    pub fare_history_limit: i64,
}
