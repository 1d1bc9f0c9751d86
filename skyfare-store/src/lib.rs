pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod fare_repo;
pub mod flight_repo;
pub mod user_repo;

pub use booking_repo::BookingRepo;
pub use database::{is_unique_violation, DbClient};
pub use fare_repo::FareHistoryRepo;
pub use flight_repo::{FlightRepo, FlightSearch};
pub use user_repo::UserRepo;
