pub mod booking;
pub mod clock;
pub mod fare;
pub mod flight;
pub mod payment;
pub mod seatmap;
pub mod user;

pub use booking::{Booking, BookingStatus};
pub use clock::{Clock, FixedClock, SystemClock};
pub use fare::FareSnapshot;
pub use flight::Flight;
pub use payment::{CardDetails, PaymentGateway, PaymentOutcome, SimulatedGateway};
pub use user::User;
