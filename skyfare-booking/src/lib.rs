pub mod demand_worker;
pub mod error;
pub mod pnr;
pub mod service;

pub use demand_worker::{DemandPassSummary, DemandSimulator, SimulatorHandle};
pub use error::{BookingError, ErrorKind};
pub use service::{BookingService, Cancellation, PaymentReceipt, REFUND_RATE};
