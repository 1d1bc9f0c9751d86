pub mod demand;
pub mod engine;

pub use engine::{breakdown, quote, round2, PriceBreakdown};
