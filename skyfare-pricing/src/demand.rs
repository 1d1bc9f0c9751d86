//! Demand-factor perturbation math, kept pure so the background worker and
//! tests share one implementation. The worker draws an adjustment per
//! flight, applies it and persists only material changes.

use rand::Rng;
use skyfare_core::flight::{DEMAND_FACTOR_MAX, DEMAND_FACTOR_MIN};

use crate::round2;

/// Changes at or below this magnitude are dropped rather than persisted.
pub const CHANGE_THRESHOLD: f64 = 0.01;

/// Draw a random demand adjustment for a flight `hours_until_departure`
/// away. Imminent departures trend upward; far-out flights just wander.
pub fn draw_adjustment<R: Rng + ?Sized>(rng: &mut R, hours_until_departure: f64) -> f64 {
    if hours_until_departure < 24.0 {
        rng.gen_range(0.05..0.15)
    } else if hours_until_departure < 72.0 {
        rng.gen_range(-0.05..0.10)
    } else {
        rng.gen_range(-0.10..0.10)
    }
}

/// Apply an adjustment: clamp into [0.8, 1.5] and round to 2 decimals.
pub fn next_factor(current: f64, adjustment: f64) -> f64 {
    round2((current + adjustment).clamp(DEMAND_FACTOR_MIN, DEMAND_FACTOR_MAX))
}

/// Whether a factor change is big enough to persist and snapshot.
pub fn is_material(current: f64, next: f64) -> bool {
    (next - current).abs() > CHANGE_THRESHOLD
}
