use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const CARD_NUMBER_LENGTH: usize = 16;

/// Payment instrument as submitted by the caller. Validation is purely
/// structural; no real gateway is ever contacted.
#[derive(Debug, Clone, Deserialize)]
pub struct CardDetails {
    pub card_number: String,
    pub expiry_month: u32,
    pub expiry_year: i32,
    pub cvv: String,
}

impl CardDetails {
    /// Structural card check: 16 numeric digits, expiry not in the past
    /// relative to `now`'s year/month, CVV of 3 or 4 digits.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        if self.card_number.len() != CARD_NUMBER_LENGTH
            || !self.card_number.bytes().all(|b| b.is_ascii_digit())
        {
            return false;
        }
        if !(1..=12).contains(&self.expiry_month) {
            return false;
        }
        if self.expiry_year < now.year()
            || (self.expiry_year == now.year() && self.expiry_month < now.month())
        {
            return false;
        }
        matches!(self.cvv.len(), 3 | 4) && self.cvv.bytes().all(|b| b.is_ascii_digit())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentOutcome {
    Success,
    Failed,
}

/// Charging seam. The production implementation is simulated; tests pin the
/// outcome by constructing the gateway with probability 1.0 or 0.0.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, booking_id: Uuid, amount: f64) -> PaymentOutcome;
}

/// Gateway that approves with a fixed probability, independent per attempt.
pub struct SimulatedGateway {
    success_rate: f64,
}

impl SimulatedGateway {
    pub fn new(success_rate: f64) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
        }
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(&self, booking_id: Uuid, amount: f64) -> PaymentOutcome {
        let draw: f64 = rand::thread_rng().gen();
        let outcome = if draw < self.success_rate {
            PaymentOutcome::Success
        } else {
            PaymentOutcome::Failed
        };
        tracing::debug!(%booking_id, amount, ?outcome, "simulated charge");
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn card(number: &str, month: u32, year: i32, cvv: &str) -> CardDetails {
        CardDetails {
            card_number: number.to_string(),
            expiry_month: month,
            expiry_year: year,
            cvv: cvv.to_string(),
        }
    }

    fn june_2026() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn accepts_a_well_formed_card() {
        assert!(card("4111111111111111", 12, 2027, "123").is_valid(june_2026()));
        assert!(card("4111111111111111", 6, 2026, "1234").is_valid(june_2026()));
    }

    #[test]
    fn rejects_malformed_numbers() {
        assert!(!card("411111111111111", 12, 2027, "123").is_valid(june_2026()));
        assert!(!card("41111111111111112", 12, 2027, "123").is_valid(june_2026()));
        assert!(!card("4111-1111-1111-11", 12, 2027, "123").is_valid(june_2026()));
    }

    #[test]
    fn rejects_expired_cards() {
        assert!(!card("4111111111111111", 5, 2026, "123").is_valid(june_2026()));
        assert!(!card("4111111111111111", 12, 2025, "123").is_valid(june_2026()));
        assert!(!card("4111111111111111", 0, 2027, "123").is_valid(june_2026()));
        assert!(!card("4111111111111111", 13, 2027, "123").is_valid(june_2026()));
    }

    #[test]
    fn rejects_bad_cvv() {
        assert!(!card("4111111111111111", 12, 2027, "12").is_valid(june_2026()));
        assert!(!card("4111111111111111", 12, 2027, "12345").is_valid(june_2026()));
        assert!(!card("4111111111111111", 12, 2027, "12a").is_valid(june_2026()));
    }

    #[tokio::test]
    async fn pinned_probabilities_are_deterministic() {
        let approve = SimulatedGateway::new(1.0);
        let decline = SimulatedGateway::new(0.0);
        for _ in 0..20 {
            assert_eq!(
                approve.charge(Uuid::new_v4(), 100.0).await,
                PaymentOutcome::Success
            );
            assert_eq!(
                decline.charge(Uuid::new_v4(), 100.0).await,
                PaymentOutcome::Failed
            );
        }
    }
}
