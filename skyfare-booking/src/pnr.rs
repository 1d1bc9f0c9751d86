//! Confirmation-code (PNR) allocation.
//!
//! Codes are 6 characters drawn uniformly from A-Z0-9. Allocation runs
//! inside the transaction that confirms the booking: draw, check against
//! existing bookings, retry on collision up to a fixed bound. The unique
//! index on bookings.pnr is the final arbiter, so even a racing allocator
//! cannot commit a duplicate.

use rand::Rng;
use sqlx::sqlite::SqliteConnection;

use crate::error::BookingError;
use skyfare_store::BookingRepo;

pub const CODE_LENGTH: usize = 6;
pub const MAX_ATTEMPTS: u32 = 100;

const ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub fn random_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LENGTH)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Reserve a code that no existing booking carries. With 36^6 codes the
/// retry bound is unreachable in practice; hitting it is a server fault.
pub async fn allocate(conn: &mut SqliteConnection) -> Result<String, BookingError> {
    for _ in 0..MAX_ATTEMPTS {
        let code = random_code(&mut rand::thread_rng());
        if !BookingRepo::pnr_exists(conn, &code).await? {
            return Ok(code);
        }
    }
    Err(BookingError::PnrSpaceExhausted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn codes_are_six_chars_from_the_alphabet() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let code = random_code(&mut rng);
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
        }
    }

    #[test]
    fn collisions_are_rare() {
        let mut rng = StdRng::seed_from_u64(42);
        let codes: HashSet<String> = (0..10_000).map(|_| random_code(&mut rng)).collect();
        assert!(codes.len() > 9_950);
    }
}
