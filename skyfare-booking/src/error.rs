use skyfare_core::BookingStatus;

/// Everything a booking transition can refuse with. All variants are
/// recoverable by the caller; only `Storage` and `PnrSpaceExhausted` are
/// server faults.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("flight not found")]
    FlightNotFound,

    #[error("booking not found")]
    BookingNotFound,

    #[error("cannot book a flight that has already departed")]
    FlightDeparted,

    #[error("no seats available on this flight")]
    NoSeatsAvailable,

    #[error("invalid seat number: {0}")]
    InvalidSeatNumber(String),

    #[error("seat {0} is already booked")]
    SeatAlreadyTaken(String),

    #[error("seat was just booked by another user, please select a different seat")]
    SeatConflict,

    #[error("invalid card details")]
    InvalidCardDetails,

    #[error("cannot {action}: booking status is {status}")]
    WrongState {
        action: &'static str,
        status: BookingStatus,
    },

    #[error("booking is already cancelled")]
    AlreadyCancelled,

    #[error("cannot cancel a failed booking")]
    CannotCancelFailed,

    #[error("could not allocate a unique confirmation code")]
    PnrSpaceExhausted,

    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

/// Coarse taxonomy the HTTP layer maps onto status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    Conflict,
    InvalidTransition,
    BusinessRule,
    Internal,
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::FlightNotFound | BookingError::BookingNotFound => ErrorKind::NotFound,
            BookingError::InvalidSeatNumber(_) | BookingError::InvalidCardDetails => {
                ErrorKind::InvalidInput
            }
            BookingError::SeatAlreadyTaken(_) | BookingError::SeatConflict => ErrorKind::Conflict,
            BookingError::WrongState { .. } => ErrorKind::InvalidTransition,
            BookingError::FlightDeparted
            | BookingError::NoSeatsAvailable
            | BookingError::AlreadyCancelled
            | BookingError::CannotCancelFailed => ErrorKind::BusinessRule,
            BookingError::PnrSpaceExhausted | BookingError::Storage(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_matches_contract() {
        assert_eq!(BookingError::FlightNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(
            BookingError::SeatAlreadyTaken("12A".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            BookingError::WrongState {
                action: "process payment",
                status: BookingStatus::Failed,
            }
            .kind(),
            ErrorKind::InvalidTransition
        );
        assert_eq!(BookingError::FlightDeparted.kind(), ErrorKind::BusinessRule);
        assert_eq!(
            BookingError::InvalidSeatNumber("zz".into()).kind(),
            ErrorKind::InvalidInput
        );
    }
}
