use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domains::ledger::LedgerError;

/// Booking failures.
///
/// The first group are business-rule outcomes: expected results of
/// contention and normal flow, returned as values. `Storage` is the
/// retryable infrastructure failure; when it surfaces, no partial state was
/// committed.
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("slot is no longer available")]
    SlotUnavailable,

    #[error("insufficient credits to book this slot")]
    InsufficientFunds,

    #[error("appointment is already completed or cancelled")]
    AlreadyTerminal,

    #[error("appointment starts too soon to cancel")]
    TooLateToCancel,

    #[error("slot starts too soon to book (starts {start_time})")]
    TooSoon { start_time: DateTime<Utc> },

    #[error("price must be a positive number of credits")]
    InvalidPrice,

    #[error("caller may not act on this appointment")]
    Forbidden,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage unavailable: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<LedgerError> for BookingError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientFunds { .. } => BookingError::InsufficientFunds,
            LedgerError::UserNotFound(id) => BookingError::NotFound(format!("user {}", id)),
            LedgerError::Storage(e) => BookingError::Storage(e),
            other => BookingError::Internal(other.into()),
        }
    }
}
