use thiserror::Error;

use crate::common::UserId;

/// Ledger failures.
///
/// `InsufficientFunds` is the only expected business failure; everything that
/// comes back from the store maps to `Storage`, after which the caller must
/// assume nothing was written.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("insufficient credits for user {user_id}: balance {available}, requested {requested}")]
    InsufficientFunds {
        user_id: UserId,
        available: i64,
        requested: i64,
    },

    #[error("user not found: {0}")]
    UserNotFound(UserId),

    #[error("ledger amounts must be non-zero")]
    InvalidAmount,

    #[error("invalid history cursor: {0}")]
    InvalidCursor(anyhow::Error),

    #[error("storage unavailable: {0}")]
    Storage(#[from] sqlx::Error),
}
