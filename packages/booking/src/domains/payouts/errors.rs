use thiserror::Error;

use crate::common::{PayoutRequestId, UserId};

/// Payout failures.
#[derive(Error, Debug)]
pub enum PayoutError {
    #[error("doctor {0} has no completed, unclaimed appointments")]
    NoEligibleCredits(UserId),

    #[error("payout request not found: {0}")]
    NotFound(PayoutRequestId),

    #[error("storage unavailable: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
