use thiserror::Error;

use crate::common::UserId;

/// Slot store failures.
#[derive(Error, Debug)]
pub enum SlotError {
    #[error("slot overlaps an existing slot for this doctor")]
    OverlapConflict,

    #[error("slot end time must be after its start time")]
    InvalidRange,

    #[error("no active doctor with id {0}")]
    DoctorNotFound(UserId),

    #[error("storage unavailable: {0}")]
    Storage(#[from] sqlx::Error),
}
