//! Record a confirmed credit purchase.
//!
//! The payment gateway conversation happens elsewhere; by the time this runs
//! the money has cleared and the only job is the ledger append.

use tracing::info;

use crate::common::UserId;
use crate::domains::ledger::errors::LedgerError;
use crate::domains::ledger::models::{AppendEntry, LedgerEntry, LedgerEntryKind};
use crate::kernel::BookingKernel;

/// Credit a user's balance for a confirmed purchase.
pub async fn record_purchase(
    user_id: UserId,
    credits: i64,
    payment_ref: &str,
    kernel: &BookingKernel,
) -> Result<LedgerEntry, LedgerError> {
    if credits <= 0 {
        return Err(LedgerError::InvalidAmount);
    }

    let mut tx = kernel.db_pool().begin().await?;

    let entry = LedgerEntry::append(
        &mut *tx,
        AppendEntry::builder()
            .user_id(user_id)
            .amount(credits)
            .kind(LedgerEntryKind::Purchase)
            .payment_ref(Some(payment_ref))
            .build(),
    )
    .await?;

    tx.commit().await?;

    info!(
        "Recorded purchase of {} credits for user {} (ref {})",
        credits, user_id, payment_ref
    );

    Ok(entry)
}
