//! Record a manual admin adjustment.

use tracing::info;

use crate::common::UserId;
use crate::domains::ledger::errors::LedgerError;
use crate::domains::ledger::models::{AppendEntry, LedgerEntry, LedgerEntryKind};
use crate::kernel::BookingKernel;

/// Apply a signed admin correction to a user's balance.
///
/// A negative adjustment may not drive the balance below zero; the append's
/// balance guard rejects it with `InsufficientFunds`.
pub async fn record_adjustment(
    user_id: UserId,
    amount: i64,
    kernel: &BookingKernel,
) -> Result<LedgerEntry, LedgerError> {
    let mut tx = kernel.db_pool().begin().await?;

    let entry = LedgerEntry::append(
        &mut *tx,
        AppendEntry::builder()
            .user_id(user_id)
            .amount(amount)
            .kind(LedgerEntryKind::Adjustment)
            .build(),
    )
    .await?;

    tx.commit().await?;

    info!("Recorded adjustment of {} credits for user {}", amount, user_id);

    Ok(entry)
}
