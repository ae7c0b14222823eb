//! Payout calculator - convert a doctor's unclaimed completed appointments
//! into a payout request with deterministic fee computation.

use anyhow::anyhow;
use rust_decimal::Decimal;
use tracing::info;

use crate::common::{AppointmentId, UserId};
use crate::domains::appointments::models::Appointment;
use crate::domains::payouts::errors::PayoutError;
use crate::domains::payouts::models::PayoutRequest;
use crate::kernel::BookingKernel;

/// Request a payout over the doctor's current set of completed, unclaimed
/// appointments.
///
/// The snapshot is taken under row locks, and the claim stamps exactly the
/// locked rows, so two concurrent requests for the same doctor cannot claim
/// the same credits: the second blocks on the locks and then finds nothing
/// left to claim.
pub async fn request_payout(
    doctor_id: UserId,
    kernel: &BookingKernel,
) -> Result<PayoutRequest, PayoutError> {
    let config = kernel.config();
    let mut tx = kernel.db_pool().begin().await?;

    let eligible = Appointment::lock_unclaimed_completed(&mut *tx, doctor_id).await?;
    if eligible.is_empty() {
        return Err(PayoutError::NoEligibleCredits(doctor_id));
    }

    let credits_claimed: i64 = eligible.iter().map(|a| a.price_in_credits).sum();

    let amount = (Decimal::from(credits_claimed) * config.credit_unit_price).round_dp(2);
    let platform_fee = (amount * config.platform_fee_percent / Decimal::ONE_HUNDRED).round_dp(2);
    let net_amount = amount - platform_fee;

    let payout = PayoutRequest::create(
        &mut *tx,
        doctor_id,
        credits_claimed,
        amount,
        platform_fee,
        net_amount,
    )
    .await?;

    let ids: Vec<AppointmentId> = eligible.iter().map(|a| a.id).collect();
    let claimed = Appointment::claim_for_payout(&mut *tx, &ids, payout.id).await?;
    if claimed != ids.len() as u64 {
        // Unreachable while the snapshot holds its row locks.
        return Err(PayoutError::Internal(anyhow!(
            "claimed {} of {} appointments for payout {}",
            claimed,
            ids.len(),
            payout.id
        )));
    }

    tx.commit().await?;

    info!(
        "Doctor {} requested payout {}: {} credits over {} appointments, net {}",
        doctor_id,
        payout.id,
        credits_claimed,
        ids.len(),
        payout.net_amount
    );

    Ok(payout)
}
