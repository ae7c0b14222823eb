//! Cancel a scheduled appointment: terminal status, slot re-published,
//! patient refunded, all in one unit of work.

use anyhow::anyhow;
use chrono::Utc;
use tracing::info;

use crate::common::{AppointmentId, UserId};
use crate::domains::appointments::errors::BookingError;
use crate::domains::appointments::models::{Appointment, AppointmentStatus};
use crate::domains::ledger::models::{AppendEntry, LedgerEntry, LedgerEntryKind};
use crate::domains::slots::models::{Slot, SlotStatus};
use crate::domains::users::models::{User, UserRole};
use crate::kernel::BookingKernel;

/// Cancel an appointment on behalf of `actor_id`.
///
/// Allowed for the appointment's patient, its doctor, or an admin, and only
/// while the start time is outside the configured cancellation window. The
/// refund entry exactly compensates the original deduction, so the patient's
/// balance returns to its pre-booking value and the ledger nets to zero for
/// this appointment.
pub async fn cancel(
    appointment_id: AppointmentId,
    actor_id: UserId,
    reason: Option<&str>,
    kernel: &BookingKernel,
) -> Result<Appointment, BookingError> {
    let pool = kernel.db_pool();

    let appointment = Appointment::find_by_id(appointment_id, pool)
        .await?
        .ok_or_else(|| BookingError::NotFound(format!("appointment {}", appointment_id)))?;

    if actor_id != appointment.patient_id && actor_id != appointment.doctor_id {
        let is_admin = User::find_by_id(actor_id, pool)
            .await?
            .is_some_and(|u| u.role == UserRole::Admin);
        if !is_admin {
            return Err(BookingError::Forbidden);
        }
    }

    if appointment.status != AppointmentStatus::Scheduled {
        return Err(BookingError::AlreadyTerminal);
    }

    if Utc::now() > appointment.start_time - kernel.config().cancellation_window() {
        return Err(BookingError::TooLateToCancel);
    }

    let mut tx = pool.begin().await?;

    // The appointment CAS is the linearization point; a concurrent complete
    // or cancel makes it miss and nothing below runs.
    let Some(cancelled) = Appointment::try_cancel(&mut *tx, appointment_id, reason).await? else {
        return Err(BookingError::AlreadyTerminal);
    };

    // A scheduled appointment always holds its slot in booked state.
    Slot::try_transition(
        &mut *tx,
        cancelled.slot_id,
        SlotStatus::Booked,
        SlotStatus::Available,
    )
    .await?
    .ok_or_else(|| {
        anyhow!(
            "slot {} not in booked state while cancelling appointment {}",
            cancelled.slot_id,
            appointment_id
        )
    })?;

    LedgerEntry::append(
        &mut *tx,
        AppendEntry::builder()
            .user_id(cancelled.patient_id)
            .amount(cancelled.price_in_credits)
            .kind(LedgerEntryKind::Refund)
            .appointment_id(Some(appointment_id))
            .build(),
    )
    .await?;

    tx.commit().await?;

    info!(
        "Appointment {} cancelled by {} ({} credits refunded to patient {})",
        appointment_id, actor_id, cancelled.price_in_credits, cancelled.patient_id
    );

    Ok(cancelled)
}
