//! Reservation coordinator - the single operation that turns "patient wants
//! slot X" into either a fully consistent booking or no effect at all.

use chrono::Utc;
use tracing::{debug, info};
use typed_builder::TypedBuilder;

use crate::common::{AppointmentId, SlotId, UserId};
use crate::domains::appointments::errors::BookingError;
use crate::domains::appointments::models::{Appointment, CreateAppointment};
use crate::domains::ledger::models::{AppendEntry, LedgerEntry, LedgerEntryKind};
use crate::domains::slots::models::{Slot, SlotStatus};
use crate::domains::users::models::User;
use crate::kernel::BookingKernel;

/// A booking request from the application layer.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ReserveRequest<'a> {
    pub patient_id: UserId,
    pub slot_id: SlotId,
    pub price_in_credits: i64,
    #[builder(default)]
    pub notes: Option<&'a str>,
}

/// Atomically reserve a slot for a patient.
///
/// The transaction orders the slot lock before the debit: a patient is never
/// charged for a slot a concurrent request already claimed, and an
/// insufficient-funds failure rolls the slot back to available. Under N
/// concurrent calls for one slot, the slot CAS linearizes them: exactly one
/// commits, the rest observe `SlotUnavailable` and leave no trace.
pub async fn reserve(
    request: ReserveRequest<'_>,
    kernel: &BookingKernel,
) -> Result<Appointment, BookingError> {
    let pool = kernel.db_pool();

    if request.price_in_credits <= 0 {
        return Err(BookingError::InvalidPrice);
    }

    let slot = Slot::find_by_id(request.slot_id, pool)
        .await?
        .ok_or_else(|| BookingError::NotFound(format!("slot {}", request.slot_id)))?;

    let doctor_ok = User::find_by_id(slot.doctor_id, pool)
        .await?
        .is_some_and(|u| u.is_active_doctor());
    if !doctor_ok {
        return Err(BookingError::NotFound(format!(
            "no active doctor for slot {}",
            slot.id
        )));
    }

    let patient_ok = User::find_by_id(request.patient_id, pool)
        .await?
        .is_some_and(|u| u.is_active_patient());
    if !patient_ok {
        return Err(BookingError::NotFound(format!(
            "patient {}",
            request.patient_id
        )));
    }

    let earliest = Utc::now() + kernel.config().min_lead_time();
    if slot.start_time < earliest {
        return Err(BookingError::TooSoon {
            start_time: slot.start_time,
        });
    }

    // One atomic unit of work: slot lock, debit, appointment row. Any
    // failure drops the transaction and rolls all three back.
    let mut tx = pool.begin().await?;

    let Some(slot) =
        Slot::try_transition(&mut *tx, slot.id, SlotStatus::Available, SlotStatus::Booked).await?
    else {
        debug!(
            "Reservation of slot {} for patient {} lost to a concurrent booking",
            request.slot_id, request.patient_id
        );
        return Err(BookingError::SlotUnavailable);
    };

    let appointment_id = AppointmentId::new();

    LedgerEntry::append(
        &mut *tx,
        AppendEntry::builder()
            .user_id(request.patient_id)
            .amount(-request.price_in_credits)
            .kind(LedgerEntryKind::Deduction)
            .appointment_id(Some(appointment_id))
            .build(),
    )
    .await?;

    let appointment = Appointment::create(
        &mut *tx,
        CreateAppointment::builder()
            .id(appointment_id)
            .patient_id(request.patient_id)
            .doctor_id(slot.doctor_id)
            .slot_id(slot.id)
            .start_time(slot.start_time)
            .end_time(slot.end_time)
            .price_in_credits(request.price_in_credits)
            .notes(request.notes)
            .build(),
    )
    .await?;

    tx.commit().await?;

    info!(
        "Patient {} booked slot {} with doctor {} for {} credits (appointment {})",
        appointment.patient_id,
        appointment.slot_id,
        appointment.doctor_id,
        appointment.price_in_credits,
        appointment.id
    );

    Ok(appointment)
}
