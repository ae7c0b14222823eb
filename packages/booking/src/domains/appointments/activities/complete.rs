//! Mark an appointment completed, making it payout-eligible.

use tracing::{debug, info};

use crate::common::AppointmentId;
use crate::domains::appointments::errors::BookingError;
use crate::domains::appointments::models::{Appointment, AppointmentStatus};
use crate::kernel::BookingKernel;

/// Complete a scheduled appointment.
///
/// Moves no money: completion only makes the appointment eligible for a
/// future payout calculation. Idempotent - completing an appointment that is
/// already completed is a no-op returning the current row. Completing a
/// cancelled appointment is `AlreadyTerminal`.
pub async fn complete(
    appointment_id: AppointmentId,
    kernel: &BookingKernel,
) -> Result<Appointment, BookingError> {
    let pool = kernel.db_pool();
    let mut conn = pool.acquire().await?;

    if let Some(completed) = Appointment::try_complete(&mut conn, appointment_id).await? {
        info!("Appointment {} completed", appointment_id);
        return Ok(completed);
    }

    // CAS missed: idempotent re-entry, terminal conflict, or unknown id.
    match Appointment::find_by_id(appointment_id, pool).await? {
        Some(appointment) if appointment.status == AppointmentStatus::Completed => {
            debug!("Appointment {} already completed, no-op", appointment_id);
            Ok(appointment)
        }
        Some(_) => Err(BookingError::AlreadyTerminal),
        None => Err(BookingError::NotFound(format!(
            "appointment {}",
            appointment_id
        ))),
    }
}
