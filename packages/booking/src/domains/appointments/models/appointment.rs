use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use typed_builder::TypedBuilder;

use crate::common::{AppointmentId, PayoutRequestId, SlotId, UserId};

/// Lifecycle state of an appointment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "appointment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

/// Appointment - a patient's claim on a doctor's slot, paid in credits.
///
/// Created only by the reservation coordinator, in the same transaction as
/// the slot transition and the ledger deduction. Status moves through
/// scheduled -> completed | cancelled, both terminal, via compare-and-swap
/// updates so concurrent lifecycle calls cannot double-fire side effects.
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub patient_id: UserId,
    pub doctor_id: UserId,
    pub slot_id: SlotId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub price_in_credits: i64,
    /// Free-form details the patient attached when booking.
    pub notes: Option<String>,
    /// Set once a payout request has claimed this appointment's credits.
    pub payout_request_id: Option<PayoutRequestId>,
    pub cancel_reason: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for creating an appointment row.
#[derive(Debug, Clone, TypedBuilder)]
pub struct CreateAppointment<'a> {
    pub id: AppointmentId,
    pub patient_id: UserId,
    pub doctor_id: UserId,
    pub slot_id: SlotId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub price_in_credits: i64,
    #[builder(default)]
    pub notes: Option<&'a str>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Appointment {
    /// Insert a new scheduled appointment (coordinator-only, inside its
    /// transaction).
    pub async fn create(
        conn: &mut PgConnection,
        params: CreateAppointment<'_>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO appointments
                 (id, patient_id, doctor_id, slot_id, start_time, end_time, price_in_credits, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(params.id)
        .bind(params.patient_id)
        .bind(params.doctor_id)
        .bind(params.slot_id)
        .bind(params.start_time)
        .bind(params.end_time)
        .bind(params.price_in_credits)
        .bind(params.notes)
        .fetch_one(&mut *conn)
        .await
    }

    /// Find appointment by ID.
    pub async fn find_by_id(
        id: AppointmentId,
        pool: &PgPool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM appointments WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// CAS scheduled -> completed. `None` if the appointment is not
    /// currently scheduled.
    pub async fn try_complete(
        conn: &mut PgConnection,
        id: AppointmentId,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "UPDATE appointments
             SET status = 'completed', completed_at = now(), updated_at = now()
             WHERE id = $1 AND status = 'scheduled'
             RETURNING *",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
    }

    /// CAS scheduled -> cancelled. `None` if the appointment is not
    /// currently scheduled.
    pub async fn try_cancel(
        conn: &mut PgConnection,
        id: AppointmentId,
        reason: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "UPDATE appointments
             SET status = 'cancelled', cancel_reason = $2, cancelled_at = now(), updated_at = now()
             WHERE id = $1 AND status = 'scheduled'
             RETURNING *",
        )
        .bind(id)
        .bind(reason)
        .fetch_optional(&mut *conn)
        .await
    }

    /// A patient's appointments, newest first.
    pub async fn find_for_patient(
        patient_id: UserId,
        pool: &PgPool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM appointments WHERE patient_id = $1 ORDER BY start_time DESC",
        )
        .bind(patient_id)
        .fetch_all(pool)
        .await
    }

    /// A doctor's appointments, newest first.
    pub async fn find_for_doctor(
        doctor_id: UserId,
        pool: &PgPool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM appointments WHERE doctor_id = $1 ORDER BY start_time DESC",
        )
        .bind(doctor_id)
        .fetch_all(pool)
        .await
    }

    /// Lock a doctor's completed, unclaimed appointments for payout.
    ///
    /// `FOR UPDATE` holds the rows until the caller's transaction commits,
    /// so a concurrent payout request blocks here and then sees the rows as
    /// claimed.
    pub async fn lock_unclaimed_completed(
        conn: &mut PgConnection,
        doctor_id: UserId,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM appointments
             WHERE doctor_id = $1 AND status = 'completed' AND payout_request_id IS NULL
             ORDER BY id ASC
             FOR UPDATE",
        )
        .bind(doctor_id)
        .fetch_all(&mut *conn)
        .await
    }

    /// Stamp the payout request onto the claimed appointments.
    ///
    /// Returns the number of rows claimed; the NULL guard keeps an already
    /// claimed row from being claimed twice even outside the locking path.
    pub async fn claim_for_payout(
        conn: &mut PgConnection,
        ids: &[AppointmentId],
        payout_request_id: PayoutRequestId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE appointments
             SET payout_request_id = $1, updated_at = now()
             WHERE id = ANY($2) AND payout_request_id IS NULL",
        )
        .bind(payout_request_id)
        .bind(ids)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// The live (scheduled or completed) appointment holding a slot, if any.
    pub async fn find_live_for_slot(
        slot_id: SlotId,
        pool: &PgPool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM appointments
             WHERE slot_id = $1 AND status IN ('scheduled', 'completed')",
        )
        .bind(slot_id)
        .fetch_optional(pool)
        .await
    }
}
