use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use tracing::debug;

use crate::common::{SlotId, UserId};
use crate::domains::slots::errors::SlotError;
use crate::domains::users::models::User;

/// Booking state of a slot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "slot_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Available,
    Booked,
    Blocked,
}

/// Slot - a doctor-published, bookable time interval.
///
/// The time range is half-open `[start_time, end_time)`. Per-doctor
/// non-overlap is a database exclusion constraint, checked at publish time;
/// status changes go exclusively through [`Slot::try_transition`].
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub id: SlotId,
    pub doctor_id: UserId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: SlotStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// SQLSTATE for an exclusion-constraint violation.
const EXCLUSION_VIOLATION: &str = "23P01";

fn is_exclusion_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(EXCLUSION_VIOLATION)
    )
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Slot {
    /// Publish a new availability slot.
    ///
    /// The overlap check is the `slots_no_overlap` exclusion constraint, so
    /// two concurrent publishes of intersecting ranges cannot both succeed;
    /// there is no read-then-write window. Touching half-open ranges
    /// (`[a, b)` then `[b, c)`) do not conflict.
    pub async fn publish(
        doctor_id: UserId,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Self, SlotError> {
        if end_time <= start_time {
            return Err(SlotError::InvalidRange);
        }

        let doctor = User::find_by_id(doctor_id, pool).await?;
        if !doctor.is_some_and(|u| u.is_active_doctor()) {
            return Err(SlotError::DoctorNotFound(doctor_id));
        }

        let result = sqlx::query_as::<_, Self>(
            "INSERT INTO slots (id, doctor_id, start_time, end_time, status)
             VALUES ($1, $2, $3, $4, 'available')
             RETURNING *",
        )
        .bind(SlotId::new())
        .bind(doctor_id)
        .bind(start_time)
        .bind(end_time)
        .fetch_one(pool)
        .await;

        match result {
            Ok(slot) => Ok(slot),
            Err(e) if is_exclusion_violation(&e) => Err(SlotError::OverlapConflict),
            Err(e) => Err(e.into()),
        }
    }

    /// Compare-and-swap status transition.
    ///
    /// Succeeds only if the slot's status equals `from` at the moment of the
    /// update; returns `None` when the compare fails (slot missing or in a
    /// different state). The conflict is a value, not an error, so callers
    /// decide between retry and fail. Runs on the caller's connection so the
    /// reservation coordinator can fold it into its transaction.
    pub async fn try_transition(
        conn: &mut PgConnection,
        slot_id: SlotId,
        from: SlotStatus,
        to: SlotStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let slot = sqlx::query_as::<_, Self>(
            "UPDATE slots
             SET status = $3, updated_at = now()
             WHERE id = $1 AND status = $2
             RETURNING *",
        )
        .bind(slot_id)
        .bind(from)
        .bind(to)
        .fetch_optional(&mut *conn)
        .await?;

        if slot.is_none() {
            debug!("Slot {} transition {:?} -> {:?} lost the race", slot_id, from, to);
        }

        Ok(slot)
    }

    /// Doctor-initiated hold on an available slot.
    ///
    /// `None` means the slot was no longer available (booked meanwhile, or
    /// already blocked).
    pub async fn block(slot_id: SlotId, pool: &PgPool) -> Result<Option<Self>, SlotError> {
        let mut conn = pool.acquire().await?;
        Self::try_transition(&mut conn, slot_id, SlotStatus::Available, SlotStatus::Blocked)
            .await
            .map_err(Into::into)
    }

    /// Release a doctor-initiated hold.
    pub async fn unblock(slot_id: SlotId, pool: &PgPool) -> Result<Option<Self>, SlotError> {
        let mut conn = pool.acquire().await?;
        Self::try_transition(&mut conn, slot_id, SlotStatus::Blocked, SlotStatus::Available)
            .await
            .map_err(Into::into)
    }

    /// Find slot by ID.
    pub async fn find_by_id(id: SlotId, pool: &PgPool) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM slots WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Upcoming bookable slots for a doctor, soonest first.
    pub async fn find_available_for_doctor(
        doctor_id: UserId,
        pool: &PgPool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM slots
             WHERE doctor_id = $1 AND status = 'available' AND start_time > now()
             ORDER BY start_time ASC",
        )
        .bind(doctor_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&SlotStatus::Booked).unwrap();
        assert_eq!(json, "\"booked\"");
    }
}
