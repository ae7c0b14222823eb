use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{PayoutRequestId, UserId};
use crate::domains::payouts::errors::PayoutError;

/// Processing state of a payout request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "payout_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    Processing,
    Processed,
}

/// PayoutRequest - a doctor's claim on the currency value of their
/// completed, unclaimed appointment credits.
///
/// The fee arithmetic is stored alongside the claim so the payout remains
/// auditable after the fee percentage changes.
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct PayoutRequest {
    pub id: PayoutRequestId,
    pub doctor_id: UserId,
    /// Total credits across the claimed appointments.
    pub credits_claimed: i64,
    /// Gross currency value of the claimed credits.
    pub amount: Decimal,
    pub platform_fee: Decimal,
    pub net_amount: Decimal,
    pub status: PayoutStatus,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl PayoutRequest {
    /// Insert a new payout request (inside the calculator's transaction).
    pub async fn create(
        conn: &mut PgConnection,
        doctor_id: UserId,
        credits_claimed: i64,
        amount: Decimal,
        platform_fee: Decimal,
        net_amount: Decimal,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO payout_requests
                 (id, doctor_id, credits_claimed, amount, platform_fee, net_amount)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(PayoutRequestId::new())
        .bind(doctor_id)
        .bind(credits_claimed)
        .bind(amount)
        .bind(platform_fee)
        .bind(net_amount)
        .fetch_one(&mut *conn)
        .await
    }

    /// Find payout request by ID.
    pub async fn find_by_id(
        id: PayoutRequestId,
        pool: &PgPool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM payout_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// A doctor's payout requests, newest first.
    pub async fn find_for_doctor(
        doctor_id: UserId,
        pool: &PgPool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM payout_requests WHERE doctor_id = $1 ORDER BY id DESC",
        )
        .bind(doctor_id)
        .fetch_all(pool)
        .await
    }

    /// Admin-side settlement: flip processing -> processed.
    ///
    /// Plain status bookkeeping - the claimed appointments were already
    /// stamped when the request was created, so there is nothing further to
    /// coordinate.
    pub async fn mark_processed(id: PayoutRequestId, pool: &PgPool) -> Result<Self, PayoutError> {
        sqlx::query_as::<_, Self>(
            "UPDATE payout_requests
             SET status = 'processed', processed_at = now()
             WHERE id = $1 AND status = 'processing'
             RETURNING *",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(PayoutError::NotFound(id))
    }
}
