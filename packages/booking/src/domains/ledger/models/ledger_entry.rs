use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use typed_builder::TypedBuilder;

use crate::common::{AppointmentId, LedgerEntryId, Page, PageArgs, UserId};
use crate::domains::ledger::errors::LedgerError;

/// Kind of credit movement a ledger entry records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "ledger_entry_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LedgerEntryKind {
    /// Confirmed credit purchase (top-up).
    Purchase,
    /// Debit for a reserved appointment.
    Deduction,
    /// Compensating credit for a cancelled appointment.
    Refund,
    /// Manual admin correction.
    Adjustment,
}

/// LedgerEntry - one immutable credit movement.
///
/// Rows are created exactly once per credit-affecting event and never
/// mutated or deleted; no update path exists in this crate. A user's
/// `credits` column is a cached projection of these rows, updated in the
/// same transaction as every append.
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub user_id: UserId,
    /// Signed credit delta: positive for purchase/refund, negative for
    /// deduction.
    pub amount: i64,
    pub kind: LedgerEntryKind,
    /// Set on deduction and refund entries.
    pub appointment_id: Option<AppointmentId>,
    /// External payment gateway reference, set on purchase entries.
    pub payment_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Parameters for appending one ledger entry.
#[derive(Debug, Clone, TypedBuilder)]
pub struct AppendEntry<'a> {
    pub user_id: UserId,
    pub amount: i64,
    pub kind: LedgerEntryKind,
    #[builder(default)]
    pub appointment_id: Option<AppointmentId>,
    #[builder(default)]
    pub payment_ref: Option<&'a str>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl LedgerEntry {
    /// Append one entry and update the balance projection atomically.
    ///
    /// Runs on the caller's connection so it composes into a larger
    /// transaction (the reservation coordinator depends on this). The
    /// balance guard and the projection update are a single conditional
    /// UPDATE: a debit that would drive the balance negative matches no row
    /// and nothing is written, which is what makes the check race-free
    /// against concurrent appends for the same user.
    pub async fn append(
        conn: &mut PgConnection,
        entry: AppendEntry<'_>,
    ) -> Result<Self, LedgerError> {
        if entry.amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let updated = sqlx::query_scalar::<_, i64>(
            "UPDATE users
             SET credits = credits + $2, updated_at = now()
             WHERE id = $1 AND credits + $2 >= 0
             RETURNING credits",
        )
        .bind(entry.user_id)
        .bind(entry.amount)
        .fetch_optional(&mut *conn)
        .await?;

        if updated.is_none() {
            // Guard failed: distinguish unknown user from insufficient funds.
            let available = sqlx::query_scalar::<_, i64>("SELECT credits FROM users WHERE id = $1")
                .bind(entry.user_id)
                .fetch_optional(&mut *conn)
                .await?;

            return Err(match available {
                Some(available) => LedgerError::InsufficientFunds {
                    user_id: entry.user_id,
                    available,
                    requested: -entry.amount,
                },
                None => LedgerError::UserNotFound(entry.user_id),
            });
        }

        sqlx::query_as::<_, Self>(
            "INSERT INTO ledger_entries (id, user_id, amount, kind, appointment_id, payment_ref)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(LedgerEntryId::new())
        .bind(entry.user_id)
        .bind(entry.amount)
        .bind(entry.kind)
        .bind(entry.appointment_id)
        .bind(entry.payment_ref)
        .fetch_one(&mut *conn)
        .await
        .map_err(Into::into)
    }

    /// Current balance: the cached projection on the user row.
    pub async fn balance_of(user_id: UserId, pool: &PgPool) -> Result<i64, LedgerError> {
        sqlx::query_scalar::<_, i64>("SELECT credits FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?
            .ok_or(LedgerError::UserNotFound(user_id))
    }

    /// Signed sum of all entries for a user, straight from the log.
    ///
    /// Reconciliation hook: must always equal `balance_of`.
    pub async fn audit_sum_of(user_id: UserId, pool: &PgPool) -> Result<i64, LedgerError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(amount), 0)::bigint FROM ledger_entries WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Insertion-ordered history for a user, cursor-paginated.
    pub async fn history_of(
        user_id: UserId,
        args: &PageArgs,
        pool: &PgPool,
    ) -> Result<Page<Self>, LedgerError> {
        let limit = args.limit();
        let after = args.after_id().map_err(LedgerError::InvalidCursor)?;

        // Overfetch by one to learn whether another page exists.
        let rows = sqlx::query_as::<_, Self>(
            "SELECT * FROM ledger_entries
             WHERE user_id = $1 AND ($2::uuid IS NULL OR id > $2)
             ORDER BY id ASC
             LIMIT $3",
        )
        .bind(user_id)
        .bind(after)
        .bind(limit + 1)
        .fetch_all(pool)
        .await?;

        Ok(Page::from_rows(rows, limit, |entry| entry.id.into_uuid()))
    }

    /// Entries attached to one appointment (deduction, then refund if any).
    pub async fn find_for_appointment(
        appointment_id: AppointmentId,
        pool: &PgPool,
    ) -> Result<Vec<Self>, LedgerError> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM ledger_entries WHERE appointment_id = $1 ORDER BY id ASC",
        )
        .bind(appointment_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
