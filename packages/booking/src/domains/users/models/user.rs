use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::UserId;

/// Platform role of a user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Patient,
    Doctor,
    Admin,
}

/// User - read model over the identity subsystem's record.
///
/// The engine never writes this table directly except for the `credits`
/// projection, which is mutated exclusively inside ledger appends. Identity,
/// verification and profile data live elsewhere.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub role: UserRole,
    pub display_name: String,
    pub active: bool,
    /// Cached projection of the user's ledger. Source of truth is the
    /// ledger_entries table; the two are updated in the same transaction.
    pub credits: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Find user by ID.
    pub async fn find_by_id(id: UserId, pool: &PgPool) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether this user is an active doctor able to publish slots and
    /// receive bookings.
    pub fn is_active_doctor(&self) -> bool {
        self.active && self.role == UserRole::Doctor
    }

    /// Whether this user is an active patient able to book appointments.
    pub fn is_active_patient(&self) -> bool {
        self.active && self.role == UserRole::Patient
    }
}
