//! Test fixtures for creating test data.
//!
//! Users are seeded with a raw insert (identity is an external subsystem),
//! but balances always go through the ledger so the balance-equals-sum
//! invariant holds from the first row.

use anyhow::Result;
use booking_core::common::{SlotId, UserId};
use booking_core::domains::ledger::activities::record_purchase;
use booking_core::domains::slots::models::Slot;
use booking_core::BookingKernel;
use chrono::{Duration, Utc};
use sqlx::PgPool;

async fn insert_user(pool: &PgPool, role: &str, name: &str) -> Result<UserId> {
    let id = UserId::new();
    sqlx::query(
        "INSERT INTO users (id, role, display_name, active)
         VALUES ($1, $2::user_role, $3, true)",
    )
    .bind(id)
    .bind(role)
    .bind(name)
    .execute(pool)
    .await?;
    Ok(id)
}

/// Create a patient and top up their balance through the ledger.
pub async fn create_test_patient(kernel: &BookingKernel, credits: i64) -> Result<UserId> {
    let id = insert_user(kernel.db_pool(), "patient", "Test Patient").await?;
    if credits > 0 {
        record_purchase(id, credits, "test-topup", kernel).await?;
    }
    Ok(id)
}

/// Create an active doctor.
pub async fn create_test_doctor(kernel: &BookingKernel) -> Result<UserId> {
    insert_user(kernel.db_pool(), "doctor", "Test Doctor").await
}

/// Create an admin.
pub async fn create_test_admin(kernel: &BookingKernel) -> Result<UserId> {
    insert_user(kernel.db_pool(), "admin", "Test Admin").await
}

/// Publish a 30-minute slot starting `hours_from_now` hours in the future.
pub async fn publish_slot_in(
    kernel: &BookingKernel,
    doctor_id: UserId,
    hours_from_now: i64,
) -> Result<SlotId> {
    let start = Utc::now() + Duration::hours(hours_from_now);
    let slot = Slot::publish(doctor_id, start, start + Duration::minutes(30), kernel.db_pool())
        .await?;
    Ok(slot.id)
}
