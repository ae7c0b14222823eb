//! Integration tests for the reservation coordinator: the booking contract
//! and its atomicity under contention.

mod common;

use crate::common::{create_test_doctor, create_test_patient, publish_slot_in, TestHarness};
use booking_core::common::SlotId;
use booking_core::domains::appointments::activities::{reserve, ReserveRequest};
use booking_core::domains::appointments::models::{Appointment, AppointmentStatus};
use booking_core::domains::appointments::BookingError;
use booking_core::domains::ledger::models::{LedgerEntry, LedgerEntryKind};
use booking_core::domains::slots::models::{Slot, SlotStatus};
use futures::future::join_all;
use test_context::test_context;

#[test_context(TestHarness)]
#[tokio::test]
async fn reserve_books_slot_debits_patient_and_schedules(ctx: &TestHarness) {
    let doctor = create_test_doctor(&ctx.kernel).await.unwrap();
    let patient = create_test_patient(&ctx.kernel, 100).await.unwrap();
    let slot_id = publish_slot_in(&ctx.kernel, doctor, 48).await.unwrap();

    let appointment = reserve(
        ReserveRequest::builder()
            .patient_id(patient)
            .slot_id(slot_id)
            .price_in_credits(20)
            .notes(Some("first visit"))
            .build(),
        &ctx.kernel,
    )
    .await
    .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
    assert_eq!(appointment.price_in_credits, 20);
    assert_eq!(appointment.doctor_id, doctor);
    assert_eq!(appointment.notes.as_deref(), Some("first visit"));

    // Slot is booked, patient debited, deduction recorded.
    let slot = Slot::find_by_id(slot_id, &ctx.db_pool).await.unwrap().unwrap();
    assert_eq!(slot.status, SlotStatus::Booked);

    let balance = LedgerEntry::balance_of(patient, &ctx.db_pool).await.unwrap();
    assert_eq!(balance, 80);

    let entries = LedgerEntry::find_for_appointment(appointment.id, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].amount, -20);
    assert_eq!(entries[0].kind, LedgerEntryKind::Deduction);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn insufficient_funds_rolls_everything_back(ctx: &TestHarness) {
    let doctor = create_test_doctor(&ctx.kernel).await.unwrap();
    let patient = create_test_patient(&ctx.kernel, 10).await.unwrap();
    let slot_id = publish_slot_in(&ctx.kernel, doctor, 48).await.unwrap();

    let err = reserve(
        ReserveRequest::builder()
            .patient_id(patient)
            .slot_id(slot_id)
            .price_in_credits(20)
            .build(),
        &ctx.kernel,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, BookingError::InsufficientFunds));

    // The slot lock from step (a) was rolled back with the rest.
    let slot = Slot::find_by_id(slot_id, &ctx.db_pool).await.unwrap().unwrap();
    assert_eq!(slot.status, SlotStatus::Available);

    let balance = LedgerEntry::balance_of(patient, &ctx.db_pool).await.unwrap();
    assert_eq!(balance, 10);

    let live = Appointment::find_live_for_slot(slot_id, &ctx.db_pool)
        .await
        .unwrap();
    assert!(live.is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn booked_slot_is_unavailable(ctx: &TestHarness) {
    let doctor = create_test_doctor(&ctx.kernel).await.unwrap();
    let winner = create_test_patient(&ctx.kernel, 100).await.unwrap();
    let loser = create_test_patient(&ctx.kernel, 100).await.unwrap();
    let slot_id = publish_slot_in(&ctx.kernel, doctor, 48).await.unwrap();

    reserve(
        ReserveRequest::builder()
            .patient_id(winner)
            .slot_id(slot_id)
            .price_in_credits(20)
            .build(),
        &ctx.kernel,
    )
    .await
    .unwrap();

    let err = reserve(
        ReserveRequest::builder()
            .patient_id(loser)
            .slot_id(slot_id)
            .price_in_credits(20)
            .build(),
        &ctx.kernel,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, BookingError::SlotUnavailable));

    // The loser was not charged.
    let balance = LedgerEntry::balance_of(loser, &ctx.db_pool).await.unwrap();
    assert_eq!(balance, 100);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn slot_inside_lead_time_is_too_soon(ctx: &TestHarness) {
    let doctor = create_test_doctor(&ctx.kernel).await.unwrap();
    let patient = create_test_patient(&ctx.kernel, 100).await.unwrap();
    // Starts immediately; lead time is 60 minutes.
    let slot_id = publish_slot_in(&ctx.kernel, doctor, 0).await.unwrap();

    let err = reserve(
        ReserveRequest::builder()
            .patient_id(patient)
            .slot_id(slot_id)
            .price_in_credits(20)
            .build(),
        &ctx.kernel,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, BookingError::TooSoon { .. }));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn unknown_slot_is_not_found(ctx: &TestHarness) {
    let patient = create_test_patient(&ctx.kernel, 100).await.unwrap();

    let err = reserve(
        ReserveRequest::builder()
            .patient_id(patient)
            .slot_id(SlotId::new())
            .price_in_credits(20)
            .build(),
        &ctx.kernel,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, BookingError::NotFound(_)));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn non_positive_price_is_rejected(ctx: &TestHarness) {
    let doctor = create_test_doctor(&ctx.kernel).await.unwrap();
    let patient = create_test_patient(&ctx.kernel, 100).await.unwrap();
    let slot_id = publish_slot_in(&ctx.kernel, doctor, 48).await.unwrap();

    let err = reserve(
        ReserveRequest::builder()
            .patient_id(patient)
            .slot_id(slot_id)
            .price_in_credits(0)
            .build(),
        &ctx.kernel,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, BookingError::InvalidPrice));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn concurrent_reserves_have_exactly_one_winner(ctx: &TestHarness) {
    let doctor = create_test_doctor(&ctx.kernel).await.unwrap();
    let slot_id = publish_slot_in(&ctx.kernel, doctor, 48).await.unwrap();

    let mut patients = Vec::new();
    for _ in 0..6 {
        patients.push(create_test_patient(&ctx.kernel, 100).await.unwrap());
    }

    let attempts = patients.iter().map(|&patient| {
        let kernel = &ctx.kernel;
        async move {
            reserve(
                ReserveRequest::builder()
                    .patient_id(patient)
                    .slot_id(slot_id)
                    .price_in_credits(20)
                    .build(),
                kernel,
            )
            .await
        }
    });

    let results = join_all(attempts).await;

    let mut winners = 0;
    let mut conflicts = 0;
    for result in &results {
        match result {
            Ok(_) => winners += 1,
            Err(BookingError::SlotUnavailable) => conflicts += 1,
            Err(other) => panic!("unexpected booking error: {other}"),
        }
    }
    assert_eq!(winners, 1);
    assert_eq!(conflicts, 5);

    // Only the winner was debited; everyone else still holds 100.
    let mut debited = 0;
    for &patient in &patients {
        let balance = LedgerEntry::balance_of(patient, &ctx.db_pool).await.unwrap();
        match balance {
            80 => debited += 1,
            100 => {}
            other => panic!("unexpected balance {other}"),
        }
    }
    assert_eq!(debited, 1);

    // And exactly one live appointment holds the slot.
    let live = Appointment::find_live_for_slot(slot_id, &ctx.db_pool)
        .await
        .unwrap();
    assert!(live.is_some());
}
