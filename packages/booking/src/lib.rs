// Telehealth Appointments Platform - Booking Core
//
// This crate is the slot reservation and credit ledger engine: doctor
// availability, atomic slot booking against a prepaid credit balance, the
// append-only ledger behind every balance, and doctor payout calculation.
// The HTTP/API layer consuming it lives elsewhere.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
pub use kernel::BookingKernel;
