//! Typed ID definitions for all domain entities.
//!
//! One marker type and one alias per entity. The aliases are the primary API;
//! the markers exist only to make the `Id<T>` instantiations distinct types.

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for users (patients, doctors, admins).
pub struct User;

/// Marker type for doctor availability slots.
pub struct Slot;

/// Marker type for appointments.
pub struct Appointment;

/// Marker type for credit ledger entries.
pub struct LedgerEntry;

/// Marker type for doctor payout requests.
pub struct PayoutRequest;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

/// Typed ID for users.
pub type UserId = Id<User>;

/// Typed ID for availability slots.
pub type SlotId = Id<Slot>;

/// Typed ID for appointments.
pub type AppointmentId = Id<Appointment>;

/// Typed ID for ledger entries.
pub type LedgerEntryId = Id<LedgerEntry>;

/// Typed ID for payout requests.
pub type PayoutRequestId = Id<PayoutRequest>;
