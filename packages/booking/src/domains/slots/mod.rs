// Slots domain - doctor availability with a tri-state booking status

pub mod errors;
pub mod models;

pub use errors::SlotError;
