// Ledger domain - append-only credit movements and the balance projection

pub mod activities;
pub mod errors;
pub mod models;

pub use errors::LedgerError;
