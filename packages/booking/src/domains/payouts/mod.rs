// Payouts domain - doctor earnings claims over completed appointments

pub mod activities;
pub mod errors;
pub mod models;

pub use errors::PayoutError;
