// Appointments domain - the reservation coordinator and lifecycle manager

pub mod activities;
pub mod errors;
pub mod models;

pub use errors::BookingError;
