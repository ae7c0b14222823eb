pub mod payout_request;

pub use payout_request::{PayoutRequest, PayoutStatus};
