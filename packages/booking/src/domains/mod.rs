// Domain modules, leaves first: users and ledger and slots are independent,
// appointments coordinates across them, payouts aggregates the results.

pub mod appointments;
pub mod ledger;
pub mod payouts;
pub mod slots;
pub mod users;
