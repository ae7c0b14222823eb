pub mod cancel;
pub mod complete;
pub mod reserve;

pub use cancel::cancel;
pub use complete::complete;
pub use reserve::{reserve, ReserveRequest};
