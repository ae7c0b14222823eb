// Common types and utilities shared across the domains

pub mod entity_ids;
pub mod id;
pub mod pagination;

pub use entity_ids::*;
pub use id::Id;
pub use pagination::{Cursor, Page, PageArgs};
