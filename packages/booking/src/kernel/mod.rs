// BookingKernel - core infrastructure with all dependencies
//
// Activities receive the kernel instead of individual handles so the
// dependency set can grow without touching every call site.

use sqlx::PgPool;

use crate::config::BookingConfig;

/// BookingKernel holds the engine's dependencies: the transactional store
/// and the platform policy configuration.
#[derive(Clone)]
pub struct BookingKernel {
    db_pool: PgPool,
    config: BookingConfig,
}

impl BookingKernel {
    /// Creates a new BookingKernel with the given dependencies.
    pub fn new(db_pool: PgPool, config: BookingConfig) -> Self {
        Self { db_pool, config }
    }

    pub fn db_pool(&self) -> &PgPool {
        &self.db_pool
    }

    pub fn config(&self) -> &BookingConfig {
        &self.config
    }
}
