//! Test harness with testcontainers for integration testing.
//!
//! The Postgres container and migrations are initialized once on the first
//! test and shared by the whole run; each test gets its own pool and kernel.
//! Tests create their own users and slots, so no cross-test cleanup is
//! needed.

use anyhow::{Context, Result};
use booking_core::{BookingConfig, BookingKernel};
use rust_decimal::Decimal;
use sqlx::PgPool;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared test infrastructure that persists across all tests.
struct SharedTestInfra {
    db_url: String,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

/// Global shared infrastructure - initialized once, reused by all tests.
static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        // Respect RUST_LOG; try_init() because every test races to be first.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .with_cmd(["-c", "max_connections=200"])
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let pg_host = postgres.get_host().await?;
        let pg_port = postgres.get_host_port_ipv4(5432).await?;
        let db_url = format!(
            "postgresql://postgres:postgres@{}:{}/postgres",
            pg_host, pg_port
        );

        let pool = PgPool::connect(&db_url)
            .await
            .context("Failed to connect to Postgres for migrations")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            db_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }
}

/// Policy values every test runs with.
///
/// Lead time 60 min and a 12 h cancellation window: a slot 2 h out is
/// bookable but no longer cancellable, which the lifecycle tests rely on.
pub fn test_config(database_url: &str) -> BookingConfig {
    BookingConfig {
        database_url: database_url.to_string(),
        min_lead_time_minutes: 60,
        cancellation_window_minutes: 720,
        credit_unit_price: Decimal::new(250, 2),
        platform_fee_percent: Decimal::new(10, 0),
    }
}

/// Test harness handing each test a pool and a ready kernel.
pub struct TestHarness {
    pub db_pool: PgPool,
    pub kernel: BookingKernel,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        // Database pool is automatically dropped
    }
}

impl TestHarness {
    async fn new() -> Result<Self> {
        let infra = SharedTestInfra::get().await;

        let db_pool = PgPool::connect(&infra.db_url)
            .await
            .context("Failed to connect to shared test database")?;

        let kernel = BookingKernel::new(db_pool.clone(), test_config(&infra.db_url));

        Ok(Self { db_pool, kernel })
    }
}
