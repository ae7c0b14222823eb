use anyhow::{Context, Result};
use chrono::Duration;
use dotenvy::dotenv;
use rust_decimal::Decimal;
use std::env;

/// Platform configuration loaded from environment variables.
///
/// Policy values (lead time, cancellation window, credit pricing, platform
/// fee) are deployment configuration, not code constants.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    pub database_url: String,
    /// Minimum minutes between "now" and a slot's start time for it to be
    /// bookable.
    pub min_lead_time_minutes: i64,
    /// An appointment can no longer be cancelled once its start time is
    /// within this many minutes.
    pub cancellation_window_minutes: i64,
    /// Currency value of one credit (e.g. "2.50").
    pub credit_unit_price: Decimal,
    /// Platform fee retained from payouts, in percent (e.g. "12.5").
    pub platform_fee_percent: Decimal,
}

impl BookingConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            min_lead_time_minutes: env::var("MIN_LEAD_TIME_MINUTES")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("MIN_LEAD_TIME_MINUTES must be a valid number")?,
            cancellation_window_minutes: env::var("CANCELLATION_WINDOW_MINUTES")
                .unwrap_or_else(|_| "720".to_string())
                .parse()
                .context("CANCELLATION_WINDOW_MINUTES must be a valid number")?,
            credit_unit_price: env::var("CREDIT_UNIT_PRICE")
                .unwrap_or_else(|_| "1.00".to_string())
                .parse()
                .context("CREDIT_UNIT_PRICE must be a valid decimal")?,
            platform_fee_percent: env::var("PLATFORM_FEE_PERCENT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("PLATFORM_FEE_PERCENT must be a valid decimal")?,
        })
    }

    /// Minimum booking lead time as a `Duration`.
    pub fn min_lead_time(&self) -> Duration {
        Duration::minutes(self.min_lead_time_minutes)
    }

    /// Cancellation cutoff window as a `Duration`.
    pub fn cancellation_window(&self) -> Duration {
        Duration::minutes(self.cancellation_window_minutes)
    }
}
