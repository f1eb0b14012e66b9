use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::db::DatabaseDriver;
use crate::error::{AppError, AppResult};
use crate::models::DbConfig;

/// Stand-in for a real driver: waits `delay`, then succeeds with
/// probability `success_rate`.
pub struct MockDriver {
    delay: Duration,
    success_rate: f64,
    rng: Mutex<StdRng>,
}

impl MockDriver {
    pub fn new(delay: Duration, success_rate: f64) -> Self {
        Self::with_rng(delay, success_rate, StdRng::from_entropy())
    }

    pub fn seeded(delay: Duration, success_rate: f64, seed: u64) -> Self {
        Self::with_rng(delay, success_rate, StdRng::seed_from_u64(seed))
    }

    fn with_rng(delay: Duration, success_rate: f64, rng: StdRng) -> Self {
        // NaN would make `gen_bool` panic.
        let success_rate = if success_rate.is_nan() { 0.0 } else { success_rate.clamp(0.0, 1.0) };
        Self {
            delay,
            success_rate,
            rng: Mutex::new(rng),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[async_trait]
impl DatabaseDriver for MockDriver {
    async fn connect(&self, config: &DbConfig) -> AppResult<()> {
        tokio::time::sleep(self.delay).await;

        let succeeded = self.rng.lock()?.gen_bool(self.success_rate);
        if succeeded {
            tracing::debug!(kind = %config.kind, host = %config.host, "mock connection established");
            Ok(())
        } else {
            Err(AppError::Connection("Failed to connect".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DbKind;

    fn config() -> DbConfig {
        DbConfig {
            kind: DbKind::Mysql,
            host: "localhost".into(),
            username: "root".into(),
            password: String::new(),
            database: "sales_db".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn connect_waits_for_the_delay() {
        let driver = MockDriver::seeded(Duration::from_millis(1000), 1.0, 7);
        let started = tokio::time::Instant::now();
        driver.connect(&config()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_success_rate_always_fails_generically() {
        let driver = MockDriver::seeded(Duration::from_millis(10), 0.0, 7);
        let err = driver.connect(&config()).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to connect");
        assert!(err.is_retryable());
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_range_success_rates_are_clamped() {
        let driver = MockDriver::seeded(Duration::from_millis(1), f64::NAN, 7);
        assert_eq!(driver.connect(&config()).await.unwrap_err().to_string(), "Failed to connect");

        let driver = MockDriver::seeded(Duration::from_millis(1), 3.5, 7);
        assert!(driver.connect(&config()).await.is_ok());
        let driver = MockDriver::seeded(Duration::from_millis(1), -1.0, 7);
        assert!(driver.connect(&config()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn success_rate_is_roughly_honoured() {
        let driver = MockDriver::seeded(Duration::from_millis(1), 0.9, 42);
        let mut successes = 0;
        for _ in 0..1000 {
            if driver.connect(&config()).await.is_ok() {
                successes += 1;
            }
        }
        assert!((850..=950).contains(&successes), "successes = {successes}");
    }
}
