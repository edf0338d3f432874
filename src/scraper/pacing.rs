//! Randomized politeness delay between units.

use rand::Rng;
use tokio::time::Duration;

use crate::config::PacingConfig;

/// Sleeps for a random duration in `[min, max]` after each unit.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    min_delay: Duration,
    max_delay: Duration,
}

impl Pacer {
    /// Create a pacer
    ///
    /// # Arguments
    /// * `min_delay_secs` - Shortest pause
    /// * `max_delay_secs` - Longest pause; clamped up to `min_delay_secs`
    pub fn new(min_delay_secs: f64, max_delay_secs: f64) -> Self {
        let min = min_delay_secs.max(0.0);
        let max = max_delay_secs.max(min);
        Self {
            min_delay: Duration::from_secs_f64(min),
            max_delay: Duration::from_secs_f64(max),
        }
    }

    pub fn from_config(config: &PacingConfig) -> Self {
        Self::new(config.min_secs, config.max_secs)
    }

    /// A pacer that never waits.
    #[cfg(test)]
    pub fn none() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Pick the next delay
    pub fn next_delay(&self) -> Duration {
        let range = self.max_delay - self.min_delay;
        let factor: f64 = rand::thread_rng().gen_range(0.0..=1.0);
        self.min_delay + range.mul_f64(factor)
    }

    /// Wait out one delay.
    pub async fn pause(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
