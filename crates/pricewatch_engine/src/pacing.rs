use std::time::Duration;

use rand::Rng;

/// Bounds of the randomized pause between two fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingSettings {
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(3000),
        }
    }
}

impl PacingSettings {
    /// A uniformly drawn delay in `[min_delay, max_delay)`.
    pub fn next_delay(&self) -> Duration {
        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        if max <= min {
            return self.min_delay;
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..max))
    }
}
