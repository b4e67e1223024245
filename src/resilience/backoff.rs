//! Exponential backoff without jitter.

use std::time::Duration;

/// Delay before retry number `retry` (1-based): `base * 2^(retry-1)`, capped at `max`.
pub fn calculate_backoff(retry: u32, base_ms: u64, max_ms: u64) -> Duration {
    if retry == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(retry - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);

    Duration::from_millis(delay_ms.min(max_ms))
}

/// Backoff state for one invocation: the current delay, doubled after every use.
#[derive(Debug, Clone)]
pub struct Backoff {
    base_ms: u64,
    max_ms: u64,
    retries: u32,
}

impl Backoff {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self {
            base_ms,
            max_ms,
            retries: 0,
        }
    }

    /// Delay to wait before the next retry; advances the schedule.
    pub fn next_delay(&mut self) -> Duration {
        self.retries += 1;
        calculate_backoff(self.retries, self.base_ms, self.max_ms)
    }

    /// Number of delays handed out so far.
    pub fn retries(&self) -> u32 {
        self.retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        assert_eq!(calculate_backoff(0, 1000, 32_000), Duration::ZERO);
        assert_eq!(calculate_backoff(1, 1000, 32_000), Duration::from_millis(1000));
        assert_eq!(calculate_backoff(2, 1000, 32_000), Duration::from_millis(2000));
        assert_eq!(calculate_backoff(6, 1000, 32_000), Duration::from_millis(32_000));
        assert_eq!(calculate_backoff(7, 1000, 32_000), Duration::from_millis(32_000));
    }

    #[test]
    fn test_large_retry_counts_saturate() {
        assert_eq!(calculate_backoff(200, 1000, 32_000), Duration::from_millis(32_000));
    }

    #[test]
    fn test_schedule_doubles_then_caps() {
        let mut backoff = Backoff::new(100, 1000);
        let delays: Vec<u128> = (0..6).map(|_| backoff.next_delay().as_millis()).collect();
        assert_eq!(delays, vec![100, 200, 400, 800, 1000, 1000]);
        assert_eq!(backoff.retries(), 6);
    }
}
