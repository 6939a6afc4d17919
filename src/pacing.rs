//! Randomized pacing delays
//!
//! Waits inserted between automation steps to emulate human interaction
//! timing and reduce automated-traffic detection risk. Each call draws an
//! independent uniform sample from its window.

use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::debug;

/// An inclusive `[min,max]` millisecond window to sample a delay from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayWindow {
    pub min_ms: u64,
    pub max_ms: u64,
}

/// Reading time after the landing page has parsed.
pub const PAGE_OBSERVE: DelayWindow = DelayWindow {
    min_ms: 3000,
    max_ms: 5000,
};

/// Wait after the credential form is reached, on either branch.
pub const FORM_SETTLE: DelayWindow = DelayWindow {
    min_ms: 2000,
    max_ms: 3000,
};

/// Wait after filling a single field.
pub const FIELD_ENTRY: DelayWindow = DelayWindow {
    min_ms: 1000,
    max_ms: 2000,
};

/// Rest interval between two accounts, deliberately larger than any
/// intra-login delay.
pub const ACCOUNT_REST: DelayWindow = DelayWindow {
    min_ms: 8000,
    max_ms: 12000,
};

impl DelayWindow {
    /// Sample a duration uniformly from the window, inclusive on both ends.
    pub fn sample(&self) -> Duration {
        Duration::from_millis(rand::thread_rng().gen_range(self.min_ms..=self.max_ms))
    }
}

/// Sleep for a duration sampled from `window` and return what was slept.
///
/// The returned value is for logging only; callers must not depend on it.
pub async fn pause(window: DelayWindow) -> Duration {
    let delay = window.sample();
    debug!(
        "Pacing delay {}ms (window {}-{}ms)",
        delay.as_millis(),
        window.min_ms,
        window.max_ms
    );
    sleep(delay).await;
    delay
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_stays_within_bounds() {
        let window = DelayWindow {
            min_ms: 100,
            max_ms: 200,
        };
        for _ in 0..1000 {
            let delay = window.sample().as_millis() as u64;
            assert!(delay >= 100 && delay <= 200);
        }
    }

    #[test]
    fn test_degenerate_window_is_exact() {
        let window = DelayWindow {
            min_ms: 500,
            max_ms: 500,
        };
        assert_eq!(window.sample(), Duration::from_millis(500));
    }

    #[test]
    fn test_samples_are_independent() {
        let window = DelayWindow {
            min_ms: 0,
            max_ms: 100_000,
        };
        let first = window.sample();
        // A wide window repeatedly producing the same value means the
        // generator is not being re-sampled per call.
        assert!((0..100).any(|_| window.sample() != first));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_reports_the_slept_duration() {
        let start = tokio::time::Instant::now();
        let slept = pause(ACCOUNT_REST).await;
        assert_eq!(start.elapsed(), slept);
        assert!(slept >= Duration::from_millis(8000));
        assert!(slept <= Duration::from_millis(12000));
    }
}
