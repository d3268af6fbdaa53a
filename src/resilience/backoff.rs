//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

/// Delay to wait after failed attempt `attempt` (1-based) before the next one.
///
/// `base * 2^(attempt - 1)`, capped at `max`, plus up to 10% jitter.
pub fn calculate_backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let factor = 2u32.saturating_pow(attempt - 1);
    let capped = base.saturating_mul(factor).min(max);

    let jitter_range_ms = (capped.as_millis() / 10) as u64;
    let jitter_ms = if jitter_range_ms > 0 {
        rand::thread_rng().gen_range(0..jitter_range_ms)
    } else {
        0
    };

    capped + Duration::from_millis(jitter_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let base = Duration::from_secs(1);
        let max = Duration::from_secs(30);

        let first = calculate_backoff(1, base, max);
        assert!(first >= Duration::from_secs(1) && first < Duration::from_millis(1100));

        let second = calculate_backoff(2, base, max);
        assert!(second >= Duration::from_secs(2) && second < Duration::from_millis(2200));

        let third = calculate_backoff(3, base, max);
        assert!(third >= Duration::from_secs(4));
    }

    #[test]
    fn test_backoff_is_capped() {
        let capped = calculate_backoff(10, Duration::from_millis(100), Duration::from_secs(1));
        assert!(capped >= Duration::from_secs(1) && capped < Duration::from_millis(1100));
    }

    #[test]
    fn test_no_delay_before_first_attempt() {
        assert_eq!(
            calculate_backoff(0, Duration::from_secs(1), Duration::from_secs(8)),
            Duration::ZERO
        );
    }
}
