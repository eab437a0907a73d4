//! Repeating countdown shared by energy producers.

use std::time::Duration;

/// Countdown that fires once per period and rearms itself.
#[derive(Clone, Debug)]
pub(crate) struct Countdown {
    period: Duration,
    remaining: Duration,
}

impl Countdown {
    /// Creates a countdown armed with a full period.
    pub(crate) fn from_secs(period_secs: f32) -> Self {
        let period = secs(period_secs);
        Self {
            period,
            remaining: period,
        }
    }

    /// Advances the countdown, returning `true` when it reached zero.
    ///
    /// A zero period never fires. At most one firing is reported per call.
    pub(crate) fn advance(&mut self, dt: Duration) -> bool {
        if self.period.is_zero() {
            return false;
        }

        self.remaining = self.remaining.saturating_sub(dt);
        if self.remaining.is_zero() {
            self.remaining = self.period;
            return true;
        }
        false
    }
}

/// Converts configured seconds into a duration.
///
/// Negative and NaN values become zero; values beyond the range of
/// `Duration` saturate to `Duration::MAX`.
pub(crate) fn secs(value: f32) -> Duration {
    if value.is_nan() || value <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f32(value).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_period_and_rearms() {
        let mut countdown = Countdown::from_secs(1.0);
        assert!(!countdown.advance(Duration::from_millis(600)));
        assert!(countdown.advance(Duration::from_millis(400)));
        assert!(!countdown.advance(Duration::from_millis(999)));
        assert!(countdown.advance(Duration::from_millis(1)));
    }

    #[test]
    fn zero_period_never_fires() {
        let mut countdown = Countdown::from_secs(0.0);
        assert!(!countdown.advance(Duration::from_secs(100)));
    }

    #[test]
    fn invalid_seconds_become_zero() {
        assert_eq!(secs(-3.0), Duration::ZERO);
        assert_eq!(secs(f32::NAN), Duration::ZERO);
        assert_eq!(secs(0.5), Duration::from_millis(500));
    }

    #[test]
    fn oversized_seconds_saturate() {
        assert_eq!(secs(1e20), Duration::MAX);
        assert_eq!(secs(f32::INFINITY), Duration::MAX);

        let mut countdown = Countdown::from_secs(1e20);
        assert!(!countdown.advance(Duration::from_secs(u64::from(u32::MAX))));
    }
}
