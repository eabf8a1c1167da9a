//! # Round-Time Estimation
//!
//! Operators share no round clock, only the beacon slot grid. The round the
//! committee should be in is derived from the time elapsed since the slot
//! started, following the round timer every operator runs:
//!
//! ```text
//!  slot start
//!  │ quick │ quick │ ... │ quick │      slow      │      slow      │ ...
//!  │  r1   │  r2   │     │  rT   │     rT+1       │     rT+2       │
//! ```
//!
//! The first `T` rounds time out after `quick_timeout`; every later round
//! after `slow_timeout`.

use super::{ConfigError, InternalError, ValidationConfig};
use shared_types::{Round, FIRST_ROUND};
use std::time::Duration;

/// Two-phase round estimator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundTimeEstimator {
    quick_timeout: Duration,
    quick_threshold: Round,
    slow_timeout: Duration,
}

impl RoundTimeEstimator {
    /// Create an estimator. Both timeouts must be non-zero.
    pub fn new(
        quick_timeout: Duration,
        quick_threshold: Round,
        slow_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let config = ValidationConfig {
            quick_timeout,
            quick_timeout_threshold: quick_threshold,
            slow_timeout,
            ..Default::default()
        };
        Self::from_config(&config)
    }

    pub fn from_config(config: &ValidationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            quick_timeout: config.quick_timeout,
            quick_threshold: config.quick_timeout_threshold,
            slow_timeout: config.slow_timeout,
        })
    }

    /// Estimate the current round from the time elapsed since slot start.
    ///
    /// Fails only if the round count does not fit a [`Round`], which takes
    /// an elapsed time no working clock produces.
    pub fn estimate_round(&self, since_slot_start: Duration) -> Result<Round, InternalError> {
        let overflow = || InternalError::RoundEstimateOverflow {
            elapsed: since_slot_start,
        };

        let elapsed = since_slot_start.as_nanos();
        let quick_rounds = Round::try_from(elapsed / self.quick_timeout.as_nanos())
            .map_err(|_| overflow())?;
        let quick_round = FIRST_ROUND.checked_add(quick_rounds).ok_or_else(overflow)?;
        if quick_round <= self.quick_threshold {
            return Ok(quick_round);
        }

        let quick_phase = self.quick_timeout.as_nanos() * u128::from(self.quick_threshold);
        let since_first_slow_round = elapsed.saturating_sub(quick_phase);
        let slow_rounds = Round::try_from(since_first_slow_round / self.slow_timeout.as_nanos())
            .map_err(|_| overflow())?;

        self.quick_threshold
            .checked_add(FIRST_ROUND)
            .and_then(|round| round.checked_add(slow_rounds))
            .ok_or_else(overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn estimator() -> RoundTimeEstimator {
        RoundTimeEstimator::from_config(&ValidationConfig::default()).unwrap()
    }

    #[test]
    fn test_quick_rounds() {
        let est = estimator();
        assert_eq!(est.estimate_round(Duration::ZERO).unwrap(), 1);
        assert_eq!(est.estimate_round(Duration::from_millis(1999)).unwrap(), 1);
        assert_eq!(est.estimate_round(Duration::from_secs(2)).unwrap(), 2);
        assert_eq!(est.estimate_round(Duration::from_secs(14)).unwrap(), 8);
        assert_eq!(est.estimate_round(Duration::from_millis(15_999)).unwrap(), 8);
    }

    #[test]
    fn test_slow_rounds() {
        let est = estimator();
        // quick phase ends at 8 * 2s = 16s
        assert_eq!(est.estimate_round(Duration::from_secs(16)).unwrap(), 9);
        assert_eq!(est.estimate_round(Duration::from_secs(16 + 119)).unwrap(), 9);
        assert_eq!(est.estimate_round(Duration::from_secs(16 + 120)).unwrap(), 10);
        assert_eq!(est.estimate_round(Duration::from_secs(16 + 600)).unwrap(), 14);
    }

    #[test]
    fn test_custom_timeouts() {
        let est =
            RoundTimeEstimator::new(Duration::from_millis(100), 2, Duration::from_secs(1)).unwrap();
        assert_eq!(est.estimate_round(Duration::from_millis(150)).unwrap(), 2);
        assert_eq!(est.estimate_round(Duration::from_millis(200)).unwrap(), 3);
        assert_eq!(est.estimate_round(Duration::from_millis(1200)).unwrap(), 4);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(RoundTimeEstimator::new(Duration::ZERO, 8, Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_overflow_is_internal_error() {
        let est = RoundTimeEstimator::new(Duration::from_nanos(1), u64::MAX, Duration::from_nanos(1));
        // u64::MAX quick rounds of 1ns overflow the quick phase
        assert!(est.is_err());

        let est =
            RoundTimeEstimator::new(Duration::from_nanos(1), 1, Duration::from_nanos(1)).unwrap();
        assert_eq!(
            est.estimate_round(Duration::MAX),
            Err(InternalError::RoundEstimateOverflow {
                elapsed: Duration::MAX
            })
        );
    }

    proptest! {
        #[test]
        fn prop_estimate_is_monotonic(a in 0u64..10_000_000, b in 0u64..10_000_000) {
            let est = estimator();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let r_lo = est.estimate_round(Duration::from_millis(lo)).unwrap();
            let r_hi = est.estimate_round(Duration::from_millis(hi)).unwrap();
            prop_assert!(r_lo <= r_hi);
        }

        #[test]
        fn prop_estimate_starts_at_first_round(ms in 0u64..2_000) {
            prop_assert_eq!(estimator().estimate_round(Duration::from_millis(ms)).unwrap(), FIRST_ROUND);
        }
    }
}
