//! Countdown configuration

use std::time::Duration;

/// Immutable parameter bundle for a countdown.
///
/// Validated at construction: the default duration must lie within the
/// configured min/max bounds, and a violation is a programming error by the
/// integrator, so construction panics instead of clamping.
#[derive(Debug, Clone)]
pub struct CountdownConfiguration {
    poll_interval: Duration,
    poll_tolerance: Duration,
    min_duration: Duration,
    max_duration: Duration,
    default_duration: Duration,
}

impl CountdownConfiguration {
    /// Create a configuration with explicit values.
    ///
    /// # Panics
    ///
    /// Panics when `default_duration` is outside
    /// `[min_duration, max_duration]` or when `poll_interval` is zero.
    pub fn new(
        poll_interval: Duration,
        poll_tolerance: Duration,
        min_duration: Duration,
        max_duration: Duration,
        default_duration: Duration,
    ) -> Self {
        assert!(
            min_duration <= default_duration && default_duration <= max_duration,
            "invalid countdown configuration: default duration must lie between min and max duration"
        );
        assert!(
            !poll_interval.is_zero(),
            "invalid countdown configuration: poll interval must be non-zero"
        );

        Self {
            poll_interval,
            poll_tolerance,
            min_duration,
            max_duration,
            default_duration,
        }
    }

    /// Create a configuration with custom duration bounds and the default
    /// polling parameters.
    pub fn with_durations(
        min_duration: Duration,
        max_duration: Duration,
        default_duration: Duration,
    ) -> Self {
        Self::new(
            Duration::from_millis(100),
            Duration::from_millis(50),
            min_duration,
            max_duration,
            default_duration,
        )
    }

    /// Seconds between polling ticks
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Allowed scheduling slack for the poll mechanism; an efficiency hint,
    /// not a correctness requirement
    pub fn poll_tolerance(&self) -> Duration {
        self.poll_tolerance
    }

    /// Inclusive lower bound on the total countdown length
    pub fn min_duration(&self) -> Duration {
        self.min_duration
    }

    /// Inclusive upper bound on the total countdown length
    pub fn max_duration(&self) -> Duration {
        self.max_duration
    }

    /// Initial total countdown length
    pub fn default_duration(&self) -> Duration {
        self.default_duration
    }
}

impl Default for CountdownConfiguration {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(100),
            Duration::from_millis(50),
            Duration::from_secs(15),
            Duration::from_secs(30 * 60),
            Duration::from_secs(90),
        )
    }
}
