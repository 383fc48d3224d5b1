//! Breakdown of wall-clock intervals into days, hours, minutes and seconds

use std::time::Duration;

use serde::{Deserialize, Serialize};

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * 60;
const SECS_PER_DAY: u64 = 60 * 60 * 24;

/// A time interval decomposed into days, hours, minutes, seconds and a
/// sub-second remainder in nanoseconds.
///
/// The decomposition is agnostic of dates and calendars, so it only goes up
/// to days, never months or years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DurationBreakdown {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    /// Sub-second remainder in nanoseconds
    pub nanoseconds: u32,
}

impl DurationBreakdown {
    /// Decompose an interval; hours, minutes and seconds wrap at their
    /// natural bounds, everything above 24 hours accumulates into days.
    pub fn from_interval(interval: Duration) -> Self {
        let total_secs = interval.as_secs();
        Self {
            days: total_secs / SECS_PER_DAY,
            hours: (total_secs / SECS_PER_HOUR) % 24,
            minutes: (total_secs / SECS_PER_MINUTE) % 60,
            seconds: total_secs % 60,
            nanoseconds: interval.subsec_nanos(),
        }
    }

    /// The zero breakdown, returned whenever no time remains
    pub fn zero() -> Self {
        Self::default()
    }

    /// Reassemble the interval this breakdown was built from
    pub fn interval(&self) -> Duration {
        let secs = self.days * SECS_PER_DAY
            + self.hours * SECS_PER_HOUR
            + self.minutes * SECS_PER_MINUTE
            + self.seconds;
        Duration::new(secs, self.nanoseconds)
    }

    /// Check whether the breakdown represents a zero-length interval
    pub fn is_zero(&self) -> bool {
        self.interval() == Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decomposes_ninety_seconds() {
        let breakdown = DurationBreakdown::from_interval(Duration::from_secs(90));
        assert_eq!(breakdown.days, 0);
        assert_eq!(breakdown.hours, 0);
        assert_eq!(breakdown.minutes, 1);
        assert_eq!(breakdown.seconds, 30);
        assert_eq!(breakdown.nanoseconds, 0);
    }

    #[test]
    fn decomposes_across_day_boundary() {
        // 1 day, 2 hours, 3 minutes, 4 seconds
        let interval = Duration::from_secs(86_400 + 2 * 3600 + 3 * 60 + 4);
        let breakdown = DurationBreakdown::from_interval(interval);
        assert_eq!(breakdown.days, 1);
        assert_eq!(breakdown.hours, 2);
        assert_eq!(breakdown.minutes, 3);
        assert_eq!(breakdown.seconds, 4);
    }

    #[test]
    fn keeps_sub_second_remainder() {
        let breakdown = DurationBreakdown::from_interval(Duration::from_millis(1_250));
        assert_eq!(breakdown.seconds, 1);
        assert_eq!(breakdown.nanoseconds, 250_000_000);
    }

    #[test]
    fn round_trips_exactly() {
        let samples = [
            Duration::ZERO,
            Duration::from_nanos(1),
            Duration::from_millis(150),
            Duration::from_secs(59),
            Duration::from_secs(90),
            Duration::from_secs(3_599),
            Duration::from_secs(86_399),
            Duration::new(123_456_789, 987_654_321),
        ];
        for interval in samples {
            assert_eq!(DurationBreakdown::from_interval(interval).interval(), interval);
        }
    }

    #[test]
    fn zero_breakdown_is_zero() {
        assert!(DurationBreakdown::zero().is_zero());
        assert!(!DurationBreakdown::from_interval(Duration::from_nanos(1)).is_zero());
    }

    #[test]
    fn absent_fields_default_to_zero() {
        let breakdown = DurationBreakdown {
            minutes: 2,
            ..Default::default()
        };
        assert_eq!(breakdown.interval(), Duration::from_secs(120));
    }
}
