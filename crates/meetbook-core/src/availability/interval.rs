//! Half-open time intervals in a single fixed offset.

use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::AvailabilityError;

/// A timezone-aware point in time. All instants inside one computation
/// share the same offset.
pub type Instant = DateTime<FixedOffset>;

/// An ordered pair `[start, end)` with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    start: Instant,
    end: Instant,
}

impl Interval {
    /// Create a new interval, rejecting `end < start`.
    pub fn new(start: Instant, end: Instant) -> Result<Self, AvailabilityError> {
        if end < start {
            return Err(AvailabilityError::InvalidInterval {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// Interval of `minutes` length starting at `start`.
    pub fn starting_at(start: Instant, minutes: i64) -> Result<Self, AvailabilityError> {
        if minutes < 0 {
            return Err(AvailabilityError::InvalidDuration { minutes });
        }
        Self::new(start, start + Duration::minutes(minutes))
    }

    pub fn start(&self) -> Instant {
        self.start
    }

    pub fn end(&self) -> Instant {
        self.end
    }

    /// Length in whole minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Length in seconds (used for the slot-fit test, no rounding).
    pub fn duration_seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }

    /// Half-open overlap test: touching endpoints do not overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        !(self.end <= other.start || self.start >= other.end)
    }

    /// Whether `other` lies entirely within this interval.
    pub fn contains(&self, other: &Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Re-express both ends in `offset`. The instants do not change.
    pub fn with_offset(&self, offset: FixedOffset) -> Self {
        Self {
            start: self.start.with_timezone(&offset),
            end: self.end.with_timezone(&offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> Instant {
        FixedOffset::east_opt(4 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 10, 20, h, m, 0)
            .unwrap()
    }

    #[test]
    fn new_rejects_inverted_interval() {
        assert!(Interval::new(at(10, 0), at(9, 0)).is_err());
        assert!(Interval::new(at(9, 0), at(9, 0)).is_ok());
    }

    #[test]
    fn touching_intervals_do_not_overlap() {
        let a = Interval::new(at(10, 0), at(10, 30)).unwrap();
        let b = Interval::new(at(10, 30), at(11, 0)).unwrap();
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn partial_overlap_is_detected_both_ways() {
        let a = Interval::new(at(9, 0), at(9, 45)).unwrap();
        let b = Interval::new(at(9, 30), at(10, 0)).unwrap();
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn starting_at_builds_fixed_length() {
        let slot = Interval::starting_at(at(13, 0), 45).unwrap();
        assert_eq!(slot.end(), at(13, 45));
        assert_eq!(slot.duration_minutes(), 45);
        assert!(Interval::starting_at(at(13, 0), -5).is_err());
    }

    #[test]
    fn with_offset_keeps_the_instant() {
        let slot = Interval::new(at(9, 0), at(10, 0)).unwrap();
        let utc = slot.with_offset(FixedOffset::east_opt(0).unwrap());
        assert_eq!(utc.start(), slot.start());
        assert_eq!(utc.start().format("%H:%M").to_string(), "05:00");
    }
}
