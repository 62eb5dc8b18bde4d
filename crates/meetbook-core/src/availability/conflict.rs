//! Conflict detection for a proposed booking.

use serde::{Deserialize, Serialize};

use super::busy::BusyPeriod;
use super::interval::Interval;

/// Busy periods overlapping a proposed interval. Empty means bookable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictSet {
    pub proposed: Interval,
    pub conflicts: Vec<BusyPeriod>,
}

impl ConflictSet {
    pub fn is_available(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Collect every blocking period overlapping `proposed`, in input order.
///
/// Touching endpoints are not conflicts.
pub fn check(proposed: &Interval, busy: &[BusyPeriod]) -> ConflictSet {
    let conflicts = busy
        .iter()
        .filter(|period| period.is_blocking() && proposed.overlaps(&period.interval))
        .copied()
        .collect();

    ConflictSet {
        proposed: *proposed,
        conflicts,
    }
}
