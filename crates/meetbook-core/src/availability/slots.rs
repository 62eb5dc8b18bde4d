//! Free slot generation inside a day window.
//!
//! Single sweep over busy periods sorted by start. Each qualifying gap
//! yields one slot of exactly the requested length at the start of the gap.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::busy::BusyPeriod;
use super::interval::{Instant, Interval};
use super::window::DayWindow;
use crate::error::AvailabilityError;

/// A bookable slot of exactly `duration_min` minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeSlot {
    pub interval: Interval,
    pub duration_min: i64,
    /// End of the gap this slot was taken from.
    pub max_end: Instant,
}

impl FreeSlot {
    pub fn start(&self) -> Instant {
        self.interval.start()
    }

    pub fn end(&self) -> Instant {
        self.interval.end()
    }

    /// "09:00"
    pub fn start_time(&self) -> String {
        self.interval.start().format("%H:%M").to_string()
    }

    /// "09:30"
    pub fn end_time(&self) -> String {
        self.interval.end().format("%H:%M").to_string()
    }
}

impl std::fmt::Display for FreeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "from {} to {}", self.start_time(), self.end_time())
    }
}

/// Generate one slot per gap that fits `required_min`.
pub fn generate(
    window: &DayWindow,
    busy: &[BusyPeriod],
    required_min: i64,
) -> Result<Vec<FreeSlot>, AvailabilityError> {
    generate_in(&window.interval, busy, required_min)
}

/// [`generate`] over an arbitrary bounding interval.
pub fn generate_in(
    bounds: &Interval,
    busy: &[BusyPeriod],
    required_min: i64,
) -> Result<Vec<FreeSlot>, AvailabilityError> {
    if required_min < 1 {
        return Err(AvailabilityError::InvalidDuration {
            minutes: required_min,
        });
    }

    let mut slots = Vec::new();
    for gap in gaps(bounds, busy) {
        if let Some(slot) = slot_at(gap.start(), &gap, required_min) {
            slots.push(slot);
        }
    }
    Ok(slots)
}

/// Enumerate every slot inside each gap, with starts `step_min` apart.
///
/// Opt-in alternative to [`generate`], which only surfaces the earliest
/// slot of each gap.
pub fn generate_all(
    window: &DayWindow,
    busy: &[BusyPeriod],
    required_min: i64,
    step_min: i64,
) -> Result<Vec<FreeSlot>, AvailabilityError> {
    if required_min < 1 {
        return Err(AvailabilityError::InvalidDuration {
            minutes: required_min,
        });
    }
    if step_min < 1 {
        return Err(AvailabilityError::InvalidDuration { minutes: step_min });
    }

    let mut slots = Vec::new();
    for gap in gaps(&window.interval, busy) {
        let mut start = gap.start();
        while let Some(slot) = slot_at(start, &gap, required_min) {
            slots.push(slot);
            match Duration::try_minutes(step_min).and_then(|step| start.checked_add_signed(step)) {
                Some(next) => start = next,
                None => break,
            }
        }
    }
    Ok(slots)
}

/// Free gaps of `bounds` left between busy periods, in order.
fn gaps(bounds: &Interval, busy: &[BusyPeriod]) -> Vec<Interval> {
    let mut gaps = Vec::new();
    let mut cursor = bounds.start();

    for period in busy.iter().filter(|p| p.is_blocking()) {
        let (b_start, b_end) = (period.interval.start(), period.interval.end());

        // Nothing at or past the window end can open a gap inside it
        if b_start >= bounds.end() {
            break;
        }

        if b_start > cursor {
            if let Ok(gap) = Interval::new(cursor, b_start.min(bounds.end())) {
                gaps.push(gap);
            }
        }

        cursor = cursor.max(b_end);
    }

    if cursor < bounds.end() {
        if let Ok(gap) = Interval::new(cursor, bounds.end()) {
            gaps.push(gap);
        }
    }

    gaps
}

/// Slot of `required_min` starting at `start`, if it fits in `gap`.
fn slot_at(start: Instant, gap: &Interval, required_min: i64) -> Option<FreeSlot> {
    let remaining = Interval::new(start, gap.end()).ok()?;
    if remaining.duration_seconds() < required_min.checked_mul(60)? {
        return None;
    }
    let end = start
        .checked_add_signed(Duration::try_minutes(required_min)?)?
        .min(gap.end());
    Some(FreeSlot {
        interval: Interval::new(start, end).ok()?,
        duration_min: required_min,
        max_end: gap.end(),
    })
}
