//! Day window resolution and date/time parsing.
//!
//! Turns a calendar date plus working-hour bounds into a concrete
//! `[start, end)` pair in one fixed offset. Timestamps from the remote
//! calendar arrive without an offset and are read in the request offset.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

use super::interval::{Instant, Interval};
use crate::error::AvailabilityError;
use crate::storage::WorkingHours;

pub const DEFAULT_START_HOUR: i32 = 9;
pub const DEFAULT_END_HOUR: i32 = 18;

const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Working-hour bounds of one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    pub date: NaiveDate,
    pub start_hour: u32,
    pub end_hour: u32,
    pub interval: Interval,
}

impl DayWindow {
    pub fn start(&self) -> Instant {
        self.interval.start()
    }

    pub fn end(&self) -> Instant {
        self.interval.end()
    }

    /// Offset every instant of this window is expressed in.
    pub fn offset(&self) -> FixedOffset {
        *self.interval.start().offset()
    }

    /// "09:00 - 18:00"
    pub fn label(&self) -> String {
        format!("{:02}:00 - {:02}:00", self.start_hour, self.end_hour)
    }
}

/// Clamp raw hour bounds: start into `[0, 23]`, end to at most 23 and at
/// least `start + 1`.
pub fn clamp_hours(start_hour: i32, end_hour: i32) -> (u32, u32) {
    let start = start_hour.clamp(0, 23);
    let end = end_hour.min(23).max(start + 1);
    (start as u32, end as u32)
}

/// Resolve the working-day window for `date` in `offset`.
///
/// `date` is either `YYYY-MM-DD` or a timestamp whose calendar date is used.
/// With `start_hour = 23` the window ends at midnight of the following day.
pub fn resolve(
    date: &str,
    offset: FixedOffset,
    start_hour: i32,
    end_hour: i32,
) -> Result<DayWindow, AvailabilityError> {
    let date = parse_date(date)?;
    let (start_hour, end_hour) = clamp_hours(start_hour, end_hour);

    let midnight = local_instant(date.and_time(NaiveTime::MIN), offset)?;
    let start = midnight + Duration::hours(i64::from(start_hour));
    let end = midnight + Duration::hours(i64::from(end_hour));

    Ok(DayWindow {
        date,
        start_hour,
        end_hour,
        interval: Interval::new(start, end)?,
    })
}

/// Resolve using configured working hours.
pub fn resolve_with(
    date: &str,
    offset: FixedOffset,
    hours: &WorkingHours,
) -> Result<DayWindow, AvailabilityError> {
    resolve(date, offset, hours.start_hour, hours.end_hour)
}

/// Parse a calendar date, accepting either a bare date or a timestamp.
pub fn parse_date(input: &str) -> Result<NaiveDate, AvailabilityError> {
    let trimmed = input.trim();
    let invalid = || AvailabilityError::InvalidDate {
        input: input.to_string(),
    };

    if trimmed.contains('T') {
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(dt.date_naive());
        }
        return parse_naive_datetime(trimmed)
            .map(|dt| dt.date())
            .ok_or_else(invalid);
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| invalid())
}

/// Parse a wall-clock time of day (`HH:MM` or `HH:MM:SS`).
pub fn parse_time_of_day(input: &str) -> Result<NaiveTime, AvailabilityError> {
    let trimmed = input.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| AvailabilityError::InvalidTime {
            input: input.to_string(),
        })
}

/// Parse a timestamp into `offset`.
///
/// RFC 3339 values are converted; naive values (Graph sends
/// `2025-10-20T09:30:00.0000000`) are taken as wall-clock time in `offset`.
pub fn parse_instant(input: &str, offset: FixedOffset) -> Result<Instant, AvailabilityError> {
    let trimmed = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&offset));
    }
    let naive = parse_naive_datetime(trimmed).ok_or_else(|| AvailabilityError::InvalidDate {
        input: input.to_string(),
    })?;
    local_instant(naive, offset)
}

/// Combine a date and a time of day into an instant in `offset`.
pub fn combine(
    date: &str,
    time_of_day: &str,
    offset: FixedOffset,
) -> Result<Instant, AvailabilityError> {
    let date = parse_date(date)?;
    let time = parse_time_of_day(time_of_day)?;
    local_instant(date.and_time(time), offset)
}

/// Parse `+04:00`, `-05:30`, `Z` or `UTC` into a fixed offset.
pub fn parse_offset(input: &str) -> Option<FixedOffset> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match trimmed.as_bytes().first().copied()? {
        b'+' => (1, &trimmed[1..]),
        b'-' => (-1, &trimmed[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !digits(hours) || !digits(minutes) {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn parse_naive_datetime(input: &str) -> Option<NaiveDateTime> {
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
}

fn local_instant(naive: NaiveDateTime, offset: FixedOffset) -> Result<Instant, AvailabilityError> {
    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| AvailabilityError::InvalidDate {
            input: naive.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gst() -> FixedOffset {
        FixedOffset::east_opt(4 * 3600).unwrap()
    }

    #[test]
    fn resolves_default_working_day() {
        let window = resolve("2025-10-20", gst(), 9, 18).unwrap();
        assert_eq!(window.start().to_rfc3339(), "2025-10-20T09:00:00+04:00");
        assert_eq!(window.end().to_rfc3339(), "2025-10-20T18:00:00+04:00");
        assert_eq!(window.label(), "09:00 - 18:00");
    }

    #[test]
    fn resolve_with_uses_configured_hours() {
        let hours = WorkingHours {
            start_hour: 8,
            end_hour: 16,
        };
        let window = resolve_with("2025-10-20", gst(), &hours).unwrap();
        assert_eq!(window.label(), "08:00 - 16:00");
        assert_eq!(window.interval.duration_minutes(), 480);
    }

    #[test]
    fn takes_date_from_timestamp() {
        let window = resolve("2025-10-20T15:42:00", gst(), 9, 18).unwrap();
        assert_eq!(window.date, NaiveDate::from_ymd_opt(2025, 10, 20).unwrap());

        let window = resolve("2025-10-21T01:00:00-07:00", gst(), 9, 18).unwrap();
        assert_eq!(window.date, NaiveDate::from_ymd_opt(2025, 10, 21).unwrap());
    }

    #[test]
    fn rejects_garbage_dates() {
        for input in ["", "20-10-2025", "2025-13-01", "next tuesday", "2025-10-20Tnope"] {
            assert!(
                matches!(resolve(input, gst(), 9, 18), Err(AvailabilityError::InvalidDate { .. })),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn clamps_hours() {
        assert_eq!(clamp_hours(-3, 30), (0, 23));
        assert_eq!(clamp_hours(12, 10), (12, 13));
        assert_eq!(clamp_hours(9, 9), (9, 10));
        assert_eq!(clamp_hours(23, 23), (23, 24));
    }

    #[test]
    fn late_start_rolls_into_next_midnight() {
        let window = resolve("2025-10-20", gst(), 23, 23).unwrap();
        assert_eq!(window.end().to_rfc3339(), "2025-10-21T00:00:00+04:00");
        assert_eq!(window.interval.duration_minutes(), 60);
    }

    #[test]
    fn parses_graph_style_timestamps() {
        let instant = parse_instant("2025-10-20T09:30:00.0000000", gst()).unwrap();
        assert_eq!(instant.to_rfc3339(), "2025-10-20T09:30:00+04:00");

        let converted = parse_instant("2025-10-20T05:30:00Z", gst()).unwrap();
        assert_eq!(converted, instant);

        assert!(parse_instant("not-a-time", gst()).is_err());
    }

    #[test]
    fn combines_date_and_time() {
        let instant = combine("2025-10-20", "14:15", gst()).unwrap();
        assert_eq!(instant.to_rfc3339(), "2025-10-20T14:15:00+04:00");
        assert!(matches!(
            combine("2025-10-20", "2pm", gst()),
            Err(AvailabilityError::InvalidTime { .. })
        ));
    }

    #[test]
    fn parses_offsets() {
        assert_eq!(parse_offset("+04:00"), FixedOffset::east_opt(14_400));
        assert_eq!(parse_offset("-05:30"), FixedOffset::west_opt(19_800));
        assert_eq!(parse_offset("UTC"), FixedOffset::east_opt(0));
        assert_eq!(parse_offset("+3"), FixedOffset::east_opt(10_800));
        assert_eq!(parse_offset("04:00"), None);
        assert_eq!(parse_offset("+25:00"), None);
        assert_eq!(parse_offset("++3"), None);
        assert_eq!(parse_offset("-+04:00"), None);
        assert_eq!(parse_offset("+04:+30"), None);
    }
}
