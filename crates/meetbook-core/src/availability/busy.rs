//! Busy-period extraction from a `getSchedule` response.
//!
//! The response is modelled as typed records at the boundary. Each item is
//! parsed on its own: a malformed item is logged and skipped, the rest of
//! the schedule still counts.

use chrono::FixedOffset;
use serde::{Deserialize, Deserializer, Serialize};

use super::interval::Interval;
use super::window::parse_instant;
use crate::error::AvailabilityError;

/// Availability status of a schedule item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BusyStatus {
    Busy,
    Tentative,
    OutOfOffice,
    Free,
    WorkingElsewhere,
    Unknown,
}

impl BusyStatus {
    /// Parse a raw status string, case-insensitive.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "busy" => Self::Busy,
            "tentative" => Self::Tentative,
            "oof" | "outofoffice" | "out-of-office" => Self::OutOfOffice,
            "free" => Self::Free,
            "workingelsewhere" => Self::WorkingElsewhere,
            _ => Self::Unknown,
        }
    }

    /// Only busy, tentative and out-of-office block a booking.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Busy | Self::Tentative | Self::OutOfOffice)
    }

    /// Wire spelling, as the calendar service reports it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Busy => "busy",
            Self::Tentative => "tentative",
            Self::OutOfOffice => "oof",
            Self::Free => "free",
            Self::WorkingElsewhere => "workingElsewhere",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for BusyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A blocking (or at least status-tagged) interval on the organizer's calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyPeriod {
    pub interval: Interval,
    pub status: BusyStatus,
}

impl BusyPeriod {
    pub fn new(interval: Interval, status: BusyStatus) -> Self {
        Self { interval, status }
    }

    pub fn is_blocking(&self) -> bool {
        self.status.is_blocking()
    }
}

/// `{ "dateTime": "...", "timeZone": "..." }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeTimeZone {
    pub date_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

/// One entry of a schedule's `scheduleItems`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItem {
    #[serde(default)]
    pub status: String,
    pub start: DateTimeTimeZone,
    pub end: DateTimeTimeZone,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_private: Option<bool>,
}

/// Free/busy information for one schedule (one mailbox).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInformation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_view: Option<String>,
    #[serde(default, deserialize_with = "lenient_items")]
    pub schedule_items: Vec<ScheduleItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

/// Deserialize items one by one so a structurally broken entry drops only
/// itself.
fn lenient_items<'de, D>(deserializer: D) -> Result<Vec<ScheduleItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(err) => {
                tracing::warn!(index, %err, "skipping malformed schedule item");
                None
            }
        })
        .collect())
}

/// Body of a `getSchedule` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleResponse {
    #[serde(default)]
    pub value: Vec<ScheduleInformation>,
}

impl ScheduleResponse {
    /// Items of the first (and only) requested schedule.
    pub fn items(&self) -> &[ScheduleItem] {
        self.value
            .first()
            .map(|info| info.schedule_items.as_slice())
            .unwrap_or(&[])
    }
}

/// Parse one schedule item into a busy period in `offset`.
pub fn parse_item(
    index: usize,
    item: &ScheduleItem,
    offset: FixedOffset,
) -> Result<BusyPeriod, AvailabilityError> {
    let malformed = |reason: String| AvailabilityError::MalformedScheduleItem { index, reason };

    let start = parse_instant(&item.start.date_time, offset)
        .map_err(|_| malformed(format!("unparsable start '{}'", item.start.date_time)))?;
    let end = parse_instant(&item.end.date_time, offset)
        .map_err(|_| malformed(format!("unparsable end '{}'", item.end.date_time)))?;
    let interval = Interval::new(start, end).map_err(|e| malformed(e.to_string()))?;

    Ok(BusyPeriod::new(interval, BusyStatus::parse(&item.status)))
}

/// Extract blocking periods sorted by start (stable for equal starts).
pub fn extract(schedule: &ScheduleResponse, offset: FixedOffset) -> Vec<BusyPeriod> {
    let mut periods: Vec<BusyPeriod> = schedule
        .items()
        .iter()
        .enumerate()
        .filter(|(_, item)| BusyStatus::parse(&item.status).is_blocking())
        .filter_map(|(index, item)| match parse_item(index, item, offset) {
            Ok(period) => Some(period),
            Err(err) => {
                tracing::warn!(%err, "skipping schedule item");
                None
            }
        })
        .collect();

    periods.sort_by_key(|p| p.interval.start());
    periods
}

/// Extract from an untyped payload. A payload that does not have the
/// schedule shape yields no periods.
pub fn extract_value(payload: &serde_json::Value, offset: FixedOffset) -> Vec<BusyPeriod> {
    match serde_json::from_value::<ScheduleResponse>(payload.clone()) {
        Ok(schedule) => extract(&schedule, offset),
        Err(err) => {
            tracing::warn!(%err, "schedule payload has unexpected shape");
            Vec::new()
        }
    }
}
