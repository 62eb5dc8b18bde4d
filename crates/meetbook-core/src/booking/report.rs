//! Result types returned by [`BookingService`](super::BookingService).
//!
//! Each serializes to camelCase JSON for machine consumers and implements
//! `Display` for the short text a chat surface would show.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::availability::{BusyPeriod, FreeSlot};

/// One offered slot, flattened for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotView {
    pub start: String,
    pub end: String,
    pub max_end: String,
    pub duration_min: i64,
    pub start_time: String,
    pub end_time: String,
}

impl From<&FreeSlot> for SlotView {
    fn from(slot: &FreeSlot) -> Self {
        Self {
            start: slot.start().to_rfc3339(),
            end: slot.end().to_rfc3339(),
            max_end: slot.max_end.to_rfc3339(),
            duration_min: slot.duration_min,
            start_time: slot.start_time(),
            end_time: slot.end_time(),
        }
    }
}

/// A busy period that overlaps a proposed booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictView {
    pub start: String,
    pub end: String,
    pub status: String,
}

impl From<&BusyPeriod> for ConflictView {
    fn from(period: &BusyPeriod) -> Self {
        Self {
            start: period.interval.start().to_rfc3339(),
            end: period.interval.end().to_rfc3339(),
            status: period.status.as_str().to_string(),
        }
    }
}

/// Free slots for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotListing {
    pub date: String,
    pub timezone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_hours: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_duration: Option<i64>,
    pub slots: Vec<SlotView>,
    pub total_count: usize,
    /// The calendar could not be read and was treated as empty.
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SlotListing {
    pub(crate) fn failed(date: &str, timezone: &str, error: String) -> Self {
        Self {
            date: date.to_string(),
            timezone: timezone.to_string(),
            working_hours: None,
            requested_duration: None,
            slots: Vec::new(),
            total_count: 0,
            degraded: false,
            error: Some(error),
        }
    }
}

impl fmt::Display for SlotListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(error) = &self.error {
            return write!(f, "{error}");
        }
        if self.slots.is_empty() {
            write!(f, "No available slots on {}", self.date)?;
        } else {
            writeln!(
                f,
                "{} available slot(s) on {} ({}, {}):",
                self.total_count,
                self.date,
                self.working_hours.as_deref().unwrap_or("-"),
                self.timezone
            )?;
            for (i, slot) in self.slots.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                write!(
                    f,
                    "  {} - {} ({} min)",
                    slot.start_time, slot.end_time, slot.duration_min
                )?;
            }
        }
        if self.degraded {
            write!(f, "\n(calendar unavailable, showing the full working day)")?;
        }
        Ok(())
    }
}

/// Whether one proposed time is free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityReport {
    pub date: String,
    pub start_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<i64>,
    pub is_available: bool,
    pub conflicts: Vec<ConflictView>,
    pub message: String,
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AvailabilityReport {
    pub(crate) fn failed(date: &str, start_time: &str, error: String) -> Self {
        Self {
            date: date.to_string(),
            start_time: start_time.to_string(),
            end_time: None,
            duration_min: None,
            is_available: false,
            conflicts: Vec::new(),
            message: error.clone(),
            degraded: false,
            error: Some(error),
        }
    }
}

impl fmt::Display for AvailabilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.error.is_some() {
            return write!(f, "{}", self.message);
        }
        write!(
            f,
            "{} {}-{}: {}",
            self.date,
            self.start_time,
            self.end_time.as_deref().unwrap_or("?"),
            self.message
        )?;
        for conflict in &self.conflicts {
            write!(
                f,
                "\n  {} {} - {}",
                conflict.status, conflict.start, conflict.end
            )?;
        }
        if self.degraded {
            write!(f, "\n(calendar unavailable, conflicts could not be checked)")?;
        }
        Ok(())
    }
}

/// Result of a booking attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_link: Option<String>,
    pub meeting_title: String,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    pub timezone: String,
    pub attendees: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub conflicts: Vec<ConflictView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl fmt::Display for BookingOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.success {
            write!(
                f,
                "{}",
                self.error.as_deref().unwrap_or("Booking was not completed")
            )?;
            for conflict in &self.conflicts {
                write!(
                    f,
                    "\n  {} {} - {}",
                    conflict.status, conflict.start, conflict.end
                )?;
            }
            return Ok(());
        }

        write!(
            f,
            "{}",
            self.message.as_deref().unwrap_or("Meeting booked.")
        )?;
        if let Some(url) = &self.join_url {
            write!(f, "\nJoin: {url}")?;
        }
        if let Some(link) = &self.calendar_link {
            write!(f, "\nCalendar: {link}")?;
        }
        if let Some(id) = &self.booking_id {
            write!(f, "\nBooking id: {id}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_serializes_camel_case() {
        let listing = SlotListing {
            date: "2025-10-20".into(),
            timezone: "Arabian Standard Time".into(),
            working_hours: Some("09:00 - 18:00".into()),
            requested_duration: Some(30),
            slots: Vec::new(),
            total_count: 0,
            degraded: false,
            error: None,
        };
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["totalCount"], 0);
        assert_eq!(json["workingHours"], "09:00 - 18:00");
        assert!(json.get("error").is_none());
        assert_eq!(listing.to_string(), "No available slots on 2025-10-20");
    }

    #[test]
    fn failed_report_is_unavailable() {
        let report = AvailabilityReport::failed("2025-10-20", "10:00", "boom".into());
        assert!(!report.is_available);
        assert_eq!(report.to_string(), "boom");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["isAvailable"], false);
        assert_eq!(json["error"], "boom");
    }
}
