//! Availability engine.
//!
//! This module provides:
//! - Day window resolution for a date and working hours
//! - Busy period extraction from a `getSchedule` response
//! - Free slot generation between busy periods
//! - Conflict checks for a proposed booking
//!
//! Everything here is pure and synchronous.

pub mod busy;
pub mod conflict;
pub mod interval;
pub mod slots;
pub mod window;

pub use busy::{
    extract, extract_value, parse_item, BusyPeriod, BusyStatus, DateTimeTimeZone, ScheduleInformation,
    ScheduleItem, ScheduleResponse,
};
pub use conflict::{check, ConflictSet};
pub use interval::{Instant, Interval};
pub use slots::{generate, generate_all, generate_in, FreeSlot};
pub use window::{resolve, resolve_with, DayWindow};
