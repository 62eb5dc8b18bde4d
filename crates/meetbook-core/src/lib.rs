//! # Meetbook Core Library
//!
//! This library provides the core logic for meetbook: finding free time on
//! an organizer's calendar and booking Teams meetings into it. All
//! operations are available through the standalone `meetbook` CLI, which is
//! a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Availability**: Pure engine that resolves day windows, extracts busy
//!   periods from a schedule response, generates free slots and checks
//!   conflicts
//! - **Integrations**: Microsoft Graph client behind the [`CalendarBackend`]
//!   trait, with OAuth2 client-credentials and keyring-backed secrets
//! - **Booking**: [`BookingService`] orchestrating engine and backend into
//!   structured results
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`generate`]: Free slot generator
//! - [`check`]: Conflict checker
//! - [`BookingService`]: List, check and book operations
//! - [`Config`]: Application configuration management

pub mod availability;
pub mod booking;
pub mod error;
pub mod integrations;
pub mod storage;

pub use availability::{
    check, extract, generate, generate_all, resolve, BusyPeriod, BusyStatus, ConflictSet,
    DayWindow, FreeSlot, Instant, Interval, ScheduleResponse,
};
pub use booking::{
    next_business_days, AvailabilityQuery, AvailabilityReport, BookingOutcome, BookingRequest,
    BookingService, SlotListing, SlotQuery,
};
pub use error::{AvailabilityError, ConfigError, CoreError, GraphError};
pub use integrations::{CalendarBackend, GraphClient};
pub use storage::Config;
