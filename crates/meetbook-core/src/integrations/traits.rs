use std::future::Future;

use super::graph::{CreatedEvent, NewEvent, OrganizerProfile, ScheduleQuery};
use crate::availability::{Instant, ScheduleResponse};
use crate::error::GraphError;

/// Remote calendar the booking layer reads schedules from and writes
/// events to. Implementations are stateless between calls apart from
/// credential caching.
pub trait CalendarBackend: Send + Sync {
    /// Unique identifier (e.g. "graph").
    fn name(&self) -> &str;

    /// Free/busy items of the organizer between the query bounds.
    fn get_schedule(
        &self,
        query: &ScheduleQuery,
    ) -> impl Future<Output = Result<ScheduleResponse, GraphError>> + Send;

    /// Create an event with an online meeting attached.
    fn create_event(
        &self,
        event: &NewEvent,
    ) -> impl Future<Output = Result<CreatedEvent, GraphError>> + Send;

    /// Create a standalone online meeting. Used when an event came back
    /// without a join URL.
    fn create_online_meeting(
        &self,
        subject: &str,
        start: Instant,
        end: Instant,
    ) -> impl Future<Output = Result<serde_json::Value, GraphError>> + Send;

    /// Organizer profile, used as a connectivity check.
    fn profile(&self) -> impl Future<Output = Result<OrganizerProfile, GraphError>> + Send;
}
