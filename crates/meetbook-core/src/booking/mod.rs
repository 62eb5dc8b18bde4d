//! Booking orchestration.
//!
//! [`BookingService`] ties the availability engine to a [`CalendarBackend`]:
//! it lists free slots, checks a proposed time, and books meetings. Remote
//! failures never escape as errors; they come back as structured results
//! with an `error` message or a `degraded` flag.

mod report;

pub use report::{AvailabilityReport, BookingOutcome, ConflictView, SlotListing, SlotView};

use chrono::{Datelike, Days, FixedOffset, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::availability::window::combine;
use crate::availability::{
    check, extract, generate, generate_all, resolve, BusyPeriod, Instant, Interval,
};
use crate::error::{AvailabilityError, ConfigError, CoreError};
use crate::integrations::graph::find_join_url;
use crate::integrations::{CalendarBackend, NewEvent, ScheduleQuery};
use crate::storage::Config;

/// View interval used when only one proposed slot is fetched.
const CHECK_VIEW_INTERVAL_MIN: i64 = 15;

/// Request for [`BookingService::list_available_slots`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotQuery {
    pub date: String,
    #[serde(default)]
    pub duration_min: Option<i64>,
    #[serde(default)]
    pub working_start: Option<i32>,
    #[serde(default)]
    pub working_end: Option<i32>,
    /// Enumerate every slot in each gap, `step_min` apart.
    #[serde(default)]
    pub step_min: Option<i64>,
}

/// Request for [`BookingService::check_specific_time_availability`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub date: String,
    pub start_time: String,
    #[serde(default)]
    pub duration_min: Option<i64>,
}

/// Request for [`BookingService::book_meeting_slot`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub meeting_title: String,
    pub date: String,
    pub start_time: String,
    #[serde(default)]
    pub duration_min: Option<i64>,
    #[serde(default)]
    pub notes: String,
    /// Reuse on retries to avoid double bookings.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

impl BookingRequest {
    /// `"{title} - {name}"`
    pub fn subject(&self) -> String {
        format!("{} - {}", self.meeting_title.trim(), self.customer_name.trim())
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.customer_name.trim().is_empty() {
            return Err(CoreError::InvalidRequest("customer name is required".into()));
        }
        if self.meeting_title.trim().is_empty() {
            return Err(CoreError::InvalidRequest("meeting title is required".into()));
        }
        let email = self.customer_email.trim();
        if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
            return Err(CoreError::InvalidRequest(format!(
                "'{}' is not an email address",
                self.customer_email
            )));
        }
        Ok(())
    }

    fn body_html(&self, subject: &str) -> String {
        let mut body = format!("<p>Booked via meetbook: {}</p>", escape_html(subject));
        let notes = self.notes.trim();
        if !notes.is_empty() {
            body.push_str(&format!("<p>Notes: {}</p>", escape_html(notes)));
        }
        body
    }
}

/// Stable transaction id for a booking: the same subject, start and
/// attendees always map to the same key.
pub fn idempotency_key(subject: &str, start: &Instant, attendees: &[String]) -> String {
    let name = format!("{}|{}|{}", subject, start.to_rfc3339(), attendees.join(","));
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}

/// The next `count` weekdays strictly after `from`.
pub fn next_business_days(from: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut current = from;
    while days.len() < count {
        let Some(next) = current.checked_add_days(Days::new(1)) else {
            break;
        };
        current = next;
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            days.push(current);
        }
    }
    days
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Busy periods for a fetch, plus whether they were assumed.
struct Fetched {
    busy: Vec<BusyPeriod>,
    degraded: bool,
}

/// Lists, checks and books meetings on one organizer's calendar.
pub struct BookingService<B: CalendarBackend> {
    config: Config,
    offset: FixedOffset,
    backend: B,
}

impl<B: CalendarBackend> BookingService<B> {
    /// # Errors
    ///
    /// Returns an error if the configuration does not validate.
    pub fn new(config: Config, backend: B) -> Result<Self, ConfigError> {
        config.validate()?;
        let offset = config.offset()?;
        Ok(Self {
            config,
            offset,
            backend,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn timezone(&self) -> &str {
        &self.config.timezone.name
    }

    /// Durations for a specific slot must already be within policy.
    fn checked_duration(&self, requested: Option<i64>) -> Result<i64, AvailabilityError> {
        let policy = &self.config.availability;
        let minutes = requested.unwrap_or(policy.default_duration);
        if (policy.min_duration..=policy.max_duration).contains(&minutes) {
            Ok(minutes)
        } else {
            Err(AvailabilityError::InvalidDuration { minutes })
        }
    }

    async fn fetch_busy(
        &self,
        start: Instant,
        end: Instant,
        interval_min: i64,
    ) -> Result<Fetched, CoreError> {
        let query = ScheduleQuery::new(start, end, interval_min);
        match self.backend.get_schedule(&query).await {
            Ok(schedule) => Ok(Fetched {
                busy: extract(&schedule, self.offset),
                degraded: false,
            }),
            Err(err) if self.config.availability.assume_free_on_upstream_error => {
                tracing::warn!(
                    backend = self.backend.name(),
                    error = %err,
                    "schedule fetch failed, treating calendar as free"
                );
                Ok(Fetched {
                    busy: Vec::new(),
                    degraded: true,
                })
            }
            Err(err) => Err(CoreError::UpstreamUnavailable(err.to_string())),
        }
    }

    /// Free slots on `query.date` inside working hours.
    ///
    /// The duration is clamped into the configured bounds; hours are
    /// clamped as by the window resolver.
    pub async fn list_available_slots(&self, query: &SlotQuery) -> SlotListing {
        match self.try_list_available_slots(query).await {
            Ok(listing) => listing,
            Err(err) => {
                tracing::warn!(date = %query.date, error = %err, "listing slots failed");
                SlotListing::failed(
                    &query.date,
                    self.timezone(),
                    format!("Failed to retrieve schedule: {err}"),
                )
            }
        }
    }

    async fn try_list_available_slots(&self, query: &SlotQuery) -> Result<SlotListing, CoreError> {
        let policy = &self.config.availability;
        let duration = policy.clamp_duration(query.duration_min.unwrap_or(policy.default_duration));
        let hours = &self.config.working_hours;
        let window = resolve(
            &query.date,
            self.offset,
            query.working_start.unwrap_or(hours.start_hour),
            query.working_end.unwrap_or(hours.end_hour),
        )?;

        let fetched = self
            .fetch_busy(window.start(), window.end(), duration.clamp(15, 60))
            .await?;
        let slots = match query.step_min {
            Some(step) => generate_all(&window, &fetched.busy, duration, step)?,
            None => generate(&window, &fetched.busy, duration)?,
        };
        tracing::debug!(
            date = %window.date,
            busy = fetched.busy.len(),
            slots = slots.len(),
            "generated free slots"
        );

        let slots: Vec<SlotView> = slots.iter().map(SlotView::from).collect();
        Ok(SlotListing {
            date: window.date.format("%Y-%m-%d").to_string(),
            timezone: self.timezone().to_string(),
            working_hours: Some(window.label()),
            requested_duration: Some(duration),
            total_count: slots.len(),
            slots,
            degraded: fetched.degraded,
            error: None,
        })
    }

    /// Whether `[date start_time, + duration)` is free.
    pub async fn check_specific_time_availability(
        &self,
        query: &AvailabilityQuery,
    ) -> AvailabilityReport {
        match self.try_check(query).await {
            Ok(report) => report,
            Err(err) => {
                tracing::warn!(date = %query.date, start = %query.start_time, error = %err, "availability check failed");
                AvailabilityReport::failed(
                    &query.date,
                    &query.start_time,
                    format!("Failed to check availability: {err}"),
                )
            }
        }
    }

    async fn try_check(&self, query: &AvailabilityQuery) -> Result<AvailabilityReport, CoreError> {
        let duration = self.checked_duration(query.duration_min)?;
        let start = combine(&query.date, &query.start_time, self.offset)?;
        let proposed = Interval::starting_at(start, duration)?;

        let fetched = self
            .fetch_busy(proposed.start(), proposed.end(), CHECK_VIEW_INTERVAL_MIN)
            .await?;
        let conflicts = check(&proposed, &fetched.busy);

        let message = if conflicts.is_available() {
            "Time slot is available".to_string()
        } else {
            format!(
                "Time slot conflicts with {} existing appointment(s)",
                conflicts.len()
            )
        };

        Ok(AvailabilityReport {
            date: query.date.clone(),
            start_time: proposed.start().format("%H:%M").to_string(),
            end_time: Some(proposed.end().format("%H:%M").to_string()),
            duration_min: Some(duration),
            is_available: conflicts.is_available(),
            conflicts: conflicts.conflicts.iter().map(ConflictView::from).collect(),
            message,
            degraded: fetched.degraded,
            error: None,
        })
    }

    /// Book a Teams meeting if the requested time is still free.
    pub async fn book_meeting_slot(&self, request: &BookingRequest) -> BookingOutcome {
        match self.try_book(request).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(
                    date = %request.date,
                    start = %request.start_time,
                    error = %err,
                    "booking failed"
                );
                self.outcome(request, false, Some(format!("Booking failed: {err}")))
            }
        }
    }

    async fn try_book(&self, request: &BookingRequest) -> Result<BookingOutcome, CoreError> {
        request.validate()?;
        let duration = self.checked_duration(request.duration_min)?;
        let start = combine(&request.date, &request.start_time, self.offset)?;
        let proposed = Interval::starting_at(start, duration)?;

        let fetched = self
            .fetch_busy(proposed.start(), proposed.end(), CHECK_VIEW_INTERVAL_MIN)
            .await?;
        let conflicts = check(&proposed, &fetched.busy);
        if !conflicts.is_available() {
            tracing::info!(
                date = %request.date,
                start = %request.start_time,
                conflicts = conflicts.len(),
                "requested slot is taken"
            );
            let mut outcome = self.outcome(
                request,
                false,
                Some(format!(
                    "Time slot conflicts with {} existing appointment(s)",
                    conflicts.len()
                )),
            );
            outcome.conflicts = conflicts.conflicts.iter().map(ConflictView::from).collect();
            return Ok(outcome);
        }

        let subject = request.subject();
        let attendees = vec![request.customer_email.trim().to_string()];
        let transaction_id = request
            .idempotency_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .unwrap_or_else(|| idempotency_key(&subject, &proposed.start(), &attendees));

        let event = NewEvent {
            subject: subject.clone(),
            body_html: request.body_html(&subject),
            start: proposed.start(),
            end: proposed.end(),
            attendees: attendees.clone(),
            transaction_id: transaction_id.clone(),
        };
        let created = self.backend.create_event(&event).await?;

        let join_url = match created.join_url.clone() {
            Some(url) => Some(url),
            None => self.fallback_join_url(&subject, &proposed).await,
        };

        tracing::info!(
            booking_id = %created.id,
            subject = %subject,
            start = %proposed.start(),
            "meeting booked"
        );

        let mut outcome = self.outcome(request, true, None);
        outcome.booking_id = Some(created.id);
        outcome.join_url = join_url;
        outcome.calendar_link = created.web_link;
        outcome.start_time = Some(
            created
                .start
                .unwrap_or_else(|| proposed.start().to_rfc3339()),
        );
        outcome.end_time = Some(created.end.unwrap_or_else(|| proposed.end().to_rfc3339()));
        if !created.attendees.is_empty() {
            outcome.attendees = created.attendees;
        }
        outcome.message = Some(format!(
            "Meeting '{}' successfully booked for {} at {}.",
            subject, request.date, request.start_time
        ));
        outcome.idempotency_key = Some(transaction_id);
        outcome.degraded = fetched.degraded;
        Ok(outcome)
    }

    /// Join URL from a standalone online meeting. Failures are logged and
    /// the booking stands without a link.
    async fn fallback_join_url(&self, subject: &str, slot: &Interval) -> Option<String> {
        match self
            .backend
            .create_online_meeting(subject, slot.start(), slot.end())
            .await
        {
            Ok(meeting) => {
                let url = find_join_url(&meeting);
                if url.is_none() {
                    tracing::warn!("standalone online meeting returned no join URL");
                }
                url
            }
            Err(err) => {
                tracing::warn!(error = %err, "fallback meeting creation failed");
                None
            }
        }
    }

    fn outcome(&self, request: &BookingRequest, success: bool, error: Option<String>) -> BookingOutcome {
        BookingOutcome {
            success,
            booking_id: None,
            join_url: None,
            calendar_link: None,
            meeting_title: request.subject(),
            customer_name: request.customer_name.clone(),
            customer_email: request.customer_email.clone(),
            start_time: None,
            end_time: None,
            timezone: self.timezone().to_string(),
            attendees: vec![request.customer_email.trim().to_string()],
            message: None,
            conflicts: Vec::new(),
            idempotency_key: None,
            degraded: false,
            error,
        }
    }
}
