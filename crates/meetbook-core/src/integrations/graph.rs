//! Microsoft Graph calendar client.
//!
//! Reads the organizer's free/busy schedule and creates Teams meetings on
//! their calendar. Uses the OAuth2 client-credentials flow; every request
//! is bounded by the configured timeout.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::keyring_store;
use super::oauth::{ClientCredentials, TokenCache, GRAPH_DEFAULT_SCOPE};
use super::traits::CalendarBackend;
use crate::availability::{Instant, ScheduleResponse};
use crate::error::GraphError;
use crate::storage::{Config, GraphConfig};

/// Keyring entry holding the app registration secret.
pub const CLIENT_SECRET_KEY: &str = "graph_client_secret";

const JOIN_URL_PATHS: &[&[&str]] = &[
    &["onlineMeeting", "joinUrl"],
    &["onlineMeeting", "joinWebUrl"],
    &["joinUrl"],
    &["joinInformation", "joinUrl"],
    &["joinWebUrl"],
];

/// Bounds of a `getSchedule` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleQuery {
    pub start: Instant,
    pub end: Instant,
    /// Granularity of the availability view, clamped to 5-60 minutes.
    pub interval_min: i64,
}

impl ScheduleQuery {
    pub fn new(start: Instant, end: Instant, interval_min: i64) -> Self {
        Self {
            start,
            end,
            interval_min: interval_min.clamp(5, 60),
        }
    }
}

/// Event to create on the organizer's calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub subject: String,
    pub body_html: String,
    pub start: Instant,
    pub end: Instant,
    pub attendees: Vec<String>,
    /// Sent as `transactionId`; the service drops duplicates with the same id.
    pub transaction_id: String,
}

/// Fields of a created event the booking layer cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEvent {
    pub id: String,
    pub subject: Option<String>,
    pub web_link: Option<String>,
    pub join_url: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub attendees: Vec<String>,
}

impl CreatedEvent {
    /// Read an event resource.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, GraphError> {
        let id = value["id"]
            .as_str()
            .ok_or_else(|| GraphError::Decode("missing event id in response".into()))?
            .to_string();

        let attendees = value["attendees"]
            .as_array()
            .map(|list| {
                list.iter()
                    .filter_map(|a| a["emailAddress"]["address"].as_str())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            id,
            subject: value["subject"].as_str().map(String::from),
            web_link: value["webLink"].as_str().map(String::from),
            join_url: find_join_url(value),
            start: value["start"]["dateTime"].as_str().map(String::from),
            end: value["end"]["dateTime"].as_str().map(String::from),
            attendees,
        })
    }
}

/// Organizer profile returned by `GET /users/{upn}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizerProfile {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub user_principal_name: Option<String>,
    #[serde(default)]
    pub mail: Option<String>,
}

impl OrganizerProfile {
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.user_principal_name.as_deref())
            .unwrap_or("(unknown)")
    }
}

/// First `https://` join URL found on an event or online meeting resource.
pub fn find_join_url(value: &serde_json::Value) -> Option<String> {
    JOIN_URL_PATHS.iter().find_map(|path| {
        path.iter()
            .try_fold(value, |node, key| node.get(*key))
            .and_then(|v| v.as_str())
            .filter(|url| url.starts_with("https://"))
            .map(String::from)
    })
}

/// Microsoft Graph implementation of [`CalendarBackend`].
pub struct GraphClient {
    http: Client,
    settings: GraphConfig,
    credentials: ClientCredentials,
    timezone: String,
    tokens: TokenCache,
}

impl GraphClient {
    /// Build a client from explicit settings. `settings.client_secret`
    /// must be present.
    pub fn new(settings: GraphConfig, timezone: &str) -> Result<Self, GraphError> {
        let missing = settings.missing();
        if !missing.is_empty() {
            return Err(GraphError::NotConfigured { missing });
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| GraphError::Transport(e.to_string()))?;

        let credentials = ClientCredentials {
            authority: settings.authority.clone(),
            tenant_id: settings.tenant_id.clone(),
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone().unwrap_or_default(),
            scopes: vec![GRAPH_DEFAULT_SCOPE.to_string()],
        };

        Ok(Self {
            http,
            settings,
            credentials,
            timezone: timezone.to_string(),
            tokens: TokenCache::new(),
        })
    }

    /// Build from application config, falling back to the OS keyring for
    /// the client secret.
    pub fn from_config(config: &Config) -> Result<Self, GraphError> {
        let mut settings = config.graph.clone();
        if settings.client_secret.is_none() {
            settings.client_secret = keyring_store::get(CLIENT_SECRET_KEY).ok().flatten();
        }
        Self::new(settings, &config.timezone.name)
    }

    pub fn organizer(&self) -> &str {
        &self.settings.organizer_upn
    }

    fn user_url(&self, suffix: &str) -> String {
        format!(
            "{}/users/{}{}",
            self.settings.api_base.trim_end_matches('/'),
            urlencoding::encode(&self.settings.organizer_upn),
            suffix
        )
    }

    fn map_transport(&self, err: reqwest::Error) -> GraphError {
        if err.is_timeout() {
            GraphError::Timeout {
                timeout_secs: self.settings.timeout_secs,
            }
        } else {
            GraphError::from(err)
        }
    }

    /// Attach auth (and optionally the timezone preference), send, and
    /// decode a JSON body. Non-2xx statuses become [`GraphError::Http`].
    async fn send_json(
        &self,
        request: RequestBuilder,
        with_timezone: bool,
    ) -> Result<serde_json::Value, GraphError> {
        let token = self.tokens.access_token(&self.http, &self.credentials).await?;
        let mut request = request.bearer_auth(token);
        if with_timezone {
            request = request.header("Prefer", format!("outlook.timezone=\"{}\"", self.timezone));
        }

        let resp = request.send().await.map_err(|e| self.map_transport(e))?;
        let status = resp.status();
        if !status.is_success() {
            if status == reqwest::StatusCode::UNAUTHORIZED {
                self.tokens.clear().await;
            }
            let body = resp.text().await.unwrap_or_default();
            return Err(GraphError::Http {
                status: status.as_u16(),
                body,
            });
        }

        resp.json().await.map_err(|e| self.map_transport(e))
    }

    /// Wall-clock form the service expects next to an explicit `timeZone`.
    fn local(instant: &Instant) -> String {
        instant.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

impl CalendarBackend for GraphClient {
    fn name(&self) -> &str {
        "graph"
    }

    async fn get_schedule(&self, query: &ScheduleQuery) -> Result<ScheduleResponse, GraphError> {
        let body = json!({
            "schedules": [self.settings.organizer_upn],
            "startTime": {"dateTime": Self::local(&query.start), "timeZone": self.timezone},
            "endTime": {"dateTime": Self::local(&query.end), "timeZone": self.timezone},
            "availabilityViewInterval": query.interval_min.clamp(5, 60),
        });
        tracing::debug!(%body, "getSchedule request");

        let request = self.http.post(self.user_url("/calendar/getSchedule")).json(&body);
        let value = self.send_json(request, true).await?;
        serde_json::from_value(value).map_err(|e| GraphError::Decode(e.to_string()))
    }

    async fn create_event(&self, event: &NewEvent) -> Result<CreatedEvent, GraphError> {
        let attendees: Vec<_> = event
            .attendees
            .iter()
            .map(|email| json!({"emailAddress": {"address": email}, "type": "required"}))
            .collect();

        let body = json!({
            "subject": event.subject,
            "body": {"contentType": "HTML", "content": event.body_html},
            "start": {"dateTime": Self::local(&event.start), "timeZone": self.timezone},
            "end": {"dateTime": Self::local(&event.end), "timeZone": self.timezone},
            "attendees": attendees,
            "allowNewTimeProposals": true,
            "isOnlineMeeting": true,
            "onlineMeetingProvider": "teamsForBusiness",
            "transactionId": event.transaction_id,
        });
        tracing::debug!(subject = %event.subject, transaction_id = %event.transaction_id, "create event request");

        let request = self.http.post(self.user_url("/events")).json(&body);
        let value = self.send_json(request, true).await?;
        CreatedEvent::from_value(&value)
    }

    async fn create_online_meeting(
        &self,
        subject: &str,
        start: Instant,
        end: Instant,
    ) -> Result<serde_json::Value, GraphError> {
        let body = json!({
            "subject": subject,
            "startDateTime": start.to_rfc3339(),
            "endDateTime": end.to_rfc3339(),
        });
        tracing::debug!(%body, "create online meeting request");

        let request = self.http.post(self.user_url("/onlineMeetings")).json(&body);
        self.send_json(request, false).await
    }

    async fn profile(&self) -> Result<OrganizerProfile, GraphError> {
        let request = self.http.get(self.user_url(""));
        let value = self.send_json(request, false).await?;
        serde_json::from_value(value).map_err(|e| GraphError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_refuses_incomplete_settings() {
        let settings = GraphConfig {
            tenant_id: "t".into(),
            ..GraphConfig::default()
        };
        match GraphClient::new(settings, "UTC") {
            Err(GraphError::NotConfigured { missing }) => {
                assert!(missing.contains(&"graph.client_id".to_string()));
                assert!(!missing.contains(&"graph.tenant_id".to_string()));
            }
            _ => panic!("expected NotConfigured"),
        }
    }

    #[test]
    fn schedule_query_clamps_interval() {
        let now = chrono::Utc::now().fixed_offset();
        assert_eq!(ScheduleQuery::new(now, now, 240).interval_min, 60);
        assert_eq!(ScheduleQuery::new(now, now, 1).interval_min, 5);
    }

    #[test]
    fn join_url_lookup_order() {
        let event = json!({
            "onlineMeeting": {"joinUrl": "https://teams.microsoft.com/l/meetup-join/abc"},
            "joinUrl": "https://elsewhere.example/xyz",
        });
        assert_eq!(
            find_join_url(&event).as_deref(),
            Some("https://teams.microsoft.com/l/meetup-join/abc")
        );

        let standalone = json!({"joinInformation": {"joinUrl": "https://teams.microsoft.com/l/j/1"}});
        assert_eq!(
            find_join_url(&standalone).as_deref(),
            Some("https://teams.microsoft.com/l/j/1")
        );

        let web_only = json!({"joinWebUrl": "https://teams.microsoft.com/l/w/2"});
        assert_eq!(
            find_join_url(&web_only).as_deref(),
            Some("https://teams.microsoft.com/l/w/2")
        );

        let none = json!({"onlineMeeting": null, "joinUrl": "not-a-url"});
        assert_eq!(find_join_url(&none), None);
    }

    #[test]
    fn created_event_reads_graph_fields() {
        let value = json!({
            "id": "AAMk-1",
            "subject": "Intro - Sarah",
            "webLink": "https://outlook.office365.com/owa/?itemid=AAMk-1",
            "start": {"dateTime": "2025-10-20T10:00:00.0000000", "timeZone": "Arabian Standard Time"},
            "end": {"dateTime": "2025-10-20T10:30:00.0000000", "timeZone": "Arabian Standard Time"},
            "attendees": [{"emailAddress": {"address": "sarah@example.com"}, "type": "required"}],
            "onlineMeeting": {"joinUrl": "https://teams.microsoft.com/l/meetup-join/1"},
        });
        let event = CreatedEvent::from_value(&value).unwrap();
        assert_eq!(event.id, "AAMk-1");
        assert_eq!(event.attendees, vec!["sarah@example.com"]);
        assert!(event.join_url.is_some());
        assert!(CreatedEvent::from_value(&json!({"subject": "x"})).is_err());
    }
}
