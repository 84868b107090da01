use crate::config::toml_config::CalendarConfig;
use crate::core::cache::Clock;
use crate::core::calendar::derive_status;
use crate::core::vacation::VacationEvent;
use crate::domain::model::{CalendarEvent, CalendarMetadata, CalendarStatus};
use crate::domain::ports::CalendarStatusSource;
use crate::utils::error::{PatrolError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, SecondsFormat, Utc};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const SERVICE: &str = "Google Calendar";

/// Status lookups look 6h back (long shifts) and 14 days ahead (weekend shifts).
pub const STATUS_LOOKBACK_HOURS: i64 = 6;
pub const STATUS_LOOKAHEAD_DAYS: i64 = 14;
pub const STATUS_MAX_RESULTS: u32 = 50;
pub const SCHEDULE_MAX_RESULTS: u32 = 100;

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    items: Vec<CalendarEvent>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertedEvent {
    pub id: String,
    pub html_link: Option<String>,
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub struct GoogleCalendarClient {
    client: Client,
    api_base: String,
    calendar_id: String,
    api_key: String,
    offset: FixedOffset,
    timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl GoogleCalendarClient {
    pub fn new(config: &CalendarConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            api_base: config.api_base().trim_end_matches('/').to_string(),
            calendar_id: config.calendar_id.clone(),
            api_key: config.api_key.clone(),
            offset: config.offset()?,
            timeout: Duration::from_secs(config.timeout_seconds()),
            clock,
        })
    }

    pub fn offset(&self) -> &FixedOffset {
        &self.offset
    }

    /// `{api_base}/{calendar_id}/{suffix...}` with each segment percent-encoded.
    fn calendar_url(&self, calendar_id: &str, suffix: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.api_base).map_err(|e| PatrolError::InvalidConfigValueError {
            field: "calendar.api_base".to_string(),
            value: self.api_base.clone(),
            reason: e.to_string(),
        })?;
        url.path_segments_mut()
            .map_err(|_| PatrolError::config("calendar.api_base cannot be a base URL"))?
            .pop_if_empty()
            .push(calendar_id)
            .extend(suffix);
        Ok(url)
    }

    fn map_send_error(&self, e: reqwest::Error) -> PatrolError {
        if e.is_timeout() {
            PatrolError::Timeout {
                service: SERVICE.to_string(),
                seconds: self.timeout.as_secs(),
            }
        } else {
            PatrolError::ApiError(e)
        }
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(PatrolError::UpstreamStatus {
            service: SERVICE.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    pub async fn list_events(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        max_results: u32,
    ) -> Result<Vec<CalendarEvent>> {
        let url = self.calendar_url(&self.calendar_id, &["events"])?;
        tracing::debug!("Listing calendar events {} .. {}", time_min, time_max);

        let response = self
            .client
            .get(url)
            .query(&[
                ("key", self.api_key.clone()),
                ("timeMin", rfc3339(time_min)),
                ("timeMax", rfc3339(time_max)),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
                ("maxResults", max_results.to_string()),
            ])
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let body = Self::check(response)
            .await?
            .text()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let events: EventsResponse = serde_json::from_str(&body)?;
        tracing::debug!("Calendar returned {} events", events.items.len());
        Ok(events.items)
    }

    pub async fn metadata(&self) -> Result<CalendarMetadata> {
        let url = self.calendar_url(&self.calendar_id, &[])?;
        let response = self
            .client
            .get(url)
            .query(&[("key", self.api_key.as_str())])
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let body = Self::check(response)
            .await?
            .text()
            .await
            .map_err(|e| self.map_send_error(e))?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Requires an OAuth access token with calendar write scope.
    pub async fn insert_event(
        &self,
        calendar_id: &str,
        event: &VacationEvent,
        access_token: &str,
    ) -> Result<InsertedEvent> {
        let url = self.calendar_url(calendar_id, &["events"])?;
        tracing::info!("Creating calendar event: {}", event.summary);

        let response = self
            .client
            .post(url)
            .bearer_auth(access_token)
            .json(event)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let body = Self::check(response)
            .await?
            .text()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let inserted: InsertedEvent = serde_json::from_str(&body)?;
        tracing::info!("✅ Calendar event created: {}", inserted.id);
        Ok(inserted)
    }
}

#[async_trait]
impl CalendarStatusSource for GoogleCalendarClient {
    async fn current_status(&self) -> Result<CalendarStatus> {
        let now = self.clock.now();
        let events = self
            .list_events(
                now - ChronoDuration::hours(STATUS_LOOKBACK_HOURS),
                now + ChronoDuration::days(STATUS_LOOKAHEAD_DAYS),
                STATUS_MAX_RESULTS,
            )
            .await?;

        // metadata only feeds the officer/calendar name
        let metadata = match self.metadata().await {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                tracing::warn!("Calendar metadata unavailable: {}", e);
                None
            }
        };

        Ok(derive_status(&events, metadata.as_ref(), now, &self.offset))
    }
}
