use crate::config::toml_config::TraccarConfig;
use crate::domain::model::LocationPoint;
use crate::domain::ports::PositionSource;
use crate::utils::error::{PatrolError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const SERVICE: &str = "Traccar";
pub const USER_AGENT: &str = "ENP-Patrol/1.0";

/// Subset of a Traccar `/api/positions` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraccarPosition {
    #[serde(default)]
    pub valid: bool,
    pub latitude: f64,
    pub longitude: f64,
    pub fix_time: Option<String>,
    pub server_time: Option<String>,
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

fn parse_time(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.filter(|s| !s.is_empty())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

impl TraccarPosition {
    /// `None` for fixes the device itself flagged invalid, the (0, 0) null
    /// island, or out-of-range coordinates.
    pub fn to_location(&self, now: DateTime<Utc>) -> Option<LocationPoint> {
        if !self.valid || (self.latitude == 0.0 && self.longitude == 0.0) {
            return None;
        }

        let observed_at = parse_time(self.fix_time.as_deref())
            .or_else(|| parse_time(self.server_time.as_deref()))
            .unwrap_or(now);

        match LocationPoint::new(round6(self.latitude), round6(self.longitude), observed_at) {
            Ok(point) => Some(point),
            Err(e) => {
                tracing::warn!("Discarding GPS fix: {}", e);
                None
            }
        }
    }
}

pub struct TraccarClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
    device_id: String,
    timeout: Duration,
}

impl TraccarClient {
    pub fn new(config: &TraccarConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            device_id: config.device_id.clone(),
            timeout: Duration::from_secs(config.timeout_seconds()),
        }
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

    pub async fn fetch_positions(&self) -> Result<Vec<TraccarPosition>> {
        let url = format!("{}/api/positions", self.base_url);
        tracing::debug!("Requesting latest position for device {}", self.device_id);

        let response = self
            .client
            .get(&url)
            .query(&[("deviceId", self.device_id.as_str()), ("latest", "true")])
            .basic_auth(&self.username, Some(&self.password))
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Traccar responded with HTTP {}: {}", status, body);
            return Err(match status.as_u16() {
                401 | 403 => PatrolError::GpsUnavailable {
                    status: status.as_u16(),
                },
                404 => PatrolError::DeviceNotFound,
                code => PatrolError::UpstreamStatus {
                    service: SERVICE.to_string(),
                    status: code,
                    body,
                },
            });
        }

        let body = response.text().await.map_err(|e| self.map_send_error(e))?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl PositionSource for TraccarClient {
    async fn latest(&self) -> Result<Option<LocationPoint>> {
        let positions = self.fetch_positions().await?;
        // latest=true puts the newest fix first
        Ok(positions.first().and_then(|p| p.to_location(Utc::now())))
    }
}
