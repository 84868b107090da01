use crate::utils::error::{PatrolError, Result};
use crate::utils::validation::validate_coordinate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single GPS observation in decimal degrees. Only constructible through
/// [`LocationPoint::new`], deserialization included.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawLocationPoint")]
pub struct LocationPoint {
    latitude: f64,
    longitude: f64,
    observed_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLocationPoint {
    latitude: f64,
    longitude: f64,
    observed_at: DateTime<Utc>,
}

impl TryFrom<RawLocationPoint> for LocationPoint {
    type Error = PatrolError;

    fn try_from(raw: RawLocationPoint) -> Result<Self> {
        Self::new(raw.latitude, raw.longitude, raw.observed_at)
    }
}

impl LocationPoint {
    /// Rejects NaN/infinite values and anything outside ±90 / ±180.
    pub fn new(latitude: f64, longitude: f64, observed_at: DateTime<Utc>) -> Result<Self> {
        validate_coordinate("latitude", latitude, 90.0)?;
        validate_coordinate("longitude", longitude, 180.0)?;
        Ok(Self {
            latitude,
            longitude,
            observed_at,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }
}

/// A closed circular zone. Loaded once at startup, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawGeofenceZone")]
pub struct GeofenceZone {
    center_latitude: f64,
    center_longitude: f64,
    radius_meters: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGeofenceZone {
    center_latitude: f64,
    center_longitude: f64,
    radius_meters: f64,
}

impl TryFrom<RawGeofenceZone> for GeofenceZone {
    type Error = PatrolError;

    fn try_from(raw: RawGeofenceZone) -> Result<Self> {
        Self::new(raw.center_latitude, raw.center_longitude, raw.radius_meters)
    }
}

impl GeofenceZone {
    pub fn new(center_latitude: f64, center_longitude: f64, radius_meters: f64) -> Result<Self> {
        validate_coordinate("home_base.latitude", center_latitude, 90.0)?;
        validate_coordinate("home_base.longitude", center_longitude, 180.0)?;
        if !radius_meters.is_finite() || radius_meters <= 0.0 {
            return Err(PatrolError::InvalidRadius {
                value: radius_meters,
            });
        }
        Ok(Self {
            center_latitude,
            center_longitude,
            radius_meters,
        })
    }

    pub fn center_latitude(&self) -> f64 {
        self.center_latitude
    }

    pub fn center_longitude(&self) -> f64 {
        self.center_longitude
    }

    pub fn radius_meters(&self) -> f64 {
        self.radius_meters
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneStatus {
    AtBase,
    InField,
}

/// Derived on every call, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceStatus {
    /// Rounded to the nearest whole meter.
    pub distance_meters: i64,
    pub is_inside: bool,
    pub has_left: bool,
    pub status: ZoneStatus,
}

/// Calendar view of the current shift.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarStatus {
    pub on_duty: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_event_end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_event_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub officer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyStartCondition {
    CalendarAndLocation,
    CalendarOnly,
    OffDuty,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSummary {
    pub has_left_home_base: bool,
    pub distance_from_base: i64,
    pub status: ZoneStatus,
}

impl From<GeofenceStatus> for LocationSummary {
    fn from(status: GeofenceStatus) -> Self {
        Self {
            has_left_home_base: status.has_left,
            distance_from_base: status.distance_meters,
            status: status.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DutyStatus {
    #[serde(flatten)]
    pub calendar: CalendarStatus,
    pub actually_on_duty: bool,
    pub calendar_on_duty: bool,
    pub location_status: Option<LocationSummary>,
    pub duty_start_condition: DutyStartCondition,
    pub status_message: String,
}

impl DutyStatus {
    /// Body returned when the calendar itself cannot be read.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            calendar: CalendarStatus::default(),
            actually_on_duty: false,
            calendar_on_duty: false,
            location_status: None,
            duty_start_condition: DutyStartCondition::OffDuty,
            status_message: message.into(),
        }
    }
}

/// Google Calendar `start` / `end` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventTime {
    pub fn at(date_time: impl Into<String>) -> Self {
        Self {
            date_time: Some(date_time.into()),
            ..Self::default()
        }
    }

    pub fn all_day(date: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub summary: String,
    pub start: EventTime,
    pub end: EventTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalendarMetadata {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub summary: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEvent {
    pub id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub officer_name: String,
    pub summary: String,
    pub is_seasonal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    pub email_count: usize,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

/// JSON body reported after a forced allow-list refresh.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub report: RefreshReport,
}

impl From<RefreshReport> for RefreshResponse {
    fn from(report: RefreshReport) -> Self {
        Self {
            success: true,
            message: "Email cache refreshed successfully".to_string(),
            report,
        }
    }
}
