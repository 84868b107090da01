use crate::core::geofence;
use crate::domain::model::{
    CalendarStatus, DutyStartCondition, DutyStatus, GeofenceZone, LocationSummary,
};
use crate::domain::ports::{CalendarStatusSource, PositionSource};
use crate::utils::error::Result;
use std::sync::Arc;

/// What to report when the calendar says "on duty" but no GPS fix is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationUnknownPolicy {
    /// Fail open: trust the calendar.
    AssumeOnDuty,
    AssumeAtBase,
}

pub const LOCATION_UNKNOWN_POLICY: LocationUnknownPolicy = LocationUnknownPolicy::AssumeOnDuty;

/// Combines the calendar with the home-base geofence. The officer is
/// actually on duty once a shift is active and they have left home base.
pub struct DutyStatusAggregator {
    home_base: GeofenceZone,
    calendar: Arc<dyn CalendarStatusSource>,
    positions: Arc<dyn PositionSource>,
    policy: LocationUnknownPolicy,
}

impl DutyStatusAggregator {
    pub fn new(
        home_base: GeofenceZone,
        calendar: Arc<dyn CalendarStatusSource>,
        positions: Arc<dyn PositionSource>,
    ) -> Self {
        Self {
            home_base,
            calendar,
            positions,
            policy: LOCATION_UNKNOWN_POLICY,
        }
    }

    pub fn with_policy(mut self, policy: LocationUnknownPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Calendar errors propagate; position errors degrade to the
    /// location-unknown policy.
    pub async fn status(&self) -> Result<DutyStatus> {
        let calendar = self.calendar.current_status().await?;

        // off duty: never touch the tracker
        if !calendar.on_duty {
            tracing::debug!("Calendar shows off duty, skipping GPS lookup");
            return Ok(DutyStatus {
                calendar,
                actually_on_duty: false,
                calendar_on_duty: false,
                location_status: None,
                duty_start_condition: DutyStartCondition::OffDuty,
                status_message: "Off duty according to schedule".to_string(),
            });
        }

        match self.positions.latest().await {
            Ok(Some(position)) => {
                let geofence = geofence::evaluate(&position, &self.home_base);
                tracing::info!(
                    "📍 Officer is {}m from base ({:?})",
                    geofence.distance_meters,
                    geofence.status
                );

                Ok(DutyStatus {
                    calendar,
                    actually_on_duty: geofence.has_left,
                    calendar_on_duty: true,
                    location_status: Some(LocationSummary::from(geofence)),
                    duty_start_condition: DutyStartCondition::CalendarAndLocation,
                    status_message: if geofence.has_left {
                        "On duty".to_string()
                    } else {
                        "Scheduled but at base".to_string()
                    },
                })
            }
            Ok(None) => {
                tracing::warn!("⚠️ No GPS fix available, using calendar only");
                Ok(self.location_unknown(
                    calendar,
                    "On duty (GPS unavailable - using calendar only)",
                ))
            }
            Err(e) => {
                tracing::warn!("⚠️ Location check failed, using calendar only: {}", e);
                Ok(self.location_unknown(
                    calendar,
                    "On duty (location check failed - using calendar only)",
                ))
            }
        }
    }

    fn location_unknown(&self, calendar: CalendarStatus, message: &str) -> DutyStatus {
        let (actually_on_duty, status_message) = match self.policy {
            LocationUnknownPolicy::AssumeOnDuty => (true, message.to_string()),
            LocationUnknownPolicy::AssumeAtBase => {
                (false, "Scheduled but location unknown".to_string())
            }
        };

        DutyStatus {
            calendar,
            actually_on_duty,
            calendar_on_duty: true,
            location_status: None,
            duty_start_condition: DutyStartCondition::CalendarOnly,
            status_message,
        }
    }
}
