use crate::core::calendar::{officer_from_title, parse_event_time};
use crate::domain::model::{CalendarEvent, ScheduleEvent};
use crate::utils::error::{PatrolError, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;

static SEASONAL_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^SEASONAL\s*").expect("seasonal prefix pattern"));

pub const DEFAULT_OFFICER_NAME: &str = "Officer";

pub fn is_seasonal(summary: &str) -> bool {
    summary.to_uppercase().starts_with("SEASONAL")
}

/// Map one calendar event to a schedule row. Times are labelled in `offset`.
pub fn to_schedule_event(event: &CalendarEvent, offset: &FixedOffset) -> Result<ScheduleEvent> {
    let start = parse_event_time(&event.start, offset)?;
    let end = parse_event_time(&event.end, offset)?;

    let seasonal = is_seasonal(&event.summary);
    let title = if seasonal {
        SEASONAL_PREFIX.replace(&event.summary, "").into_owned()
    } else {
        event.summary.clone()
    };

    Ok(ScheduleEvent {
        id: event.id.clone(),
        date: start.to_rfc3339_opts(SecondsFormat::Millis, true),
        start_time: start.with_timezone(offset).format("%I:%M %p").to_string(),
        end_time: end.with_timezone(offset).format("%I:%M %p").to_string(),
        officer_name: officer_from_title(&title).unwrap_or_else(|| DEFAULT_OFFICER_NAME.to_string()),
        summary: event.summary.clone(),
        is_seasonal: seasonal,
    })
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DD`, the latter read as local
/// midnight in `offset`.
pub fn parse_range_bound(field: &str, raw: &str, offset: &FixedOffset) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }

    let invalid = || PatrolError::validation(format!("Invalid {} '{}': expected YYYY-MM-DD or RFC 3339", field, raw));
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())?;
    let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
    offset
        .from_local_datetime(&midnight)
        .single()
        .map(|at| at.with_timezone(&Utc))
        .ok_or_else(invalid)
}

/// Start must come strictly before end.
pub fn parse_range(
    start: &str,
    end: &str,
    offset: &FixedOffset,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = parse_range_bound("startDate", start, offset)?;
    let end = parse_range_bound("endDate", end, offset)?;
    if end <= start {
        return Err(PatrolError::validation("endDate must be after startDate"));
    }
    Ok((start, end))
}

/// Malformed events are dropped with a warning.
pub fn build_schedule(events: &[CalendarEvent], offset: &FixedOffset) -> Vec<ScheduleEvent> {
    events
        .iter()
        .filter_map(|event| match to_schedule_event(event, offset) {
            Ok(row) => Some(row),
            Err(e) => {
                tracing::warn!("Skipping schedule event '{}': {}", event.id, e);
                None
            }
        })
        .collect()
}
