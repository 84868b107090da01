//! Duty status derived from the shared patrol calendar.

use crate::domain::model::{CalendarEvent, CalendarMetadata, CalendarStatus, EventTime};
use crate::utils::error::{PatrolError, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// 事件標題中常見的警員名稱格式，依序嘗試
static TITLE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)Officer\s+([A-Za-z\s]+)",
        r"(?i)Patrol\s+[-–]\s*([A-Za-z\s]+)",
        r"(?i)([A-Za-z\s]+)\s+Patrol",
        r"(?i)Shift[:\s]+([A-Za-z\s]+)",
        r"(?i)On\s+Duty\s+[-–]\s*Officer\s+([A-Za-z\s]+)",
        r"(?i)On\s+Duty\s+[-–]\s*([A-Za-z\s]+)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("officer title pattern"))
    .collect()
});

static CALENDAR_SUMMARY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:Officer\s+|Patrol\s+)?(.+?)(?:\s+(?:Schedule|Shifts?|Calendar|Patrol))*$")
        .expect("calendar summary pattern")
});

static DESCRIPTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Officer[:\s]+([A-Za-z\s]+)").expect("calendar description pattern")
});

/// Resolve a `start`/`end` object to an instant. All-day dates begin at
/// midnight in `offset`.
pub fn parse_event_time(time: &EventTime, offset: &FixedOffset) -> Result<DateTime<Utc>> {
    if let Some(date_time) = &time.date_time {
        return DateTime::parse_from_rfc3339(date_time)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| PatrolError::validation(format!("Invalid event dateTime '{}': {}", date_time, e)));
    }

    if let Some(date) = &time.date {
        let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| PatrolError::validation(format!("Invalid event date '{}': {}", date, e)))?;
        let midnight = day.and_hms_opt(0, 0, 0).ok_or_else(|| {
            PatrolError::validation(format!("Invalid event date '{}'", date))
        })?;
        return offset
            .from_local_datetime(&midnight)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| PatrolError::validation(format!("Ambiguous event date '{}'", date)));
    }

    Err(PatrolError::validation("Invalid event date format"))
}

/// The string the calendar gave us, unchanged.
pub fn serialize_event_time(time: &EventTime) -> Option<String> {
    time.date_time.clone().or_else(|| time.date.clone())
}

pub fn officer_from_title(summary: &str) -> Option<String> {
    TITLE_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(summary)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|name| !name.is_empty())
    })
}

pub fn officer_from_metadata(metadata: &CalendarMetadata) -> Option<String> {
    let from_summary = CALENDAR_SUMMARY_PATTERN
        .captures(metadata.summary.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty());

    from_summary.or_else(|| {
        metadata.description.as_deref().and_then(|description| {
            DESCRIPTION_PATTERN
                .captures(description)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
                .filter(|name| !name.is_empty())
        })
    })
}

struct TimedEvent<'a> {
    event: &'a CalendarEvent,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

fn timed_events<'a>(events: &'a [CalendarEvent], offset: &FixedOffset) -> Vec<TimedEvent<'a>> {
    events
        .iter()
        .filter_map(|event| {
            let start = parse_event_time(&event.start, offset);
            let end = parse_event_time(&event.end, offset);
            match (start, end) {
                (Ok(start), Ok(end)) => Some(TimedEvent { event, start, end }),
                (Err(e), _) | (_, Err(e)) => {
                    tracing::warn!("Skipping calendar event '{}': {}", event.id, e);
                    None
                }
            }
        })
        .collect()
}

/// Current shift is the first event containing `now` (both ends inclusive).
/// The next shift is only reported while off duty. The officer name comes
/// from the current event, then the calendar metadata, then the next event.
pub fn derive_status(
    events: &[CalendarEvent],
    metadata: Option<&CalendarMetadata>,
    now: DateTime<Utc>,
    offset: &FixedOffset,
) -> CalendarStatus {
    let timed = timed_events(events, offset);

    let current = timed.iter().find(|t| t.start <= now && now <= t.end);
    let upcoming = timed.iter().filter(|t| t.start > now).min_by_key(|t| t.start);

    let officer_name = current
        .and_then(|t| officer_from_title(&t.event.summary))
        .or_else(|| metadata.and_then(officer_from_metadata))
        .or_else(|| upcoming.and_then(|t| officer_from_title(&t.event.summary)));

    CalendarStatus {
        on_duty: current.is_some(),
        current_event_end: current.and_then(|t| serialize_event_time(&t.event.end)),
        next_event_start: if current.is_none() {
            upcoming.and_then(|t| serialize_event_time(&t.event.start))
        } else {
            None
        },
        officer_name,
        calendar_name: metadata.map(|m| m.summary.clone()).filter(|s| !s.is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn event(id: &str, summary: &str, start: &str, end: &str) -> CalendarEvent {
        CalendarEvent {
            id: id.to_string(),
            summary: summary.to_string(),
            start: EventTime::at(start),
            end: EventTime::at(end),
        }
    }

    #[test]
    fn test_officer_from_title_patterns() {
        assert_eq!(officer_from_title("Officer Smith").as_deref(), Some("Smith"));
        assert_eq!(officer_from_title("Patrol - Jones").as_deref(), Some("Jones"));
        assert_eq!(officer_from_title("Patrol – Jones").as_deref(), Some("Jones"));
        assert_eq!(officer_from_title("Garcia Patrol").as_deref(), Some("Garcia"));
        assert_eq!(officer_from_title("Shift: Lee").as_deref(), Some("Lee"));
        assert_eq!(officer_from_title("On Duty - Officer Brown").as_deref(), Some("Brown"));
        assert_eq!(officer_from_title("On Duty - Nguyen").as_deref(), Some("Nguyen"));
        assert_eq!(officer_from_title("12:00"), None);
    }

    #[test]
    fn test_officer_from_metadata() {
        let metadata = CalendarMetadata {
            id: "cal".to_string(),
            summary: "Officer Smith Patrol Schedule".to_string(),
            description: None,
        };
        assert_eq!(officer_from_metadata(&metadata).as_deref(), Some("Smith"));

        let described = CalendarMetadata {
            id: "cal".to_string(),
            summary: String::new(),
            description: Some("Officer: Dana Reyes".to_string()),
        };
        assert_eq!(officer_from_metadata(&described).as_deref(), Some("Dana Reyes"));
    }

    #[test]
    fn test_on_duty_during_event() {
        let events = vec![
            event("1", "Officer Smith", "2025-06-01T10:00:00Z", "2025-06-01T14:00:00Z"),
            event("2", "Officer Jones", "2025-06-02T10:00:00Z", "2025-06-02T14:00:00Z"),
        ];

        let status = derive_status(&events, None, at("2025-06-01T12:00:00Z"), &utc());

        assert!(status.on_duty);
        assert_eq!(status.current_event_end.as_deref(), Some("2025-06-01T14:00:00Z"));
        assert_eq!(status.next_event_start, None);
        assert_eq!(status.officer_name.as_deref(), Some("Smith"));
    }

    #[test]
    fn test_event_end_is_inclusive() {
        let events = vec![event("1", "Officer Smith", "2025-06-01T10:00:00Z", "2025-06-01T14:00:00Z")];
        assert!(derive_status(&events, None, at("2025-06-01T14:00:00Z"), &utc()).on_duty);
        assert!(!derive_status(&events, None, at("2025-06-01T14:00:01Z"), &utc()).on_duty);
    }

    #[test]
    fn test_off_duty_reports_next_start() {
        let events = vec![
            event("1", "Officer Smith", "2025-06-01T06:00:00Z", "2025-06-01T08:00:00Z"),
            event("3", "Officer Lee", "2025-06-03T10:00:00Z", "2025-06-03T14:00:00Z"),
            event("2", "Officer Jones", "2025-06-02T10:00:00-05:00", "2025-06-02T14:00:00-05:00"),
        ];

        let status = derive_status(&events, None, at("2025-06-01T12:00:00Z"), &utc());

        assert!(!status.on_duty);
        assert_eq!(status.current_event_end, None);
        assert_eq!(status.next_event_start.as_deref(), Some("2025-06-02T10:00:00-05:00"));
        assert_eq!(status.officer_name.as_deref(), Some("Jones"));
    }

    #[test]
    fn test_all_day_event_uses_offset() {
        let events = vec![CalendarEvent {
            id: "seasonal".to_string(),
            summary: "SEASONAL Patrol - Kim".to_string(),
            start: EventTime::all_day("2025-06-01"),
            end: EventTime::all_day("2025-06-02"),
        }];
        let central = FixedOffset::west_opt(5 * 3600).unwrap();

        // 03:00Z is still May 31st in UTC-5
        assert!(!derive_status(&events, None, at("2025-06-01T03:00:00Z"), &central).on_duty);
        let status = derive_status(&events, None, at("2025-06-01T06:00:00Z"), &central);
        assert!(status.on_duty);
        assert_eq!(status.current_event_end.as_deref(), Some("2025-06-02"));
        assert_eq!(status.officer_name.as_deref(), Some("Kim"));
    }

    #[test]
    fn test_malformed_event_is_skipped() {
        let events = vec![
            CalendarEvent {
                id: "bad".to_string(),
                summary: "Officer Ghost".to_string(),
                start: EventTime::default(),
                end: EventTime::default(),
            },
            event("1", "Officer Smith", "2025-06-01T10:00:00Z", "2025-06-01T14:00:00Z"),
        ];
        let metadata = CalendarMetadata {
            id: "cal".to_string(),
            summary: "Neighborhood Patrol".to_string(),
            description: None,
        };

        let status = derive_status(&events, Some(&metadata), at("2025-06-01T11:00:00Z"), &utc());
        assert!(status.on_duty);
        assert_eq!(status.officer_name.as_deref(), Some("Smith"));
        assert_eq!(status.calendar_name.as_deref(), Some("Neighborhood Patrol"));
    }

    #[test]
    fn test_metadata_name_when_no_events() {
        let metadata = CalendarMetadata {
            id: "cal".to_string(),
            summary: "Officer Smith Shifts".to_string(),
            description: None,
        };
        let status = derive_status(&[], Some(&metadata), at("2025-06-01T11:00:00Z"), &utc());
        assert!(!status.on_duty);
        assert_eq!(status.officer_name.as_deref(), Some("Smith"));
    }

    #[test]
    fn test_metadata_name_beats_upcoming_event() {
        let events = vec![event("2", "Officer Jones", "2025-06-02T10:00:00Z", "2025-06-02T14:00:00Z")];
        let metadata = CalendarMetadata {
            id: "cal".to_string(),
            summary: "Officer Smith Shifts".to_string(),
            description: None,
        };

        let status = derive_status(&events, Some(&metadata), at("2025-06-01T11:00:00Z"), &utc());
        assert!(!status.on_duty);
        assert_eq!(status.next_event_start.as_deref(), Some("2025-06-02T10:00:00Z"));
        assert_eq!(status.officer_name.as_deref(), Some("Smith"));

        // without usable metadata the upcoming shift still names someone
        let status = derive_status(&events, None, at("2025-06-01T11:00:00Z"), &utc());
        assert_eq!(status.officer_name.as_deref(), Some("Jones"));
    }
}
