use crate::domain::model::EventTime;
use crate::utils::error::{PatrolError, Result};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Google Calendar colour id for red.
pub const VACATION_COLOR_ID: &str = "11";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VacationRequest {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    /// YYYY-MM-DD
    pub start_date: String,
    /// YYYY-MM-DD, inclusive
    pub end_date: String,
    pub primary_contact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_contact: Option<String>,
}

/// A request that passed validation, with trimmed fields and parsed dates.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidVacationRequest {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub primary_contact: String,
    pub secondary_contact: Option<String>,
}

fn required(value: &str, message: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PatrolError::validation(message));
    }
    Ok(trimmed.to_string())
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        PatrolError::validation("Invalid date format. Please use YYYY-MM-DD format")
    })
}

impl VacationRequest {
    pub fn validate(&self) -> Result<ValidVacationRequest> {
        let first_name = required(&self.first_name, "First name must be a non-empty string")?;
        let last_name = required(&self.last_name, "Last name must be a non-empty string")?;
        let address = required(&self.address, "Address must be a non-empty string")?;
        let primary_contact = required(
            &self.primary_contact,
            "Primary phone number must be a non-empty string",
        )?;
        let secondary_contact = match &self.secondary_contact {
            Some(contact) => Some(required(
                contact,
                "Secondary phone number must be a valid string if provided",
            )?),
            None => None,
        };

        let start = parse_date(&self.start_date)?;
        let end = parse_date(&self.end_date)?;
        if end < start {
            return Err(PatrolError::validation(
                "End date must be on or after start date",
            ));
        }

        Ok(ValidVacationRequest {
            first_name,
            last_name,
            address,
            start,
            end,
            primary_contact,
            secondary_contact,
        })
    }
}

/// Insert body for the vacation-watch calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VacationEvent {
    pub summary: String,
    pub description: String,
    pub start: EventTime,
    pub end: EventTime,
    pub color_id: String,
}

impl VacationEvent {
    /// All-day event; the calendar treats `end.date` as exclusive, hence +1 day.
    pub fn from_request(request: &ValidVacationRequest) -> Result<Self> {
        let full_name = format!("{} {}", request.first_name, request.last_name);
        let end_exclusive = request
            .end
            .checked_add_days(Days::new(1))
            .ok_or_else(|| PatrolError::validation("End date is out of range"))?;

        let mut description = String::from("Vacation Watch Request\n\n");
        description.push_str(&format!("📍 Address: {}\n", request.address));
        description.push_str(&format!("👤 Resident: {}\n", full_name));
        description.push_str(&format!(
            "📅 Dates: {} to {}\n\n",
            request.start.format("%Y-%m-%d"),
            request.end.format("%Y-%m-%d")
        ));
        description.push_str("📞 Contact Information:\n");
        description.push_str(&format!("Primary Phone: {}\n", request.primary_contact));
        if let Some(secondary) = &request.secondary_contact {
            description.push_str(&format!("Secondary Phone: {}\n", secondary));
        }
        description.push_str("\n🚓 Officers: Please keep an eye on this property during patrol shifts.");

        Ok(Self {
            summary: format!("🏖️ Vacation Watch - {}", request.address),
            description,
            start: EventTime::all_day(request.start.format("%Y-%m-%d").to_string()),
            end: EventTime::all_day(end_exclusive.format("%Y-%m-%d").to_string()),
            color_id: VACATION_COLOR_ID.to_string(),
        })
    }
}
