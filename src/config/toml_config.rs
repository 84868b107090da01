use crate::domain::model::GeofenceZone;
use crate::utils::error::{PatrolError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_required_field,
    validate_url, Validate,
};
use chrono::{FixedOffset, Offset, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

pub const DEFAULT_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3/calendars";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 5;
pub const DEFAULT_EMAIL_COLUMNS: [&str; 2] = ["H", "I"];

static ENV_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env placeholder pattern"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatrolConfig {
    pub home_base: HomeBaseConfig,
    pub calendar: Option<CalendarConfig>,
    pub traccar: Option<TraccarConfig>,
    pub allow_list: Option<AllowListConfig>,
    pub cron: Option<CronConfig>,
    pub vacation: Option<VacationConfig>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HomeBaseConfig {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    pub calendar_id: String,
    pub api_key: String,
    pub api_base: Option<String>,
    /// e.g. "-05:00"; all-day events and schedule labels use this offset
    pub utc_offset: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraccarConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub device_id: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowListConfig {
    /// Published CSV export of the membership sheet
    pub csv_url: String,
    /// Spreadsheet column letters holding emails
    pub email_columns: Option<Vec<String>>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CronConfig {
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VacationConfig {
    pub calendar_id: String,
    pub access_token: Option<String>,
}

impl HomeBaseConfig {
    pub fn zone(&self) -> Result<GeofenceZone> {
        GeofenceZone::new(self.latitude, self.longitude, self.radius_meters)
    }
}

impl CalendarConfig {
    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_CALENDAR_API_BASE)
    }

    pub fn offset(&self) -> Result<FixedOffset> {
        match &self.utc_offset {
            Some(raw) => parse_utc_offset(raw),
            None => Ok(utc()),
        }
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }
}

impl TraccarConfig {
    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }
}

impl AllowListConfig {
    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }

    /// Zero-based indices of the configured email columns.
    pub fn column_indices(&self) -> Result<Vec<usize>> {
        match &self.email_columns {
            Some(columns) => columns.iter().map(|c| column_index(c)).collect(),
            None => DEFAULT_EMAIL_COLUMNS.iter().map(|c| column_index(c)).collect(),
        }
    }
}

fn utc() -> FixedOffset {
    Utc.fix()
}

/// "+HH:MM" / "-HH:MM" / "Z".
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset> {
    let invalid = || PatrolError::InvalidConfigValueError {
        field: "calendar.utc_offset".to_string(),
        value: raw.to_string(),
        reason: "expected +HH:MM or -HH:MM".to_string(),
    };

    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return Ok(utc());
    }

    let (sign, rest) = if let Some(rest) = raw.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = raw.strip_prefix('-') {
        (-1, rest)
    } else {
        return Err(invalid());
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 14 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// Spreadsheet column letters to a zero-based index: "A" -> 0, "H" -> 7, "AA" -> 26.
pub fn column_index(letters: &str) -> Result<usize> {
    let letters = letters.trim();
    let invalid = |reason: &str| PatrolError::InvalidConfigValueError {
        field: "allow_list.email_columns".to_string(),
        value: letters.to_string(),
        reason: reason.to_string(),
    };
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid("column must be letters like \"H\""));
    }

    let index = letters
        .chars()
        .map(|c| (c.to_ascii_uppercase() as u8 - b'A') as usize + 1)
        .try_fold(0usize, |acc, n| acc.checked_mul(26)?.checked_add(n))
        .ok_or_else(|| invalid("column is out of range"))?;
    Ok(index - 1)
}

impl PatrolConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PatrolError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| PatrolError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${TRACCAR_PASSWORD})；未設定的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_PLACEHOLDER
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    pub fn home_base_zone(&self) -> Result<GeofenceZone> {
        self.home_base.zone()
    }

    pub fn calendar(&self) -> Result<&CalendarConfig> {
        validate_required_field("calendar", &self.calendar)
    }

    pub fn traccar(&self) -> Result<&TraccarConfig> {
        validate_required_field("traccar", &self.traccar)
    }

    pub fn allow_list(&self) -> Result<&AllowListConfig> {
        validate_required_field("allow_list", &self.allow_list)
    }

    pub fn vacation(&self) -> Result<&VacationConfig> {
        validate_required_field("vacation", &self.vacation)
    }

    pub fn cron_secret(&self) -> Option<&str> {
        self.cron.as_ref().and_then(|c| c.secret.as_deref())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        // 基地座標與半徑
        self.home_base_zone()?;

        if let Some(calendar) = &self.calendar {
            validate_non_empty_string("calendar.calendar_id", &calendar.calendar_id)?;
            validate_non_empty_string("calendar.api_key", &calendar.api_key)?;
            validate_url("calendar.api_base", calendar.api_base())?;
            calendar.offset()?;
            validate_range("calendar.timeout_seconds", calendar.timeout_seconds(), 1, 9)?;
        }

        if let Some(traccar) = &self.traccar {
            validate_url("traccar.base_url", &traccar.base_url)?;
            validate_non_empty_string("traccar.username", &traccar.username)?;
            validate_non_empty_string("traccar.password", &traccar.password)?;
            validate_non_empty_string("traccar.device_id", &traccar.device_id)?;
            validate_range("traccar.timeout_seconds", traccar.timeout_seconds(), 1, 9)?;
        }

        if let Some(allow_list) = &self.allow_list {
            validate_url("allow_list.csv_url", &allow_list.csv_url)?;
            validate_positive_number("allow_list.email_columns", allow_list.column_indices()?.len() as u64, 1)?;
            validate_range("allow_list.timeout_seconds", allow_list.timeout_seconds(), 1, 9)?;
        }

        if let Some(vacation) = &self.vacation {
            validate_non_empty_string("vacation.calendar_id", &vacation.calendar_id)?;
        }

        Ok(())
    }
}

impl Validate for PatrolConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
