use crate::config::toml_config::{
    AllowListConfig, CalendarConfig, CronConfig, HomeBaseConfig, PatrolConfig, TraccarConfig,
    VacationConfig,
};
use crate::utils::error::{PatrolError, Result};
use crate::utils::validation::parse_f64;
use std::env;

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required(name: &str) -> Result<String> {
    var(name).ok_or_else(|| PatrolError::MissingConfigError {
        field: name.to_string(),
    })
}

fn optional_secs(name: &str) -> Result<Option<u64>> {
    var(name)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map_err(|e| PatrolError::InvalidConfigValueError {
                    field: name.to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                })
        })
        .transpose()
}

impl PatrolConfig {
    /// Builds the config from the deployment's environment variables. Each
    /// upstream section is present only when all of its required variables are.
    pub fn from_env() -> Result<Self> {
        let home_base = HomeBaseConfig {
            latitude: parse_f64("HOME_BASE_LAT", &required("HOME_BASE_LAT")?)?,
            longitude: parse_f64("HOME_BASE_LON", &required("HOME_BASE_LON")?)?,
            radius_meters: parse_f64(
                "HOME_BASE_RADIUS_METERS",
                &required("HOME_BASE_RADIUS_METERS")?,
            )?,
        };

        let calendar = match (
            var("GCAL_ID").or_else(|| var("NEXT_PUBLIC_GCAL_ID")),
            var("GCAL_API_KEY").or_else(|| var("NEXT_PUBLIC_GCAL_API_KEY")),
        ) {
            (Some(calendar_id), Some(api_key)) => Some(CalendarConfig {
                calendar_id,
                api_key,
                api_base: var("GCAL_API_BASE"),
                utc_offset: var("PATROL_UTC_OFFSET"),
                timeout_seconds: optional_secs("GCAL_TIMEOUT_SECONDS")?,
            }),
            _ => None,
        };

        let traccar = match (
            var("TRACCAR_BASE_URL"),
            var("TRACCAR_USERNAME"),
            var("TRACCAR_PASSWORD"),
            var("TRACCAR_DEVICE_ID"),
        ) {
            (Some(base_url), Some(username), Some(password), Some(device_id)) => {
                Some(TraccarConfig {
                    base_url,
                    username,
                    password,
                    device_id,
                    timeout_seconds: optional_secs("TRACCAR_TIMEOUT_SECONDS")?,
                })
            }
            _ => None,
        };

        let allow_list = match var("ALLOW_LIST_CSV_URL") {
            Some(csv_url) => Some(AllowListConfig {
                csv_url,
                email_columns: var("ALLOW_LIST_EMAIL_COLUMNS")
                    .map(|raw| raw.split(',').map(|c| c.trim().to_string()).collect()),
                timeout_seconds: optional_secs("ALLOW_LIST_TIMEOUT_SECONDS")?,
            }),
            None => None,
        };

        let vacation = var("VACATION_CALENDAR_ID").map(|calendar_id| VacationConfig {
            calendar_id,
            access_token: var("GOOGLE_ACCESS_TOKEN"),
        });

        Ok(Self {
            home_base,
            calendar,
            traccar,
            allow_list,
            cron: Some(CronConfig {
                secret: var("CRON_SECRET"),
            }),
            vacation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test so the env mutations cannot race other tests in this module.
    #[test]
    fn test_from_env() {
        for name in ["HOME_BASE_LAT", "HOME_BASE_LON", "HOME_BASE_RADIUS_METERS"] {
            env::remove_var(name);
        }
        assert!(matches!(
            PatrolConfig::from_env(),
            Err(PatrolError::MissingConfigError { .. })
        ));

        env::set_var("HOME_BASE_LAT", "32.8350");
        env::set_var("HOME_BASE_LON", "-96.7850");
        env::set_var("HOME_BASE_RADIUS_METERS", "abc");
        assert!(matches!(
            PatrolConfig::from_env(),
            Err(PatrolError::InvalidConfigValueError { .. })
        ));

        env::set_var("HOME_BASE_RADIUS_METERS", "200");
        env::set_var("TRACCAR_BASE_URL", "https://gps.example.com");
        env::set_var("TRACCAR_USERNAME", "patrol");
        env::remove_var("TRACCAR_PASSWORD");
        let config = PatrolConfig::from_env().unwrap();
        assert_eq!(config.home_base.radius_meters, 200.0);
        assert!(config.traccar.is_none());

        env::set_var("TRACCAR_PASSWORD", "secret");
        env::set_var("TRACCAR_DEVICE_ID", "7");
        let config = PatrolConfig::from_env().unwrap();
        assert_eq!(config.traccar().unwrap().device_id, "7");

        for name in [
            "HOME_BASE_LAT",
            "HOME_BASE_LON",
            "HOME_BASE_RADIUS_METERS",
            "TRACCAR_BASE_URL",
            "TRACCAR_USERNAME",
            "TRACCAR_PASSWORD",
            "TRACCAR_DEVICE_ID",
        ] {
            env::remove_var(name);
        }
    }
}
