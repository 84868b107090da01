pub mod env;
pub mod toml_config;

pub use toml_config::PatrolConfig;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "patrol-duty")]
#[command(about = "Neighborhood patrol duty status, schedule and allow-list tool")]
pub struct CliConfig {
    /// Path to TOML configuration file; environment variables are used when omitted
    #[arg(short, long, env = "PATROL_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Combined calendar + geofence duty status
    DutyStatus,
    /// Calendar-only duty status
    Status,
    /// Latest GPS fix (suppressed while off duty)
    Position,
    /// Patrol shifts between two dates (YYYY-MM-DD or RFC 3339)
    Schedule {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },
    /// Classify a coordinate against the home base
    Distance {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Check whether an email is on the member allow-list
    CheckEmail { email: String },
    /// Force-refresh the allow-list (cron / admin warm)
    RefreshEmails {
        /// Full Authorization header value, e.g. "Bearer <CRON_SECRET>"
        #[arg(long, env = "PATROL_AUTHORIZATION")]
        authorization: Option<String>,
    },
    /// Submit a vacation watch request to the shared calendar
    Vacation {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        start_date: String,
        #[arg(long)]
        end_date: String,
        #[arg(long)]
        primary_contact: String,
        #[arg(long)]
        secondary_contact: Option<String>,
        /// Validate and print the event without submitting it
        #[arg(long)]
        dry_run: bool,
    },
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn load_config(&self) -> crate::utils::error::Result<PatrolConfig> {
        match &self.config {
            Some(path) => PatrolConfig::from_file(path),
            None => PatrolConfig::from_env(),
        }
    }
}
