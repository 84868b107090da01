use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatrolError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid coordinate: {field} = {value} ({reason})")]
    InvalidCoordinate {
        field: String,
        value: f64,
        reason: String,
    },

    #[error("Invalid geofence radius: {value}")]
    InvalidRadius { value: f64 },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field}: {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("{service} responded with HTTP {status}: {body}")]
    UpstreamStatus {
        service: String,
        status: u16,
        body: String,
    },

    #[error("{service} timed out after {seconds}s")]
    Timeout { service: String, seconds: u64 },

    #[error("GPS tracking is temporarily unavailable (HTTP {status})")]
    GpsUnavailable { status: u16 },

    #[error("GPS device not found - tracking unavailable")]
    DeviceNotFound,

    #[error("Off duty - no GPS tracking")]
    OffDuty,

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Upstream,
    Configuration,
    Input,
    Authorization,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PatrolError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_) | Self::Timeout { .. } => ErrorCategory::Network,
            Self::UpstreamStatus { .. }
            | Self::GpsUnavailable { .. }
            | Self::DeviceNotFound
            | Self::OffDuty => ErrorCategory::Upstream,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorCategory::Configuration,
            Self::InvalidCoordinate { .. }
            | Self::InvalidRadius { .. }
            | Self::ValidationError { .. }
            | Self::CsvError(_)
            | Self::SerializationError(_) => ErrorCategory::Input,
            Self::Unauthorized { .. } => ErrorCategory::Authorization,
            Self::IoError(_) => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Upstream if matches!(self, Self::OffDuty) => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Upstream => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Authorization => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Internal => ErrorSeverity::Critical,
        }
    }

    /// HTTP status the web surface answered with for this condition.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::GpsUnavailable { status } => *status,
            Self::DeviceNotFound => 404,
            Self::OffDuty => 423,
            Self::Timeout { .. } => 504,
            Self::UpstreamStatus { status, .. } if *status >= 500 => 503,
            Self::UpstreamStatus { status, .. } => *status,
            Self::Unauthorized { .. } => 401,
            Self::ValidationError { .. }
            | Self::InvalidCoordinate { .. }
            | Self::InvalidRadius { .. } => 400,
            _ => 500,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check network connectivity to the upstream service and retry",
            ErrorCategory::Upstream => "The upstream service is degraded; cached or fail-open values will be used until it recovers",
            ErrorCategory::Configuration => "Check the config file and environment variables (HOME_BASE_*, GCAL_*, TRACCAR_*)",
            ErrorCategory::Input => "Check the supplied values and try again",
            ErrorCategory::Authorization => "Provide a valid `Authorization: Bearer <secret>` value",
            ErrorCategory::Internal => "Check file permissions and available disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::GpsUnavailable { .. } => "GPS tracking is temporarily unavailable".to_string(),
            Self::DeviceNotFound => "GPS device not found - tracking unavailable".to_string(),
            Self::OffDuty => "Off duty - no GPS tracking".to_string(),
            Self::Timeout { service, .. } => format!("{} server timeout", service),
            Self::UpstreamStatus { service, status, .. } if *status >= 500 => {
                format!("{} server is temporarily down", service)
            }
            Self::Unauthorized { .. } => "Unauthorized".to_string(),
            Self::ValidationError { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PatrolError>;
