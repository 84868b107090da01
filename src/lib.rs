pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::PatrolConfig;
pub use crate::core::{AllowList, DutyStatusAggregator};
pub use domain::model::{DutyStatus, GeofenceStatus, GeofenceZone, LocationPoint};
pub use utils::error::{PatrolError, Result};
