use crate::domain::model::{CalendarStatus, LocationPoint};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashSet;

/// "Is a shift active right now, and when does it start/end?"
#[async_trait]
pub trait CalendarStatusSource: Send + Sync {
    async fn current_status(&self) -> Result<CalendarStatus>;
}

/// Last known GPS fix of the patrol vehicle. `Ok(None)` means the tracker
/// answered but has no usable fix.
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn latest(&self) -> Result<Option<LocationPoint>>;
}

/// Raw allow-list of member emails, already normalised to lower case.
#[async_trait]
pub trait AuthorizedEmailSource: Send + Sync {
    async fn fetch_emails(&self) -> Result<HashSet<String>>;
}
