pub mod allow_list;
pub mod cache;
pub mod cached;
pub mod calendar;
pub mod duty;
pub mod geofence;
pub mod schedule;
pub mod vacation;

pub use allow_list::AllowList;
pub use cache::{Clock, SystemClock, TtlCache};
pub use cached::{CachedCalendarStatus, CachedPosition};
pub use duty::{DutyStatusAggregator, LocationUnknownPolicy, LOCATION_UNKNOWN_POLICY};
pub use crate::utils::error::Result;
