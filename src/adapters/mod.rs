// Adapters layer: HTTP clients for the upstream services behind the domain ports.

pub mod google_calendar;
pub mod sheets;
pub mod traccar;

pub use google_calendar::GoogleCalendarClient;
pub use sheets::SheetCsvSource;
pub use traccar::TraccarClient;
