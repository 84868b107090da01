//! TTL-cached wrappers around the upstream sources.

use crate::core::cache::{Clock, TtlCache, CALENDAR_STATUS_TTL_SECS, POSITION_TTL_SECS};
use crate::domain::model::{CalendarStatus, LocationPoint};
use crate::domain::ports::{CalendarStatusSource, PositionSource};
use crate::utils::error::{PatrolError, Result};
use async_trait::async_trait;
use std::sync::Arc;

pub struct CachedCalendarStatus {
    inner: Arc<dyn CalendarStatusSource>,
    clock: Arc<dyn Clock>,
    cache: TtlCache<CalendarStatus>,
}

impl CachedCalendarStatus {
    pub fn new(inner: Arc<dyn CalendarStatusSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner,
            clock,
            cache: TtlCache::with_ttl_secs(CALENDAR_STATUS_TTL_SECS),
        }
    }
}

#[async_trait]
impl CalendarStatusSource for CachedCalendarStatus {
    async fn current_status(&self) -> Result<CalendarStatus> {
        let (status, from_cache) = self
            .cache
            .get_or_refresh(self.clock.now(), || self.inner.current_status())
            .await?;
        if from_cache {
            tracing::debug!("Calendar status served from cache");
        }
        Ok(status)
    }
}

/// Latest GPS fix, cached for two minutes and suppressed while off duty.
pub struct CachedPosition {
    calendar: Arc<dyn CalendarStatusSource>,
    inner: Arc<dyn PositionSource>,
    clock: Arc<dyn Clock>,
    cache: TtlCache<LocationPoint>,
}

impl CachedPosition {
    pub fn new(
        calendar: Arc<dyn CalendarStatusSource>,
        inner: Arc<dyn PositionSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            calendar,
            inner,
            clock,
            cache: TtlCache::with_ttl_secs(POSITION_TTL_SECS),
        }
    }

    /// Errors with `OffDuty` (and drops the cached fix) when no shift is
    /// active. An unreachable calendar does not block the lookup.
    async fn ensure_on_duty(&self) -> Result<()> {
        match self.calendar.current_status().await {
            Ok(status) if !status.on_duty => {
                self.cache.clear();
                Err(PatrolError::OffDuty)
            }
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::warn!("⚠️ Could not verify duty status, proceeding with position lookup: {}", e);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl PositionSource for CachedPosition {
    async fn latest(&self) -> Result<Option<LocationPoint>> {
        self.ensure_on_duty().await?;

        let now = self.clock.now();
        if let Some(point) = self.cache.get(now) {
            tracing::debug!("Position served from cache");
            return Ok(Some(point));
        }

        let point = self.inner.latest().await?;
        match &point {
            Some(p) => self.cache.insert(now, *p),
            None => self.cache.clear(),
        }
        Ok(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::ManualClock;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct SwitchCalendar {
        on_duty: AtomicBool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CalendarStatusSource for SwitchCalendar {
        async fn current_status(&self) -> Result<CalendarStatus> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CalendarStatus {
                on_duty: self.on_duty.load(Ordering::SeqCst),
                ..Default::default()
            })
        }
    }

    struct BrokenCalendar;

    #[async_trait]
    impl CalendarStatusSource for BrokenCalendar {
        async fn current_status(&self) -> Result<CalendarStatus> {
            Err(PatrolError::Timeout {
                service: "Google Calendar".to_string(),
                seconds: 5,
            })
        }
    }

    struct CountingTracker {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PositionSource for CountingTracker {
        async fn latest(&self) -> Result<Option<LocationPoint>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as f64;
            let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
            Ok(Some(LocationPoint::new(32.8 + n / 1000.0, -96.7, at)?))
        }
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        ))
    }

    fn calendar(on_duty: bool) -> Arc<SwitchCalendar> {
        Arc::new(SwitchCalendar {
            on_duty: AtomicBool::new(on_duty),
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_calendar_status_cached_for_a_minute() {
        let clock = clock();
        let inner = calendar(true);
        let cached = CachedCalendarStatus::new(inner.clone(), clock.clone());

        assert!(cached.current_status().await.unwrap().on_duty);
        clock.advance(Duration::seconds(59));
        assert!(cached.current_status().await.unwrap().on_duty);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::seconds(1));
        cached.current_status().await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_position_cached_while_on_duty() {
        let clock = clock();
        let tracker = Arc::new(CountingTracker {
            calls: AtomicUsize::new(0),
        });
        let cached = CachedPosition::new(calendar(true), tracker.clone(), clock.clone());

        let first = cached.latest().await.unwrap().unwrap();
        clock.advance(Duration::seconds(119));
        let second = cached.latest().await.unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(tracker.calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::seconds(1));
        let third = cached.latest().await.unwrap().unwrap();
        assert_ne!(first, third);
        assert_eq!(tracker.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_off_duty_clears_cache_and_skips_tracker() {
        let clock = clock();
        let cal = calendar(true);
        let tracker = Arc::new(CountingTracker {
            calls: AtomicUsize::new(0),
        });
        let cached = CachedPosition::new(cal.clone(), tracker.clone(), clock.clone());

        cached.latest().await.unwrap();
        cal.on_duty.store(false, Ordering::SeqCst);
        assert!(matches!(cached.latest().await, Err(PatrolError::OffDuty)));

        // back on duty within the TTL: the old fix must not be served
        cal.on_duty.store(true, Ordering::SeqCst);
        cached.latest().await.unwrap();
        assert_eq!(tracker.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_calendar_failure_does_not_block_lookup() {
        let tracker = Arc::new(CountingTracker {
            calls: AtomicUsize::new(0),
        });
        let cached = CachedPosition::new(Arc::new(BrokenCalendar), tracker.clone(), clock());

        assert!(cached.latest().await.unwrap().is_some());
        assert_eq!(tracker.calls.load(Ordering::SeqCst), 1);
    }
}
