//! Single-slot TTL caches for the upstream calls (calendar status, GPS fix,
//! email allow-list). Time comes from an injected [`Clock`] so expiry can be
//! driven by tests without sleeping.

use crate::utils::error::Result;
use chrono::{DateTime, Duration, Utc};
use std::future::Future;
use std::sync::{Mutex, MutexGuard};

pub const CALENDAR_STATUS_TTL_SECS: i64 = 60;
pub const POSITION_TTL_SECS: i64 = 120;
pub const ALLOW_LIST_TTL_SECS: i64 = 300;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    stored_at: DateTime<Utc>,
}

/// Last value wins. Concurrent misses each run their own refresh.
#[derive(Debug)]
pub struct TtlCache<T: Clone> {
    ttl: Duration,
    slot: Mutex<Option<Entry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn with_ttl_secs(secs: i64) -> Self {
        Self::new(Duration::seconds(secs))
    }

    fn slot(&self) -> MutexGuard<'_, Option<Entry<T>>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fresh value only: age strictly below the TTL.
    pub fn get(&self, now: DateTime<Utc>) -> Option<T> {
        self.slot()
            .as_ref()
            .filter(|entry| now - entry.stored_at < self.ttl)
            .map(|entry| entry.value.clone())
    }

    /// Whatever is stored, however old.
    pub fn get_stale(&self) -> Option<T> {
        self.slot().as_ref().map(|entry| entry.value.clone())
    }

    pub fn insert(&self, now: DateTime<Utc>, value: T) {
        *self.slot() = Some(Entry {
            value,
            stored_at: now,
        });
    }

    pub fn clear(&self) {
        *self.slot() = None;
    }

    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.slot().as_ref().map(|entry| now - entry.stored_at)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.slot().as_ref().map(|entry| entry.stored_at + self.ttl)
    }

    /// Returns `(value, from_cache)`. A failed refresh falls back to the stale
    /// value when there is one.
    pub async fn get_or_refresh<F, Fut>(&self, now: DateTime<Utc>, refresh: F) -> Result<(T, bool)>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.get(now) {
            return Ok((value, true));
        }

        match refresh().await {
            Ok(value) => {
                self.insert(now, value.clone());
                Ok((value, false))
            }
            Err(e) => match self.get_stale() {
                Some(stale) => {
                    tracing::warn!("⚠️ Refresh failed, serving stale cache entry: {}", e);
                    Ok((stale, true))
                }
                None => Err(e),
            },
        }
    }
}
