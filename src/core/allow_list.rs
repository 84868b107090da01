//! Cached allow-list of member emails used to gate sign-in.

use crate::core::cache::{Clock, TtlCache, ALLOW_LIST_TTL_SECS};
use crate::domain::model::RefreshReport;
use crate::domain::ports::AuthorizedEmailSource;
use crate::utils::error::{PatrolError, Result};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// Trimmed, lower-cased, and loosely checked for `@` and `.`.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    if email.contains('@') && email.contains('.') {
        Some(email)
    } else {
        None
    }
}

pub struct AllowList {
    source: Arc<dyn AuthorizedEmailSource>,
    clock: Arc<dyn Clock>,
    cache: TtlCache<HashSet<String>>,
}

impl AllowList {
    pub fn new(source: Arc<dyn AuthorizedEmailSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            cache: TtlCache::with_ttl_secs(ALLOW_LIST_TTL_SECS),
        }
    }

    /// Never fails: a broken upstream yields the stale list, or an empty one
    /// if nothing was ever loaded.
    pub async fn emails(&self) -> HashSet<String> {
        let now = self.clock.now();
        if let Some(age) = self.cache.age(now) {
            tracing::debug!("Allow-list cache age: {}s", age.num_seconds());
        }

        match self
            .cache
            .get_or_refresh(now, || self.source.fetch_emails())
            .await
        {
            Ok((emails, from_cache)) => {
                if !from_cache {
                    tracing::info!("✅ Fetched {} authorized emails", emails.len());
                }
                emails
            }
            Err(e) => {
                tracing::error!("🚨 No cached allow-list and fetch failed: {}", e);
                HashSet::new()
            }
        }
    }

    pub async fn is_authorized(&self, email: &str) -> bool {
        let wanted = email.trim().to_lowercase();
        self.emails().await.contains(&wanted)
    }

    /// Bypasses the TTL. Errors propagate so the caller can report them.
    pub async fn refresh(&self) -> Result<RefreshReport> {
        let started = Instant::now();
        let emails = self.source.fetch_emails().await?;
        let email_count = emails.len();
        let now = self.clock.now();
        self.cache.insert(now, emails);

        let duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            "✅ Email cache refreshed: {} emails loaded in {}ms",
            email_count,
            duration_ms
        );

        Ok(RefreshReport {
            email_count,
            duration_ms,
            timestamp: now,
        })
    }
}

/// Cron/admin endpoints expect `Authorization: Bearer <CRON_SECRET>`.
pub fn authorize_cron(authorization: Option<&str>, cron_secret: Option<&str>) -> Result<()> {
    let secret = cron_secret
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PatrolError::MissingConfigError {
            field: "CRON_SECRET".to_string(),
        })?;

    let expected = format!("Bearer {}", secret);
    if authorization != Some(expected.as_str()) {
        tracing::warn!("⚠️ Unauthorized cron request attempt");
        return Err(PatrolError::Unauthorized {
            message: "invalid or missing bearer token".to_string(),
        });
    }
    Ok(())
}
