//! Consent-gated unique visitor counters
//!
//! A browser is identified by a random `visitor_id` cookie. Each id is
//! credited at most once per calendar month bucket and at most once in the
//! all-time bucket. Counts are approximate: clearing cookies yields a new id.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Local};
use rand::{distributions::Alphanumeric, Rng};
use tokio::{sync::RwLock, task::JoinHandle};

use crate::{
    error::AppResult,
    models::visitor::{ConsentState, VisitorStats},
    services::store::{parse_counter, KeyValueStore},
};

pub const VISITOR_ID: &str = "visitor_id";
pub const LAST_VISIT_MONTH: &str = "last_visit_month";
pub const LAST_VISIT_DATE: &str = "last_visit_date";
pub const TOTAL_VISITORS: &str = "total_visitors";
pub const TOTAL_VISITORS_IDS: &str = "total_visitors_ids";

const COOKIE_TTL: Duration = Duration::from_secs(365 * 24 * 3600);

/// `YYYY-MM` bucket of a local timestamp
pub fn month_key(now: &DateTime<Local>) -> String {
    now.format("%Y-%m").to_string()
}

/// `YYYY-MM-DD` of a local timestamp
pub fn date_key(now: &DateTime<Local>) -> String {
    now.format("%Y-%m-%d").to_string()
}

pub fn monthly_count_key(month: &str) -> String {
    format!("visitors_{}", month)
}

pub fn monthly_ids_key(month: &str) -> String {
    format!("visitors_{}_ids", month)
}

/// Base-36 millisecond timestamp followed by a random lowercase suffix
pub fn generate_visitor_id(now: &DateTime<Local>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|c| (c as char).to_ascii_lowercase())
        .collect();
    format!("{}{}", to_base36(now.timestamp_millis().max(0) as u64), suffix)
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[derive(Debug, Clone, Copy)]
struct Counts {
    monthly: u64,
    total: u64,
}

#[derive(Debug, Clone)]
struct Snapshot {
    month: String,
    counts: Counts,
}

/// Visitor counters over a long-lived store shared by all requests
#[derive(Clone)]
pub struct VisitorTracker {
    store: Arc<dyn KeyValueStore>,
    snapshot: Arc<RwLock<Option<Snapshot>>>,
}

impl VisitorTracker {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            snapshot: Arc::new(RwLock::new(None)),
        }
    }

    /// Record the visit (when analytics consent is granted) and return the
    /// current counters
    ///
    /// Storage failures are logged and leave the counters untouched.
    pub async fn refresh_stats<C: KeyValueStore + ?Sized>(
        &self,
        cookies: &C,
        consent: ConsentState,
        now: DateTime<Local>,
    ) -> VisitorStats {
        if consent.allows_tracking() {
            if let Err(e) = self.record_visit(cookies, &now).await {
                tracing::warn!("Visitor tracking skipped: {}", e);
            }
        }
        self.read_stats(consent, now).await
    }

    /// Counters straight from the store, without recording anything
    pub async fn read_stats(&self, consent: ConsentState, now: DateTime<Local>) -> VisitorStats {
        let counts = match self.read_counts(&now).await {
            Ok(counts) => {
                self.remember(&now, counts).await;
                counts
            }
            Err(e) => {
                tracing::warn!("Failed to read visitor counters: {}", e);
                Counts { monthly: 0, total: 0 }
            }
        };

        VisitorStats {
            monthly_visitors: counts.monthly,
            total_visitors: counts.total,
            is_tracking: consent.allows_tracking(),
        }
    }

    /// Counters from the periodic snapshot, falling back to the store when
    /// the snapshot is missing or belongs to another month
    pub async fn cached_stats(&self, consent: ConsentState, now: DateTime<Local>) -> VisitorStats {
        let cached = {
            let snapshot = self.snapshot.read().await;
            match snapshot.as_ref() {
                Some(s) if s.month == month_key(&now) => Some(s.counts),
                _ => None,
            }
        };

        match cached {
            Some(counts) => VisitorStats {
                monthly_visitors: counts.monthly,
                total_visitors: counts.total,
                is_tracking: consent.allows_tracking(),
            },
            None => self.read_stats(consent, now).await,
        }
    }

    /// Re-read the counters into the snapshot
    pub async fn refresh_snapshot(&self, now: DateTime<Local>) {
        match self.read_counts(&now).await {
            Ok(counts) => self.remember(&now, counts).await,
            Err(e) => tracing::warn!("Visitor snapshot refresh failed: {}", e),
        }
    }

    /// Refresh the snapshot every `period` until the task is aborted
    pub fn spawn_refresher(&self, period: Duration) -> JoinHandle<()> {
        let tracker = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                tracker.refresh_snapshot(Local::now()).await;
                tracing::debug!("Visitor snapshot refreshed");
            }
        })
    }

    async fn remember(&self, now: &DateTime<Local>, counts: Counts) {
        *self.snapshot.write().await = Some(Snapshot {
            month: month_key(now),
            counts,
        });
    }

    async fn read_counts(&self, now: &DateTime<Local>) -> AppResult<Counts> {
        let month = month_key(now);
        let monthly = self.store.get(&monthly_count_key(&month)).await?;
        let total = self.store.get(TOTAL_VISITORS).await?;
        Ok(Counts {
            monthly: parse_counter(monthly.as_deref()),
            total: parse_counter(total.as_deref()),
        })
    }

    async fn record_visit<C: KeyValueStore + ?Sized>(
        &self,
        cookies: &C,
        now: &DateTime<Local>,
    ) -> AppResult<()> {
        let visitor_id = match cookies.get(VISITOR_ID).await? {
            Some(id) if !id.is_empty() => id,
            _ => {
                let id = generate_visitor_id(now);
                cookies.set(VISITOR_ID, &id, Some(COOKIE_TTL)).await?;
                tracing::debug!(visitor_id = %id, "New visitor id issued");
                id
            }
        };

        // Last-visit cookies move only after the bucket accepted the id
        let month = month_key(now);
        if cookies.get(LAST_VISIT_MONTH).await?.as_deref() != Some(month.as_str()) {
            if self
                .credit(&monthly_count_key(&month), &monthly_ids_key(&month), &visitor_id)
                .await?
            {
                tracing::info!(month = %month, "Monthly visitor counted");
            }
            cookies.set(LAST_VISIT_MONTH, &month, Some(COOKIE_TTL)).await?;
        }

        let today = date_key(now);
        if cookies.get(LAST_VISIT_DATE).await?.as_deref() != Some(today.as_str()) {
            if self
                .credit(TOTAL_VISITORS, TOTAL_VISITORS_IDS, &visitor_id)
                .await?
            {
                tracing::info!("All-time visitor counted");
            }
            cookies.set(LAST_VISIT_DATE, &today, Some(COOKIE_TTL)).await?;
        }

        Ok(())
    }

    /// Add `visitor_id` to a bucket unless it is already there
    ///
    /// Only the request that inserts the id bumps the count.
    async fn credit(&self, count_key: &str, ids_key: &str, visitor_id: &str) -> AppResult<bool> {
        if !self.store.add_unique(ids_key, visitor_id).await? {
            return Ok(false);
        }
        self.store.incr(count_key).await?;
        Ok(true)
    }
}
