// ⏱️ Daily AI quota - fixed-window counter per user or IP
//
// Mirrors the daily counter the hosted deployment keeps in its key-value
// store: one bucket per caller per UTC day, reset at midnight. Both AI
// endpoints draw from the same bucket. Callers are keyed by user id when a
// token is present, by client IP otherwise; keys are hashed so raw IPs never
// sit in memory or logs.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

// ============================================================================
// QUOTA KEY
// ============================================================================

/// Stable bucket key: user id when authenticated, client IP otherwise.
/// Hashed so the map never holds raw identifiers.
pub fn quota_key(user_id: Option<&str>, client_ip: &str) -> String {
    let raw = match user_id {
        Some(id) => format!("user:{}", id),
        None => format!("ip:{}", client_ip),
    };
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// DAILY QUOTA
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    /// Request admitted; `remaining` uses left today
    Allowed { remaining: u32 },

    /// Bucket empty until the next UTC day
    Exhausted,
}

impl QuotaDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, QuotaDecision::Allowed { .. })
    }
}

/// Fixed-window daily counter. The window is the UTC calendar day; a check
/// on a new day resets the caller's bucket.
pub struct DailyQuota {
    limit: u32,
    buckets: Mutex<HashMap<String, (NaiveDate, u32)>>,
}

// Stale-entry sweep threshold; buckets from previous days are dropped once
// the map grows past this
const PRUNE_THRESHOLD: usize = 10_000;

impl DailyQuota {
    pub fn new(limit: u32) -> Self {
        DailyQuota {
            limit,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Admit or reject one request for `key` on `today`, incrementing the
    /// bucket when admitted.
    pub fn check(&self, key: &str, today: NaiveDate) -> QuotaDecision {
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());

        if buckets.len() > PRUNE_THRESHOLD {
            buckets.retain(|_, (date, _)| *date == today);
        }

        let bucket = buckets.entry(key.to_string()).or_insert((today, 0));
        if bucket.0 != today {
            *bucket = (today, 0);
        }

        if bucket.1 >= self.limit {
            return QuotaDecision::Exhausted;
        }

        bucket.1 += 1;
        QuotaDecision::Allowed {
            remaining: self.limit - bucket.1,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
