//! Per-request timing
//!
//! Tracks when each request started so handlers can report elapsed time.
//! Entries expire after a fixed TTL; [`RequestMetrics::evict_expired`] removes
//! entries whose request never called [`RequestMetrics::clear`].

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

/// Default lifetime of a request entry
pub const DEFAULT_REQUEST_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
struct Entry {
    method: String,
    start: Instant,
    expires_at: Instant,
}

/// Timing snapshot for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseMetrics {
    pub request_id: String,
    pub method: String,
    pub elapsed_ms: u64,
}

/// Registry of in-flight requests
#[derive(Debug)]
pub struct RequestMetrics {
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry>>,
}

impl RequestMetrics {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, HashMap<String, Entry>> {
        self.entries.write().unwrap_or_else(|poisoned| {
            tracing::warn!("request metrics lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, HashMap<String, Entry>> {
        self.entries.read().unwrap_or_else(|poisoned| {
            tracing::warn!("request metrics lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Record the start of a request
    pub fn request_start(&self, request_id: &str, method: &str) {
        self.request_start_at(request_id, method, Instant::now());
    }

    pub fn request_start_at(&self, request_id: &str, method: &str, now: Instant) {
        self.write_entries().insert(
            request_id.to_string(),
            Entry {
                method: method.to_string(),
                start: now,
                expires_at: now + self.ttl,
            },
        );
    }

    /// Elapsed time for a request, or `None` if unknown or expired
    pub fn get(&self, request_id: &str) -> Option<ResponseMetrics> {
        self.get_at(request_id, Instant::now())
    }

    pub fn get_at(&self, request_id: &str, now: Instant) -> Option<ResponseMetrics> {
        let entries = self.read_entries();
        let entry = entries.get(request_id)?;
        if now >= entry.expires_at {
            return None;
        }
        Some(ResponseMetrics {
            request_id: request_id.to_string(),
            method: entry.method.clone(),
            elapsed_ms: now.saturating_duration_since(entry.start).as_millis() as u64,
        })
    }

    /// Remove a finished request, returning its final timing
    pub fn clear(&self, request_id: &str) -> Option<ResponseMetrics> {
        let metrics = self.get(request_id);
        self.write_entries().remove(request_id);
        metrics
    }

    /// Drop expired entries, returning how many were removed
    pub fn evict_expired(&self) -> usize {
        self.evict_expired_at(Instant::now())
    }

    pub fn evict_expired_at(&self, now: Instant) -> usize {
        let mut entries = self.write_entries();
        let before = entries.len();
        entries.retain(|_, e| now < e.expires_at);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_entries().is_empty()
    }
}

impl Default for RequestMetrics {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_and_get() {
        let metrics = RequestMetrics::default();
        let t0 = Instant::now();
        metrics.request_start_at("req-1", "POST", t0);

        let snapshot = metrics
            .get_at("req-1", t0 + Duration::from_millis(250))
            .unwrap();
        assert_eq!(snapshot.method, "POST");
        assert_eq!(snapshot.elapsed_ms, 250);
        assert!(metrics.get("missing").is_none());
    }

    #[test]
    fn test_expired_entry_is_hidden_and_evicted() {
        let metrics = RequestMetrics::new(Duration::from_secs(10));
        let t0 = Instant::now();
        metrics.request_start_at("old", "GET", t0);
        metrics.request_start_at("new", "GET", t0 + Duration::from_secs(8));

        let later = t0 + Duration::from_secs(11);
        assert!(metrics.get_at("old", later).is_none());
        assert!(metrics.get_at("new", later).is_some());

        assert_eq!(metrics.evict_expired_at(later), 1);
        assert_eq!(metrics.len(), 1);
    }

    #[test]
    fn test_clear_removes_entry() {
        let metrics = RequestMetrics::default();
        metrics.request_start("req-2", "GET");
        let done = metrics.clear("req-2").unwrap();
        assert_eq!(done.request_id, "req-2");
        assert!(metrics.is_empty());
        assert!(metrics.clear("req-2").is_none());
    }
}
