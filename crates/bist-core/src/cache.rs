//! In-memory cache record held by the resolver.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::{Security, UtcDateTime};

/// Validity window of a resolved list.
pub const DEFAULT_CACHE_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Time source for cache age checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> UtcDateTime;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> UtcDateTime {
        UtcDateTime::now()
    }
}

/// Settable clock for tests and replays.
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Arc<Mutex<UtcDateTime>>,
}

impl ManualClock {
    pub fn new(start: UtcDateTime) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut current) = self.current.lock() {
            *current = current.plus(by);
        }
    }

    pub fn set(&self, to: UtcDateTime) {
        if let Ok(mut current) = self.current.lock() {
            *current = to;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> UtcDateTime {
        self.current
            .lock()
            .map(|current| *current)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }
}

/// Most recently resolved list and the time of the last fresh resolution.
///
/// The list and the timestamp move independently: adopting a durable snapshot
/// replaces the list but keeps the old timestamp, so the record stays invalid
/// and the next resolution retries the remote source.
#[derive(Debug, Clone)]
pub struct CacheRecord {
    stocks: Option<Vec<Security>>,
    last_fetch: Option<UtcDateTime>,
    window: Duration,
}

impl CacheRecord {
    pub fn new(window: Duration) -> Self {
        Self {
            stocks: None,
            last_fetch: None,
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Cached list when present and younger than the window.
    pub fn fresh(&self, now: UtcDateTime) -> Option<&[Security]> {
        if self.is_valid(now) {
            self.stocks.as_deref()
        } else {
            None
        }
    }

    pub fn is_valid(&self, now: UtcDateTime) -> bool {
        let Some(last_fetch) = self.last_fetch else {
            return false;
        };
        if self.stocks.is_none() {
            return false;
        }
        // A clock that moved backwards still counts as within the window.
        now < last_fetch.plus(self.window)
    }

    /// Replace the list and restart the window.
    pub fn store(&mut self, stocks: Vec<Security>, now: UtcDateTime) {
        self.stocks = Some(stocks);
        self.last_fetch = Some(now);
    }

    /// Replace the list without touching the timestamp.
    pub fn adopt(&mut self, stocks: Vec<Security>) {
        self.stocks = Some(stocks);
    }

    pub fn clear(&mut self) {
        self.stocks = None;
        self.last_fetch = None;
    }

    pub fn stocks(&self) -> Option<&[Security]> {
        self.stocks.as_deref()
    }

    pub fn last_fetch(&self) -> Option<UtcDateTime> {
        self.last_fetch
    }

    pub fn next_update_time(&self) -> Option<UtcDateTime> {
        self.last_fetch.map(|last| last.plus(self.window))
    }
}

impl Default for CacheRecord {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> UtcDateTime {
        UtcDateTime::parse("2024-01-01T09:00:00Z").expect("timestamp")
    }

    #[test]
    fn empty_record_is_never_valid() {
        let record = CacheRecord::default();
        assert!(!record.is_valid(t0()));
        assert!(record.fresh(t0()).is_none());
        assert_eq!(record.next_update_time(), None);
    }

    #[test]
    fn stored_record_expires_when_age_reaches_window() {
        let mut record = CacheRecord::default();
        record.store(Vec::new(), t0());

        assert!(record.is_valid(t0().plus(Duration::from_secs(14 * 60 + 59))));
        assert!(!record.is_valid(t0().plus(DEFAULT_CACHE_WINDOW)));
        assert_eq!(
            record.next_update_time(),
            Some(t0().plus(DEFAULT_CACHE_WINDOW))
        );
    }

    #[test]
    fn adopting_keeps_previous_timestamp() {
        let mut record = CacheRecord::default();
        record.adopt(Vec::new());

        assert!(record.stocks().is_some());
        assert_eq!(record.last_fetch(), None);
        assert!(!record.is_valid(t0()));
    }

    #[test]
    fn clear_drops_list_and_timestamp() {
        let mut record = CacheRecord::default();
        record.store(Vec::new(), t0());
        record.clear();

        assert!(record.stocks().is_none());
        assert_eq!(record.last_fetch(), None);
    }

    #[test]
    fn oversized_window_keeps_record_valid() {
        let mut record = CacheRecord::new(Duration::from_secs(u64::MAX));
        record.store(Vec::new(), t0());

        assert!(record.is_valid(t0()));
        assert!(record.next_update_time().is_some_and(|next| next > t0()));
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(t0());
        clock.advance(Duration::from_secs(60));
        assert_eq!(clock.now().format_rfc3339(), "2024-01-01T09:01:00Z");
    }
}
