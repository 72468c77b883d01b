//! Data source resolver.
//!
//! [`StockService`] answers "give me the security list" from the first tier
//! that can serve it:
//!
//! 1. in-memory cache younger than the validity window
//! 2. primary [`SecuritySource`] (persisted to durable storage on success)
//! 3. durable snapshot from the last successful fetch
//! 4. synthetic dataset over the fixed universe
//!
//! The whole chain runs under one async mutex, so concurrent callers are
//! serialized and a second caller sees the first caller's fresh cache.

use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::{CacheRecord, Clock, SystemClock, DEFAULT_CACHE_WINDOW};
use crate::data_source::{SecuritySource, SourceError};
use crate::storage::{KeyValueStore, StoredSnapshot};
use crate::synthetic::SyntheticGenerator;
use crate::{Security, UtcDateTime};

/// Tier that served a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedFrom {
    Cache,
    Remote,
    Snapshot,
    Synthetic,
}

impl ResolvedFrom {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Remote => "remote",
            Self::Snapshot => "snapshot",
            Self::Synthetic => "synthetic",
        }
    }
}

impl Display for ResolvedFrom {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved list together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub stocks: Vec<Security>,
    pub from: ResolvedFrom,
    /// Fallback reasons collected while walking the chain.
    pub warnings: Vec<String>,
}

/// Point-in-time view of the resolver cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStatus {
    pub valid: bool,
    pub cached_count: Option<usize>,
    pub last_fetch: Option<UtcDateTime>,
    pub next_update: Option<UtcDateTime>,
    pub window_secs: u64,
}

struct ResolverState {
    cache: CacheRecord,
    generator: SyntheticGenerator,
}

/// Resolver owning the cache record; construct once and share via `Arc`.
pub struct StockService {
    primary: Arc<dyn SecuritySource>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    synthetic_fallback: bool,
    state: Mutex<ResolverState>,
}

impl StockService {
    pub fn new(primary: Arc<dyn SecuritySource>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            primary,
            store,
            clock: Arc::new(SystemClock),
            synthetic_fallback: true,
            state: Mutex::new(ResolverState {
                cache: CacheRecord::new(DEFAULT_CACHE_WINDOW),
                generator: SyntheticGenerator::new(),
            }),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_cache_window(mut self, window: Duration) -> Self {
        self.state.get_mut().cache = CacheRecord::new(window);
        self
    }

    pub fn with_generator(mut self, generator: SyntheticGenerator) -> Self {
        self.state.get_mut().generator = generator;
        self
    }

    /// Fail instead of generating synthetic data when every other tier is empty.
    pub fn without_synthetic_fallback(mut self) -> Self {
        self.synthetic_fallback = false;
        self
    }

    /// Return the security list from the first tier that can serve it.
    pub async fn resolve(&self) -> Result<Resolution, SourceError> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();

        if let Some(stocks) = state.cache.fresh(now) {
            debug!(count = stocks.len(), "serving securities from memory cache");
            return Ok(Resolution {
                stocks: stocks.to_vec(),
                from: ResolvedFrom::Cache,
                warnings: Vec::new(),
            });
        }

        self.resolve_uncached(&mut state, now).await
    }

    /// Drop the cache and run the full chain regardless of cache age.
    pub async fn force_refresh(&self) -> Result<Resolution, SourceError> {
        let mut state = self.state.lock().await;
        state.cache.clear();
        info!("manual refresh requested");

        let now = self.clock.now();
        self.resolve_uncached(&mut state, now).await
    }

    pub async fn is_cache_valid(&self) -> bool {
        let state = self.state.lock().await;
        state.cache.is_valid(self.clock.now())
    }

    /// `None` until the first fresh resolution.
    pub async fn next_update_time(&self) -> Option<UtcDateTime> {
        self.state.lock().await.cache.next_update_time()
    }

    pub async fn status(&self) -> CacheStatus {
        let state = self.state.lock().await;
        let cache = &state.cache;
        CacheStatus {
            valid: cache.is_valid(self.clock.now()),
            cached_count: cache.stocks().map(<[Security]>::len),
            last_fetch: cache.last_fetch(),
            next_update: cache.next_update_time(),
            window_secs: cache.window().as_secs(),
        }
    }

    async fn resolve_uncached(
        &self,
        state: &mut ResolverState,
        now: UtcDateTime,
    ) -> Result<Resolution, SourceError> {
        let mut warnings = Vec::new();

        let primary_error = match self.primary.fetch().await {
            Ok(stocks) => {
                info!(
                    source = self.primary.name(),
                    count = stocks.len(),
                    "loaded securities from primary source"
                );
                state.cache.store(stocks.clone(), now);
                self.persist(StoredSnapshot::new(stocks.clone(), now)).await;
                return Ok(Resolution {
                    stocks,
                    from: ResolvedFrom::Remote,
                    warnings,
                });
            }
            Err(error) => {
                warn!(
                    source = self.primary.name(),
                    code = error.code(),
                    error = %error,
                    "primary source failed, trying durable snapshot"
                );
                warnings.push(error.to_string());
                error
            }
        };

        match self.load_snapshot().await {
            Ok(Some(snapshot)) => {
                info!(
                    count = snapshot.stocks.len(),
                    "loaded securities from durable snapshot"
                );
                state.cache.adopt(snapshot.stocks.clone());
                return Ok(Resolution {
                    stocks: snapshot.stocks,
                    from: ResolvedFrom::Snapshot,
                    warnings,
                });
            }
            Ok(None) => debug!("no durable snapshot available"),
            Err(error) => {
                warn!(code = error.code(), error = %error, "durable snapshot unreadable");
                warnings.push(error.to_string());
            }
        }

        if !self.synthetic_fallback {
            return Err(primary_error);
        }

        let stocks = state
            .generator
            .generate(now)
            .map_err(|error| SourceError::internal(format!("synthetic generation failed: {error}")))?;
        warn!(count = stocks.len(), "serving synthetic securities");
        state.cache.store(stocks.clone(), now);

        Ok(Resolution {
            stocks,
            from: ResolvedFrom::Synthetic,
            warnings,
        })
    }

    async fn load_snapshot(&self) -> Result<Option<StoredSnapshot>, SourceError> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || StoredSnapshot::load(store.as_ref()))
            .await
            .map_err(|error| SourceError::internal(format!("snapshot task failed: {error}")))?
            .map_err(|error| SourceError::snapshot(error.to_string()))
    }

    /// Write failures are logged and otherwise ignored.
    async fn persist(&self, snapshot: StoredSnapshot) {
        let store = Arc::clone(&self.store);
        let outcome = tokio::task::spawn_blocking(move || snapshot.save(store.as_ref())).await;
        match outcome {
            Ok(Ok(())) => debug!("durable snapshot updated"),
            Ok(Err(error)) => warn!(error = %error, "failed to persist durable snapshot"),
            Err(error) => warn!(error = %error, "snapshot persist task failed"),
        }
    }
}
