//! Polling query wrapper around the resolver.
//!
//! [`QueryClient`] adds the periodic refetch, staleness and retry contract on
//! top of [`StockService`]. Consumers observe a [`QueryState`] and never talk to
//! the resolver directly.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cache::{Clock, SystemClock};
use crate::data_source::SourceError;
use crate::retry::RetryConfig;
use crate::service::{Resolution, ResolvedFrom, StockService};
use crate::{Security, UtcDateTime};

/// Terminal failure reported once automatic retries are exhausted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("securities could not be loaded after {attempts} attempt(s): {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: SourceError,
    },
}

impl QueryError {
    pub fn source_error(&self) -> &SourceError {
        match self {
            Self::Exhausted { source, .. } => source,
        }
    }
}

/// Polling and retry settings.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    pub refetch_interval: Duration,
    /// Age after which served data is flagged stale.
    pub stale_time: Duration,
    pub retry: RetryConfig,
    pub refetch_on_window_focus: bool,
    pub refetch_on_mount: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            refetch_interval: Duration::from_secs(15 * 60),
            stale_time: Duration::from_secs(10 * 60),
            retry: RetryConfig::default(),
            refetch_on_window_focus: false,
            refetch_on_mount: true,
        }
    }
}

/// Observable state of the query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState {
    /// No data yet.
    Loading,
    /// Retries exhausted and nothing to show.
    Error { error: QueryError },
    Success {
        data: Vec<Security>,
        from: ResolvedFrom,
        updated_at: UtcDateTime,
        is_stale: bool,
        /// Most recent failed refetch; previous data is still served.
        last_error: Option<QueryError>,
    },
}

impl QueryState {
    pub fn data(&self) -> Option<&[Security]> {
        match self {
            Self::Success { data, .. } => Some(data),
            _ => None,
        }
    }

    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn summary(&self) -> QuerySummary {
        match self {
            Self::Loading => QuerySummary {
                status: "loading",
                count: 0,
                from: None,
                updated_at: None,
                is_stale: false,
                error: None,
            },
            Self::Error { error } => QuerySummary {
                status: "error",
                count: 0,
                from: None,
                updated_at: None,
                is_stale: false,
                error: Some(error.to_string()),
            },
            Self::Success {
                data,
                from,
                updated_at,
                is_stale,
                last_error,
            } => QuerySummary {
                status: "success",
                count: data.len(),
                from: Some(*from),
                updated_at: Some(*updated_at),
                is_stale: *is_stale,
                error: last_error.as_ref().map(ToString::to_string),
            },
        }
    }
}

/// Serializable one-line view of a [`QueryState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuerySummary {
    pub status: &'static str,
    pub count: usize,
    pub from: Option<ResolvedFrom>,
    pub updated_at: Option<UtcDateTime>,
    pub is_stale: bool,
    pub error: Option<String>,
}

/// Query layer over a shared resolver.
pub struct QueryClient {
    service: Arc<StockService>,
    options: QueryOptions,
    clock: Arc<dyn Clock>,
    state: RwLock<QueryState>,
}

impl QueryClient {
    pub fn new(service: Arc<StockService>, options: QueryOptions) -> Self {
        Self {
            service,
            options,
            clock: Arc::new(SystemClock),
            state: RwLock::new(QueryState::Loading),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn service(&self) -> &Arc<StockService> {
        &self.service
    }

    /// Current state with staleness evaluated against the clock.
    pub async fn state(&self) -> QueryState {
        let mut state = self.state.read().await.clone();
        if let QueryState::Success {
            updated_at,
            is_stale,
            ..
        } = &mut state
        {
            *is_stale = self.is_stale(*updated_at);
        }
        state
    }

    /// First load for a new consumer.
    pub async fn mount(&self) -> QueryState {
        let has_data = self.state.read().await.data().is_some();
        if self.options.refetch_on_mount || !has_data {
            self.fetch().await
        } else {
            self.state().await
        }
    }

    /// Focus events only refetch when enabled.
    pub async fn window_focused(&self) -> QueryState {
        if self.options.refetch_on_window_focus {
            self.fetch().await
        } else {
            self.state().await
        }
    }

    /// Run the resolver with automatic retries.
    pub async fn fetch(&self) -> QueryState {
        let outcome = self.run_with_retry(false).await;
        self.apply(outcome).await
    }

    /// Forced refresh with automatic retries.
    pub async fn refresh(&self) -> QueryState {
        let outcome = self.run_with_retry(true).await;
        self.apply(outcome).await
    }

    /// Poll every `refetch_interval`, handing each new state to `on_state`
    /// until it returns [`ControlFlow::Break`].
    pub async fn watch<F>(&self, mut on_state: F) -> QueryState
    where
        F: FnMut(&QueryState) -> ControlFlow<()>,
    {
        let mut ticker = tokio::time::interval(self.options.refetch_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut first = true;

        loop {
            ticker.tick().await;
            let state = if first {
                first = false;
                self.mount().await
            } else {
                self.fetch().await
            };

            if on_state(&state).is_break() {
                return state;
            }
        }
    }

    async fn run_with_retry(&self, force: bool) -> Result<Resolution, QueryError> {
        let retry = &self.options.retry;
        let mut retries_done = 0;

        loop {
            let outcome = if force && retries_done == 0 {
                self.service.force_refresh().await
            } else {
                self.service.resolve().await
            };

            match outcome {
                Ok(resolution) => return Ok(resolution),
                Err(error) if retry.allows_retry(retries_done) => {
                    let delay = retry.delay;
                    warn!(
                        attempt = retries_done + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "resolution failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    retries_done += 1;
                }
                Err(error) => {
                    return Err(QueryError::Exhausted {
                        attempts: retries_done + 1,
                        source: error,
                    });
                }
            }
        }
    }

    async fn apply(&self, outcome: Result<Resolution, QueryError>) -> QueryState {
        let now = self.clock.now();
        let mut state = self.state.write().await;

        let next = match (outcome, &*state) {
            (Ok(resolution), _) => {
                debug!(
                    from = resolution.from.as_str(),
                    count = resolution.stocks.len(),
                    "query succeeded"
                );
                QueryState::Success {
                    data: resolution.stocks,
                    from: resolution.from,
                    updated_at: now,
                    is_stale: false,
                    last_error: None,
                }
            }
            (
                Err(error),
                QueryState::Success {
                    data,
                    from,
                    updated_at,
                    ..
                },
            ) => QueryState::Success {
                data: data.clone(),
                from: *from,
                updated_at: *updated_at,
                is_stale: self.is_stale(*updated_at),
                last_error: Some(error),
            },
            (Err(error), _) => QueryState::Error { error },
        };

        *state = next.clone();
        next
    }

    fn is_stale(&self, updated_at: UtcDateTime) -> bool {
        self.clock.now() >= updated_at.plus(self.options.stale_time)
    }
}
