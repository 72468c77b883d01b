//! Runtime configuration resolved from defaults and `BIST_*` environment variables.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::YahooSource;
use crate::cache::DEFAULT_CACHE_WINDOW;
use crate::data_source::{DocumentLocation, JsonDocumentSource, SecuritySource};
use crate::http_client::HttpClient;
use crate::service::StockService;
use crate::storage::FileStore;
use crate::ValidationError;

/// Which source fills the primary tier of the resolver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrimaryKind {
    #[default]
    Document,
    Yahoo,
}

impl PrimaryKind {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "document" | "json" => Ok(Self::Document),
            "yahoo" => Ok(Self::Yahoo),
            _ => Err(ValidationError::InvalidSource {
                value: input.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// Directory holding durable keys (`bist_stocks.json`, `theme.json`).
    pub home: PathBuf,
    /// URL or file path of the `{ "stocks": [...] }` document.
    pub data_url: String,
    pub primary: PrimaryKind,
    pub cache_window: Duration,
    pub request_timeout_ms: u64,
    pub synthetic_fallback: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            home: default_home(env::var_os("HOME").map(PathBuf::from)),
            data_url: String::from("data.json"),
            primary: PrimaryKind::Document,
            cache_window: DEFAULT_CACHE_WINDOW,
            request_timeout_ms: 10_000,
            synthetic_fallback: true,
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve settings through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self {
            home: default_home(get("HOME").map(PathBuf::from)),
            ..Self::default()
        };

        if let Some(home) = get("BIST_HOME") {
            config.home = PathBuf::from(home);
        }
        if let Some(data_url) = get("BIST_DATA_URL") {
            config.data_url = data_url;
        }
        if let Some(source) = get("BIST_SOURCE") {
            config.primary = PrimaryKind::parse(&source)?;
        }
        if let Some(ttl) = get("BIST_CACHE_TTL_SECS") {
            let secs = ttl
                .trim()
                .parse::<u64>()
                .map_err(|_| ValidationError::InvalidDuration { value: ttl.clone() })?;
            config.cache_window = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = home.into();
        self
    }

    pub fn with_data_url(mut self, data_url: impl Into<String>) -> Self {
        self.data_url = data_url.into();
        self
    }

    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    pub fn document_location(&self) -> DocumentLocation {
        DocumentLocation::parse(&self.data_url)
    }

    pub fn open_store(&self) -> FileStore {
        FileStore::new(self.home.clone())
    }

    /// Primary source selected by [`Self::primary`].
    pub fn primary_source(&self, http: Arc<dyn HttpClient>) -> Arc<dyn SecuritySource> {
        match self.primary {
            PrimaryKind::Document => Arc::new(
                JsonDocumentSource::with_http_client(self.document_location(), http)
                    .with_timeout_ms(self.request_timeout_ms),
            ),
            PrimaryKind::Yahoo => {
                Arc::new(YahooSource::new(http).with_timeout_ms(self.request_timeout_ms))
            }
        }
    }

    /// Resolver wired to the configured source and the file store under `home`.
    pub fn build_service(&self, http: Arc<dyn HttpClient>) -> StockService {
        let service = StockService::new(self.primary_source(http), Arc::new(self.open_store()))
            .with_cache_window(self.cache_window);
        if self.synthetic_fallback {
            service
        } else {
            service.without_synthetic_fallback()
        }
    }
}

fn default_home(user_home: Option<PathBuf>) -> PathBuf {
    match user_home {
        Some(home) if !home.as_os_str().is_empty() => home.join(".bist"),
        _ => PathBuf::from(".bist"),
    }
}
