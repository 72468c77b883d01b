//! # BIST Core
//!
//! Data layer for the Borsa İstanbul dashboard.
//!
//! ## Overview
//!
//! This crate provides everything below the presentation layer:
//!
//! - **Canonical domain model** for a listed security
//! - **Layered data resolution**: memory cache, remote document, durable
//!   snapshot, synthetic data
//! - **Polling query client** with staleness and retry
//! - **Table operations**: filtering, sorting, CSV export, display formatting
//! - **Theme preference** persisted next to the snapshot
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Yahoo Finance source |
//! | [`cache`] | In-memory cache record and clocks |
//! | [`config`] | Environment-driven configuration |
//! | [`data_source`] | Source trait, source errors, JSON document source |
//! | [`domain`] | Domain models (Security, Symbol, UtcDateTime) |
//! | [`envelope`] | Response envelope with metadata |
//! | [`error`] | Core error types |
//! | [`export`] | CSV export |
//! | [`filter`] | Filter criteria |
//! | [`format`] | tr-TR display formatting |
//! | [`http_client`] | HTTP client abstraction |
//! | [`query`] | Polling query client |
//! | [`retry`] | Retry policy |
//! | [`service`] | Data source resolver |
//! | [`sort`] | Column sorting |
//! | [`storage`] | Durable key-value storage |
//! | [`synthetic`] | Synthetic record generator |
//! | [`theme`] | Light/dark preference |
//! | [`throttling`] | Rate limiting support |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bist_core::{DashboardConfig, ReqwestHttpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DashboardConfig::from_env()?;
//!     let service = config.build_service(Arc::new(ReqwestHttpClient::default()));
//!
//!     let resolution = service.resolve().await?;
//!     println!("{} securities from {}", resolution.stocks.len(), resolution.from);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / User     │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  QueryClient    │  refetch interval, staleness, retries
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  StockService   │────▶│ KeyValueStore    │
//! │  (resolver)     │     │ (snapshot)       │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ SecuritySource  │────▶│ HTTP Client      │
//! │ (document/Yahoo)│     │ (reqwest)        │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Source failures are structured and never surface past the resolver
//! while a lower tier can still serve data:
//!
//! ```rust
//! use bist_core::{SourceError, SourceErrorKind};
//!
//! fn describe(error: &SourceError) -> &'static str {
//!     match error.kind() {
//!         SourceErrorKind::Transport | SourceErrorKind::Status => "upstream unavailable",
//!         SourceErrorKind::Schema => "upstream sent an unexpected document",
//!         _ => "other failure",
//!     }
//! }
//! ```

pub mod adapters;
pub mod cache;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod export;
pub mod filter;
pub mod format;
pub mod http_client;
pub mod query;
pub mod retry;
pub mod service;
pub mod sort;
pub mod storage;
pub mod synthetic;
pub mod theme;
pub mod throttling;

// Re-export commonly used types at crate root for convenience

// Adapter implementations
pub use adapters::YahooSource;

// Caching
pub use cache::{CacheRecord, Clock, ManualClock, SystemClock, DEFAULT_CACHE_WINDOW};

// Configuration
pub use config::{DashboardConfig, PrimaryKind};

// Data source trait and types
pub use data_source::{
    parse_feed, DocumentLocation, JsonDocumentSource, SecuritySource, SourceError,
    SourceErrorKind,
};

// Domain models
pub use domain::{Security, SecurityFeed, Symbol, UtcDateTime};

// Envelope types
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta};

// Error types
pub use error::ValidationError;

// Table operations
pub use export::{export_file_name, to_csv, write_csv, ExportError, CSV_HEADERS};
pub use filter::{apply_filters, sectors_of, FilterCriteria};
pub use sort::{SortColumn, SortDirection, SortState};

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient, ScriptedHttpClient,
};

// Query layer
pub use query::{QueryClient, QueryError, QueryOptions, QueryState, QuerySummary};

// Retry logic
pub use retry::RetryConfig;

// Resolver
pub use service::{CacheStatus, Resolution, ResolvedFrom, StockService};

// Storage
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError, StoredSnapshot};

// Synthetic data
pub use synthetic::SyntheticGenerator;

// Theme
pub use theme::{ColorSchemeHint, Theme, ThemePreference};

// Throttling
pub use throttling::RequestPacer;
