//! Primary data source contract and the JSON document source.
//!
//! A [`SecuritySource`] produces the complete security list or fails as a
//! whole. The resolver treats every [`SourceError`] as a signal to fall
//! through to the next tier; errors are never partially applied.
//!
//! | Source | Location | Notes |
//! |--------|----------|-------|
//! | [`JsonDocumentSource`] | URL or file path | `{ "stocks": [...] }` document |
//! | [`crate::adapters::YahooSource`] | Yahoo Finance | chart + quoteSummary per symbol |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use crate::http_client::{HttpClient, HttpError, HttpRequest, ReqwestHttpClient};
use crate::{Security, SecurityFeed};

/// Source-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Network, timeout or file read failure.
    Transport,
    /// Non-success HTTP status.
    Status,
    /// Payload is not JSON or lacks a valid `stocks` list.
    Schema,
    /// Durable snapshot exists but could not be read.
    Snapshot,
    /// Source returned no usable records.
    Empty,
    InvalidRequest,
    Internal,
}

/// Structured source error carried through resolver fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Transport,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            kind: SourceErrorKind::Status,
            message: format!("HTTP error! status: {status}"),
            retryable: status == 408 || status == 429 || status >= 500,
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Schema,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn snapshot(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Snapshot,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Empty,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Transport => "source.transport",
            SourceErrorKind::Status => "source.status",
            SourceErrorKind::Schema => "source.schema",
            SourceErrorKind::Snapshot => "source.snapshot",
            SourceErrorKind::Empty => "source.empty",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Primary source contract used by the resolver.
///
/// Implementations must return the complete list or an error; the resolver
/// never merges results from different tiers.
pub trait SecuritySource: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    fn fetch<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Security>, SourceError>> + Send + 'a>>;
}

/// Where the primary JSON document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentLocation {
    Url(String),
    File(PathBuf),
}

impl DocumentLocation {
    /// `http://` and `https://` inputs are URLs, anything else is a path.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        let lowered = trimmed.to_ascii_lowercase();
        if lowered.starts_with("http://") || lowered.starts_with("https://") {
            Self::Url(trimmed.to_owned())
        } else {
            Self::File(PathBuf::from(trimmed))
        }
    }
}

impl Display for DocumentLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fetches and validates the `{ "stocks": [...] }` document.
#[derive(Clone)]
pub struct JsonDocumentSource {
    location: DocumentLocation,
    http: Arc<dyn HttpClient>,
    timeout_ms: u64,
}

impl JsonDocumentSource {
    pub fn new(location: DocumentLocation) -> Self {
        Self::with_http_client(location, Arc::new(ReqwestHttpClient::default()))
    }

    pub fn with_http_client(location: DocumentLocation, http: Arc<dyn HttpClient>) -> Self {
        Self {
            location,
            http,
            timeout_ms: 10_000,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn location(&self) -> &DocumentLocation {
        &self.location
    }

    async fn read_document(&self) -> Result<String, SourceError> {
        match &self.location {
            DocumentLocation::Url(url) => {
                let request = HttpRequest::get(url.clone())
                    .with_header("accept", "application/json")
                    .with_timeout_ms(self.timeout_ms);
                let response = self
                    .http
                    .execute(request)
                    .await
                    .map_err(|error| transport_error(url, self.timeout_ms, &error))?;
                if !response.is_success() {
                    return Err(SourceError::status(response.status));
                }
                Ok(response.body)
            }
            DocumentLocation::File(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|error| {
                    SourceError::transport(format!("failed to read '{}': {error}", path.display()))
                }),
        }
    }
}

pub(crate) fn transport_error(url: &str, timeout_ms: u64, error: &HttpError) -> SourceError {
    if error.is_timeout() {
        SourceError::transport(format!("request to '{url}' timed out after {timeout_ms}ms"))
    } else {
        SourceError::transport(format!("request to '{url}' failed: {error}"))
    }
}

impl SecuritySource for JsonDocumentSource {
    fn name(&self) -> &'static str {
        "document"
    }

    fn fetch<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Security>, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let body = self.read_document().await?;
            parse_feed(&body)
        })
    }
}

/// Parse a document body, requiring a top-level `stocks` array.
pub fn parse_feed(body: &str) -> Result<Vec<Security>, SourceError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|error| SourceError::schema(format!("document is not valid JSON: {error}")))?;

    if !value.get("stocks").is_some_and(serde_json::Value::is_array) {
        return Err(SourceError::schema(
            "document must contain a 'stocks' array",
        ));
    }

    let feed: SecurityFeed = serde_json::from_value(value)
        .map_err(|error| SourceError::schema(format!("invalid security record: {error}")))?;
    Ok(feed.stocks)
}
