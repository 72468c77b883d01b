use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::data_source::{transport_error, SecuritySource, SourceError};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::synthetic::SYMBOLS;
use crate::throttling::RequestPacer;
use crate::{Security, Symbol, UtcDateTime};

const CHART_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const SUMMARY_BASE_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const SUMMARY_MODULES: &str = "price,summaryDetail,defaultKeyStatistics,financialData";

const DEFAULT_BATCH_SIZE: usize = 10;
const DEFAULT_BATCH_PAUSE: Duration = Duration::from_millis(100);
const REQUESTS_PER_SECOND: u32 = 20;

/// Sector used for symbols missing from [`SECTOR_MAPPING`].
pub const UNMAPPED_SECTOR: &str = "Diğer";

/// Known sector per large-cap symbol.
pub const SECTOR_MAPPING: &[(&str, &str)] = &[
    ("AEFES", "İçecek"),
    ("AKBNK", "Bankacılık"),
    ("ALARK", "Holding"),
    ("ARCLK", "Beyaz Eşya"),
    ("ASELS", "Savunma"),
    ("BIMAS", "Perakende"),
    ("EKGYO", "Gayrimenkul"),
    ("EREGL", "Çelik"),
    ("FROTO", "Otomotiv"),
    ("GARAN", "Bankacılık"),
    ("HALKB", "Bankacılık"),
    ("ISCTR", "Bankacılık"),
    ("KCHOL", "Holding"),
    ("KOZAL", "Madencilik"),
    ("KOZAA", "Madencilik"),
    ("KRDMD", "Çimento"),
    ("PETKM", "Petrokimya"),
    ("PGSUS", "Havacılık"),
    ("SAHOL", "Holding"),
    ("SASA", "Kimya"),
    ("SISE", "Cam"),
    ("SKBNK", "Bankacılık"),
    ("TAVHL", "Turizm"),
    ("TCELL", "Telekomünikasyon"),
    ("THYAO", "Havacılık"),
    ("TKFEN", "İnşaat"),
    ("TOASO", "Otomotiv"),
    ("TUPRS", "Petrol"),
    ("TURSG", "Sigorta"),
    ("ULKER", "Gıda"),
    ("VAKBN", "Bankacılık"),
    ("VESTL", "Tekstil"),
    ("YKBNK", "Bankacılık"),
    ("ZOREN", "Makine"),
];

pub fn sector_for(symbol: &str) -> &'static str {
    SECTOR_MAPPING
        .iter()
        .find(|(mapped, _)| *mapped == symbol)
        .map_or(UNMAPPED_SECTOR, |(_, sector)| sector)
}

/// Yahoo Finance primary source.
///
/// Each symbol costs one chart request (required) and one quoteSummary
/// request (optional). Symbols are fetched concurrently in batches with a
/// pause between batches; a symbol whose chart cannot be fetched is skipped.
#[derive(Clone)]
pub struct YahooSource {
    http: Arc<dyn HttpClient>,
    symbols: Vec<Symbol>,
    chart_base_url: String,
    summary_base_url: String,
    timeout_ms: u64,
    batch_size: usize,
    batch_pause: Duration,
    pacer: RequestPacer,
}

impl Default for YahooSource {
    fn default() -> Self {
        Self::new(Arc::new(ReqwestHttpClient::default()))
    }
}

impl YahooSource {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            symbols: SYMBOLS
                .iter()
                .filter_map(|symbol| Symbol::parse(symbol).ok())
                .collect(),
            chart_base_url: CHART_BASE_URL.to_owned(),
            summary_base_url: SUMMARY_BASE_URL.to_owned(),
            timeout_ms: 10_000,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_pause: DEFAULT_BATCH_PAUSE,
            pacer: RequestPacer::new(Duration::from_secs(1), REQUESTS_PER_SECOND),
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_symbols(mut self, symbols: Vec<Symbol>) -> Self {
        self.symbols = symbols;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_batch_pause(mut self, pause: Duration) -> Self {
        self.batch_pause = pause;
        self
    }

    pub fn with_pacer(mut self, pacer: RequestPacer) -> Self {
        self.pacer = pacer;
        self
    }

    /// Point the source at other hosts (mirrors, test fixtures).
    pub fn with_base_urls(
        mut self,
        chart_base_url: impl Into<String>,
        summary_base_url: impl Into<String>,
    ) -> Self {
        self.chart_base_url = chart_base_url.into().trim_end_matches('/').to_owned();
        self.summary_base_url = summary_base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    fn chart_url(&self, symbol: &Symbol) -> String {
        format!(
            "{}/{}?interval=1d&range=1d&includePrePost=false",
            self.chart_base_url,
            urlencoding::encode(&symbol.to_listing())
        )
    }

    fn summary_url(&self, symbol: &Symbol) -> String {
        format!(
            "{}/{}?modules={SUMMARY_MODULES}",
            self.summary_base_url,
            urlencoding::encode(&symbol.to_listing())
        )
    }

    fn fetcher(&self, symbol: &Symbol) -> SymbolFetch {
        SymbolFetch {
            http: Arc::clone(&self.http),
            symbol: symbol.clone(),
            chart_url: self.chart_url(symbol),
            summary_url: self.summary_url(symbol),
            timeout_ms: self.timeout_ms,
            pacer: self.pacer.clone(),
        }
    }

    async fn fetch_all(&self) -> Result<Vec<Security>, SourceError> {
        if self.symbols.is_empty() {
            return Err(SourceError::invalid_request("no symbols configured"));
        }

        let as_of = UtcDateTime::now();
        let batch_count = self.symbols.len().div_ceil(self.batch_size);
        let mut stocks = Vec::with_capacity(self.symbols.len());

        for (batch_index, batch) in self.symbols.chunks(self.batch_size).enumerate() {
            let mut tasks = JoinSet::new();
            for (position, symbol) in batch.iter().enumerate() {
                let fetch = self.fetcher(symbol);
                tasks.spawn(async move { (position, fetch.run().await) });
            }

            let mut fetched = Vec::with_capacity(batch.len());
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((position, Some(payload))) => fetched.push((position, payload)),
                    Ok((_, None)) => {}
                    Err(error) => warn!(%error, "yahoo fetch task failed"),
                }
            }
            fetched.sort_by_key(|(position, _)| *position);

            stocks.extend(
                fetched
                    .into_iter()
                    .filter_map(|(position, payload)| transform(&batch[position], payload, as_of)),
            );

            debug!(
                processed = (batch_index * self.batch_size + batch.len()),
                total = self.symbols.len(),
                "yahoo batch complete"
            );

            if batch_index + 1 < batch_count && !self.batch_pause.is_zero() {
                tokio::time::sleep(self.batch_pause).await;
            }
        }

        if stocks.is_empty() {
            return Err(SourceError::empty(
                "no security could be fetched from Yahoo Finance",
            ));
        }

        info!(
            count = stocks.len(),
            requested = self.symbols.len(),
            "fetched securities from Yahoo Finance"
        );
        Ok(stocks)
    }
}

impl SecuritySource for YahooSource {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    fn fetch<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Security>, SourceError>> + Send + 'a>> {
        Box::pin(self.fetch_all())
    }
}

/// Owned request plan for one symbol, movable into a spawned task.
struct SymbolFetch {
    http: Arc<dyn HttpClient>,
    symbol: Symbol,
    chart_url: String,
    summary_url: String,
    timeout_ms: u64,
    pacer: RequestPacer,
}

struct SymbolPayload {
    chart: ChartMeta,
    summary: Option<SummaryResult>,
}

impl SymbolFetch {
    async fn run(self) -> Option<SymbolPayload> {
        let chart = match self.get_json::<ChartEnvelope>(&self.chart_url).await {
            Ok(envelope) => envelope.chart.result?.into_iter().next()?.meta,
            Err(error) => {
                warn!(symbol = %self.symbol, %error, "skipping symbol without chart data");
                return None;
            }
        };

        let summary = match self.get_json::<SummaryEnvelope>(&self.summary_url).await {
            Ok(envelope) => envelope
                .quote_summary
                .result
                .and_then(|results| results.into_iter().next()),
            Err(error) => {
                debug!(symbol = %self.symbol, %error, "quote summary unavailable");
                None
            }
        };

        Some(SymbolPayload { chart, summary })
    }

    async fn get_json<T>(&self, url: &str) -> Result<T, SourceError>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.pacer.acquire().await;

        let request = HttpRequest::get(url)
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

        serde_json::from_str(&response.body)
            .map_err(|error| SourceError::schema(format!("unexpected Yahoo payload: {error}")))
    }
}

fn transform(symbol: &Symbol, payload: SymbolPayload, as_of: UtcDateTime) -> Option<Security> {
    let SymbolPayload { chart, summary } = payload;
    let summary = summary.unwrap_or_default();
    let price_module = summary.price.unwrap_or_default();
    let detail = summary.summary_detail.unwrap_or_default();
    let stats = summary.default_key_statistics.unwrap_or_default();

    let current_price = nonzero(chart.regular_market_price)
        .or(nonzero(chart.previous_close))
        .unwrap_or(0.0);
    if current_price <= 0.0 {
        debug!(symbol = %symbol, "skipping symbol without a price");
        return None;
    }
    let previous_close = nonzero(chart.previous_close).unwrap_or(current_price);
    let daily_change = current_price - previous_close;
    let daily_change_percent = if previous_close > 0.0 {
        daily_change / previous_close * 100.0
    } else {
        0.0
    };

    let name = chart
        .long_name
        .or(price_module.long_name)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| format!("{symbol} Hisse Senedi"));

    let reported_price_to_book = raw(&stats.price_to_book).filter(|pb| *pb > 0.0);
    let book_value = raw(&stats.book_value)
        .filter(|book| *book > 0.0)
        .or_else(|| reported_price_to_book.map(|pb| current_price / pb))
        .unwrap_or(current_price);

    let fifty_two_week_high = nonzero(raw(&detail.fifty_two_week_high))
        .or(nonzero(chart.fifty_two_week_high))
        .unwrap_or(current_price);
    let fifty_two_week_low = nonzero(raw(&detail.fifty_two_week_low))
        .or(nonzero(chart.fifty_two_week_low))
        .unwrap_or(current_price);

    let float_percent = match (raw(&stats.float_shares), raw(&stats.shares_outstanding)) {
        (Some(float), Some(outstanding)) if outstanding > 0.0 => Some(float / outstanding * 100.0),
        _ => None,
    };

    let mut security = match Security::new(
        symbol.clone(),
        name,
        sector_for(symbol.as_str()),
        current_price,
        book_value,
        as_of,
    ) {
        Ok(security) => security
            .with_daily_change(daily_change, daily_change_percent)
            .with_market_cap(
                nonzero(raw(&price_module.market_cap))
                    .or(nonzero(chart.market_cap))
                    .unwrap_or(0.0),
            )
            .with_volume(chart.regular_market_volume.unwrap_or(0.0).max(0.0) as u64)
            .with_price_to_earnings(
                nonzero(raw(&detail.trailing_pe)).or(nonzero(raw(&stats.trailing_pe))),
            )
            .with_dividend_yield(nonzero(raw(&detail.dividend_yield)).map(|value| value * 100.0))
            .with_float_percent(float_percent)
            .with_fifty_two_week_range(fifty_two_week_low, fifty_two_week_high)
            .with_all_time_high(fifty_two_week_high, as_of.date_string()),
        Err(error) => {
            warn!(symbol = %symbol, %error, "discarding invalid Yahoo record");
            return None;
        }
    };
    if let Some(price_to_book) = reported_price_to_book {
        security.price_to_book = price_to_book;
    }

    match security.validate() {
        Ok(()) => Some(security),
        Err(error) => {
            warn!(symbol = %symbol, %error, "discarding invalid Yahoo record");
            None
        }
    }
}

fn nonzero(value: Option<f64>) -> Option<f64> {
    value.filter(|value| value.is_finite() && *value != 0.0)
}

fn raw(value: &Option<RawValue>) -> Option<f64> {
    value.as_ref().and_then(|value| value.raw)
}

// Yahoo Finance response structures

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    regular_market_price: Option<f64>,
    #[serde(default)]
    previous_close: Option<f64>,
    #[serde(default)]
    long_name: Option<String>,
    #[serde(default)]
    market_cap: Option<f64>,
    #[serde(default)]
    regular_market_volume: Option<f64>,
    #[serde(default)]
    fifty_two_week_high: Option<f64>,
    #[serde(default)]
    fifty_two_week_low: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryBody,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    #[serde(default)]
    result: Option<Vec<SummaryResult>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResult {
    #[serde(default)]
    price: Option<PriceModule>,
    #[serde(default)]
    summary_detail: Option<SummaryDetail>,
    #[serde(default)]
    default_key_statistics: Option<KeyStatistics>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    #[serde(default)]
    long_name: Option<String>,
    #[serde(default)]
    market_cap: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    #[serde(rename = "trailingPE", default)]
    trailing_pe: Option<RawValue>,
    #[serde(default)]
    dividend_yield: Option<RawValue>,
    #[serde(default)]
    fifty_two_week_high: Option<RawValue>,
    #[serde(default)]
    fifty_two_week_low: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatistics {
    #[serde(default)]
    book_value: Option<RawValue>,
    #[serde(default)]
    price_to_book: Option<RawValue>,
    #[serde(rename = "trailingPE", default)]
    trailing_pe: Option<RawValue>,
    #[serde(default)]
    float_shares: Option<RawValue>,
    #[serde(default)]
    shares_outstanding: Option<RawValue>,
}

/// Yahoo wraps numbers as `{ "raw": 1.5, "fmt": "1.50" }`; missing values are `{}`.
#[derive(Debug, Default, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}
