mod export;
mod list;
mod refresh;
mod sectors;
mod show;
mod status;
mod theme;
mod watch;

use std::sync::Arc;
use std::time::Instant;

use bist_core::synthetic::ALL_SECTORS_LABEL;
use bist_core::{
    DashboardConfig, Envelope, EnvelopeError, FileStore, FilterCriteria, HttpClient, PrimaryKind,
    QueryClient, QueryError, QueryOptions, QueryState, ReqwestHttpClient, ResolvedFrom, Security,
    SourceError,
};
use serde_json::{json, Value};

use crate::cli::{Cli, Command, FilterArgs, OutputFormat, SourceSelector};
use crate::error::CliError;
use crate::metadata::Metadata;
use crate::output::Table;

pub struct CommandResult {
    pub data: Value,
    pub table: Option<Table>,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub served_from: Option<ResolvedFrom>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            table: None,
            warnings: Vec::new(),
            errors: Vec::new(),
            served_from: None,
        }
    }

    pub fn with_table(mut self, table: Table) -> Self {
        self.table = Some(table);
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_errors(mut self, errors: Vec<EnvelopeError>) -> Self {
        self.errors.extend(errors);
        self
    }

    pub fn served_from(mut self, from: ResolvedFrom) -> Self {
        self.served_from = Some(from);
        self
    }

    /// Data-less result for a query that exhausted its retries.
    fn failed(error: &QueryError, data: Value) -> Self {
        Self::ok(data).with_errors(vec![EnvelopeError::from(error.source_error())])
    }
}

/// Envelope plus the optional table view of the same data.
pub struct CommandOutput {
    pub envelope: Envelope<Value>,
    pub table: Option<Table>,
}

/// Resolved configuration and transport shared by every command.
pub struct Context {
    pub config: DashboardConfig,
    pub http: Arc<dyn HttpClient>,
    pub format: OutputFormat,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let mut config = DashboardConfig::from_env()?;
        apply_overrides(&mut config, cli);

        Ok(Self {
            config,
            http: Arc::new(ReqwestHttpClient::default()),
            format: cli.format,
        })
    }

    pub fn store(&self) -> FileStore {
        self.config.open_store()
    }

    pub fn query_client(&self, options: QueryOptions) -> QueryClient {
        let service = self.config.build_service(Arc::clone(&self.http));
        QueryClient::new(Arc::new(service), options)
    }
}

pub fn apply_overrides(config: &mut DashboardConfig, cli: &Cli) {
    if let Some(data_url) = &cli.data_url {
        config.data_url = data_url.clone();
    }
    if let Some(home) = &cli.home {
        config.home = home.clone();
    }
    if let Some(source) = cli.source {
        config.primary = match source {
            SourceSelector::Document => PrimaryKind::Document,
            SourceSelector::Yahoo => PrimaryKind::Yahoo,
        };
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.request_timeout_ms = timeout_ms;
    }
    if cli.no_synthetic {
        config.synthetic_fallback = false;
    }
}

pub async fn run(cli: &Cli) -> Result<CommandOutput, CliError> {
    let context = Context::from_cli(cli)?;
    run_with(cli, &context).await
}

pub async fn run_with(cli: &Cli, context: &Context) -> Result<CommandOutput, CliError> {
    let started = Instant::now();

    let command_result = match &cli.command {
        Command::List(args) => list::run(args, context).await?,
        Command::Show(args) => show::run(args, context).await?,
        Command::Export(args) => export::run(args, context).await?,
        Command::Refresh => refresh::run(context).await?,
        Command::Status => status::run(context)?,
        Command::Sectors => sectors::run(),
        Command::Theme(args) => theme::run(args, context)?,
        Command::Watch(args) => watch::run(args, context, cli.pretty).await?,
    };

    let CommandResult {
        data,
        table,
        warnings,
        errors,
        served_from,
    } = command_result;

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let mut metadata = Metadata::new(served_from, latency_ms);
    for warning in warnings {
        metadata.push_warning(warning);
    }

    let meta = metadata.into_envelope_meta()?;
    let envelope = Envelope::with_errors(meta, data, errors)?;
    Ok(CommandOutput { envelope, table })
}

/// Records served by the query layer, or its terminal failure.
pub(crate) struct Loaded {
    pub stocks: Vec<Security>,
    pub from: ResolvedFrom,
    pub warnings: Vec<String>,
}

pub(crate) async fn load(context: &Context) -> Result<Loaded, QueryError> {
    let client = context.query_client(QueryOptions::default());
    into_loaded(client.mount().await)
}

pub(crate) fn into_loaded(state: QueryState) -> Result<Loaded, QueryError> {
    match state {
        QueryState::Success { data, from, .. } => Ok(Loaded {
            stocks: data,
            from,
            warnings: fallback_warning(from).into_iter().collect(),
        }),
        QueryState::Error { error } => Err(error),
        QueryState::Loading => Err(QueryError::Exhausted {
            attempts: 0,
            source: SourceError::internal("query finished without a result"),
        }),
    }
}

fn fallback_warning(from: ResolvedFrom) -> Option<String> {
    match from {
        ResolvedFrom::Snapshot => Some(String::from(
            "primary source unavailable, serving the last stored snapshot",
        )),
        ResolvedFrom::Synthetic => Some(String::from(
            "primary source and snapshot unavailable, serving synthetic data",
        )),
        ResolvedFrom::Cache | ResolvedFrom::Remote => None,
    }
}

pub(crate) fn criteria_from(args: &FilterArgs) -> FilterCriteria {
    let mut criteria = FilterCriteria::new().with_below_book_value(args.below_book);
    if let Some(search) = &args.search {
        criteria = criteria.with_search(search.clone());
    }
    if let Some(sector) = args
        .sector
        .as_deref()
        .filter(|sector| *sector != ALL_SECTORS_LABEL)
    {
        criteria = criteria.with_sector(sector);
    }
    if let Some(max) = args.max_pb {
        criteria = criteria.with_price_to_book_max(max);
    }
    if let Some(min) = args.min_dividend {
        criteria = criteria.with_dividend_yield_min(min);
    }
    criteria
}

pub(crate) fn empty_list() -> Value {
    json!({ "count": 0, "stocks": [] })
}
