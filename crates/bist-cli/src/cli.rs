//! CLI argument definitions for `bist`.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `list` | Filtered, sorted security table |
//! | `show` | Detail view for one symbol |
//! | `export` | Write the filtered list as CSV |
//! | `refresh` | Force a full resolution |
//! | `status` | Snapshot freshness and next update time |
//! | `sectors` | Sector filter options |
//! | `theme` | Read, set or toggle the theme preference |
//! | `watch` | Poll on the refetch interval |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--data-url` | `BIST_DATA_URL` or `data.json` | Primary document URL or path |
//! | `--home` | `BIST_HOME` or `~/.bist` | Durable storage directory |
//! | `--source` | `BIST_SOURCE` or `document` | Primary source |
//! | `--timeout-ms` | `10000` | Request timeout in ms |
//! | `--no-synthetic` | `false` | Fail instead of serving synthetic data |
//!
//! # Examples
//!
//! ```bash
//! bist list --sector Bankacılık --sort pb --format table
//! bist list --below-book --min-dividend 3 --pretty
//! bist show THYAO --format table
//! bist export --search holding --output holdings.csv
//! bist theme toggle
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Borsa İstanbul dashboard
///
/// Lists BIST securities from a JSON document (or Yahoo Finance), falling
/// back to the last stored snapshot and finally to synthetic data.
#[derive(Debug, Parser)]
#[command(
    name = "bist",
    author,
    version,
    about = "Borsa İstanbul securities dashboard",
    long_about = "bist lists Borsa İstanbul securities with filtering, sorting and CSV export.\n\
\n\
Data is resolved in order from the in-process cache, the primary source, the \
durable snapshot and finally synthetic data.\n\
\n\
Use 'bist <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// URL or file path of the `{ "stocks": [...] }` document.
    #[arg(long, global = true)]
    pub data_url: Option<String>,

    /// Directory for the durable snapshot and theme preference.
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,

    /// Primary data source.
    #[arg(long, global = true, value_enum)]
    pub source: Option<SourceSelector>,

    /// Request timeout budget in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Report an error instead of generating synthetic data.
    #[arg(long, global = true, default_value_t = false)]
    pub no_synthetic: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table.
    Table,
    /// Single JSON envelope.
    Json,
}

/// Primary source selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceSelector {
    /// JSON document at `--data-url`.
    Document,
    /// Yahoo Finance chart and quoteSummary endpoints.
    Yahoo,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List securities matching the filters.
    ///
    /// # Examples
    ///
    ///   bist list --format table
    ///   bist list --sector Holding --sort market-cap --desc --limit 10
    List(ListArgs),

    /// Show the detail view of one security.
    Show(ShowArgs),

    /// Export the filtered list to CSV.
    ///
    /// Writes `bist100-<YYYY-MM-DD>.csv` unless `--output` is given.
    Export(ExportArgs),

    /// Drop the cache and resolve again.
    Refresh,

    /// Durable snapshot freshness and next update time.
    Status,

    /// List the sector filter options.
    Sectors,

    /// Read or change the theme preference.
    Theme(ThemeArgs),

    /// Poll on the refetch interval and print a summary per cycle.
    Watch(WatchArgs),
}

/// Filter flags shared by `list` and `export`.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Case-insensitive match on symbol or name.
    #[arg(long)]
    pub search: Option<String>,

    /// Exact sector; `Tümü` or empty means all sectors.
    #[arg(long)]
    pub sector: Option<String>,

    /// Upper bound on price-to-book.
    #[arg(long)]
    pub max_pb: Option<f64>,

    /// Lower bound on dividend yield (%).
    #[arg(long)]
    pub min_dividend: Option<f64>,

    /// Only securities trading below book value.
    #[arg(long, default_value_t = false)]
    pub below_book: bool,
}

/// Arguments for the `list` command.
#[derive(Debug, Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Sort column (symbol, name, sector, price, change, market-cap, pb,
    /// book-value, pe, volume, dividend).
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort descending.
    #[arg(long, default_value_t = false, requires = "sort")]
    pub desc: bool,

    /// Maximum number of rows to return.
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Arguments for the `show` command.
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Ticker, with or without the `.IS` suffix.
    pub symbol: String,
}

/// Arguments for the `export` command.
#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Output file path.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `theme` command group.
#[derive(Debug, Args)]
pub struct ThemeArgs {
    #[command(subcommand)]
    pub command: Option<ThemeCommand>,
}

/// Theme subcommands; `get` when omitted.
#[derive(Debug, Clone, Subcommand)]
pub enum ThemeCommand {
    /// Print the effective theme.
    Get,
    /// Persist a theme.
    Set(ThemeSetArgs),
    /// Flip between light and dark.
    Toggle,
}

#[derive(Debug, Clone, Args)]
pub struct ThemeSetArgs {
    /// `light` or `dark`.
    pub theme: String,
}

/// Arguments for the `watch` command.
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between refetches.
    #[arg(long, default_value_t = 900)]
    pub interval_secs: u64,

    /// Stop after this many cycles; runs until interrupted when omitted.
    #[arg(long)]
    pub cycles: Option<usize>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_list_filters() {
        let cli = Cli::try_parse_from([
            "bist",
            "list",
            "--sector",
            "Bankacılık",
            "--max-pb",
            "1.5",
            "--below-book",
            "--sort",
            "pb",
            "--desc",
            "--format",
            "table",
        ])
        .expect("parse");

        assert_eq!(cli.format, OutputFormat::Table);
        let Command::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.filter.sector.as_deref(), Some("Bankacılık"));
        assert_eq!(args.filter.max_pb, Some(1.5));
        assert!(args.filter.below_book);
        assert!(args.desc);
    }

    #[test]
    fn theme_subcommand_is_optional() {
        let cli = Cli::try_parse_from(["bist", "theme"]).expect("parse");
        let Command::Theme(args) = cli.command else {
            panic!("expected theme");
        };
        assert!(args.command.is_none());
    }

    #[test]
    fn desc_requires_sort() {
        assert!(Cli::try_parse_from(["bist", "list", "--desc"]).is_err());
    }
}
