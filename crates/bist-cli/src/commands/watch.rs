use std::io::Write;
use std::ops::ControlFlow;
use std::time::Duration;

use bist_core::format::format_date_time;
use bist_core::{QueryOptions, QueryState, QuerySummary};
use serde_json::json;
use tracing::{info, warn};

use crate::cli::{OutputFormat, WatchArgs};
use crate::error::CliError;

use super::{CommandResult, Context};

pub async fn run(args: &WatchArgs, context: &Context, pretty: bool) -> Result<CommandResult, CliError> {
    let options = QueryOptions {
        refetch_interval: Duration::from_secs(args.interval_secs.max(1)),
        ..QueryOptions::default()
    };
    let client = context.query_client(options);
    let format = context.format;
    let mut cycles = 0_usize;

    let on_state = |state: &QueryState| {
        cycles += 1;
        let summary = state.summary();
        if let Err(error) = print_cycle(&mut std::io::stdout().lock(), &summary, format, pretty) {
            warn!(%error, "failed to print watch cycle");
        }
        match args.cycles {
            Some(limit) if cycles >= limit => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    };

    let last = tokio::select! {
        state = client.watch(on_state) => state,
        _ = tokio::signal::ctrl_c() => {
            info!("watch interrupted");
            client.state().await
        }
    };

    let summary = last.summary();
    let mut result = CommandResult::ok(json!({ "last": summary }));
    if let QueryState::Error { error } = &last {
        result = result.with_errors(vec![error.source_error().into()]);
    }
    if let Some(from) = summary.from {
        result = result.served_from(from);
    }
    Ok(result)
}

fn print_cycle<W: Write>(
    out: &mut W,
    summary: &QuerySummary,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json if pretty => writeln!(out, "{}", serde_json::to_string_pretty(summary)?)?,
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(summary)?)?,
        OutputFormat::Table => writeln!(out, "{}", cycle_line(summary))?,
    }
    Ok(())
}

fn cycle_line(summary: &QuerySummary) -> String {
    let updated = summary
        .updated_at
        .map_or_else(|| String::from("-"), format_date_time);
    let from = summary.from.map_or("-", |from| from.as_str());
    let mut line = format!(
        "{updated}  {:<7}  {:>4} hisse  kaynak={from}",
        summary.status, summary.count
    );
    if summary.is_stale {
        line.push_str("  (eski)");
    }
    if let Some(error) = &summary.error {
        line.push_str(&format!("  hata: {error}"));
    }
    line
}
