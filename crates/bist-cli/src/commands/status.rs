use bist_core::{CacheRecord, KeyValueStore, StoredSnapshot, UtcDateTime};
use serde::Serialize;
use tracing::warn;

use crate::error::CliError;
use crate::output::Table;

use super::{CommandResult, Context};

/// Freshness of the durable snapshot against the configured cache window.
#[derive(Debug, Serialize)]
struct StatusResponseData {
    data_url: String,
    home: String,
    window_secs: u64,
    snapshot_present: bool,
    snapshot_count: usize,
    last_fetch: Option<UtcDateTime>,
    valid: bool,
    next_update: Option<UtcDateTime>,
}

pub fn run(context: &Context) -> Result<CommandResult, CliError> {
    let store = context.store();
    let (snapshot, warnings) = read_snapshot(&store);
    let data = describe(context, snapshot, UtcDateTime::now());

    let mut table = Table::new(["Alan", "Değer"]);
    table.push_row(vec![String::from("data_url"), data.data_url.clone()]);
    table.push_row(vec![String::from("home"), data.home.clone()]);
    table.push_row(vec![
        String::from("snapshot"),
        format!("{} records", data.snapshot_count),
    ]);
    table.push_row(vec![String::from("valid"), data.valid.to_string()]);
    table.push_row(vec![
        String::from("next_update"),
        data.next_update
            .map_or_else(|| String::from("-"), |next| next.to_string()),
    ]);

    Ok(CommandResult::ok(serde_json::to_value(data)?)
        .with_table(table)
        .with_warnings(warnings))
}

/// An unreadable snapshot reports as absent with a warning.
fn read_snapshot(store: &dyn KeyValueStore) -> (Option<StoredSnapshot>, Vec<String>) {
    match StoredSnapshot::load(store) {
        Ok(snapshot) => (snapshot, Vec::new()),
        Err(error) => {
            warn!(%error, "stored snapshot unreadable");
            (None, vec![format!("snapshot unreadable: {error}")])
        }
    }
}

fn describe(
    context: &Context,
    snapshot: Option<StoredSnapshot>,
    now: UtcDateTime,
) -> StatusResponseData {
    let mut record = CacheRecord::new(context.config.cache_window);
    let snapshot_present = snapshot.is_some();
    let mut snapshot_count = 0;

    if let Some(snapshot) = snapshot {
        snapshot_count = snapshot.stocks.len();
        if let Some(fetched_at) = snapshot.fetched_at() {
            record.store(snapshot.stocks, fetched_at);
        }
    }

    StatusResponseData {
        data_url: context.config.data_url.clone(),
        home: context.config.home.display().to_string(),
        window_secs: record.window().as_secs(),
        snapshot_present,
        snapshot_count,
        last_fetch: record.last_fetch(),
        valid: record.is_valid(now),
        next_update: record.next_update_time(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use bist_core::storage::SNAPSHOT_KEY;
    use bist_core::{
        DashboardConfig, HttpResponse, MemoryStore, ScriptedHttpClient, Security, Symbol,
    };

    use super::*;
    use crate::cli::OutputFormat;

    fn context() -> Context {
        Context {
            config: DashboardConfig::default().with_home("/tmp/bist-status"),
            http: Arc::new(ScriptedHttpClient::always(Ok(HttpResponse::with_status(
                500, "",
            )))),
            format: OutputFormat::Json,
        }
    }

    fn t0() -> UtcDateTime {
        UtcDateTime::parse("2024-05-10T07:00:00Z").expect("timestamp")
    }

    #[test]
    fn missing_snapshot_is_never_valid() {
        let data = describe(&context(), None, t0());

        assert!(!data.snapshot_present);
        assert!(!data.valid);
        assert_eq!(data.next_update, None);
        assert_eq!(data.window_secs, 900);
    }

    #[test]
    fn snapshot_is_valid_inside_window() {
        let security = Security::new(
            Symbol::parse("AKBNK").expect("symbol"),
            "Akbank",
            "Bankacılık",
            10.0,
            12.0,
            t0(),
        )
        .expect("valid");
        let snapshot = || StoredSnapshot::new(vec![security.clone()], t0());

        let fresh = describe(&context(), Some(snapshot()), t0().plus(Duration::from_secs(60)));
        assert!(fresh.valid);
        assert_eq!(fresh.snapshot_count, 1);
        assert_eq!(fresh.next_update, Some(t0().plus(Duration::from_secs(900))));

        let expired = describe(&context(), Some(snapshot()), t0().plus(Duration::from_secs(900)));
        assert!(!expired.valid);
    }

    #[test]
    fn corrupt_snapshot_reports_absent_with_warning() {
        let store = MemoryStore::new();
        store.set(SNAPSHOT_KEY, "{ not json").expect("seed garbage");

        let (snapshot, warnings) = read_snapshot(&store);
        let data = describe(&context(), snapshot, t0());

        assert!(!data.snapshot_present);
        assert!(!data.valid);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("snapshot unreadable"));
    }

    #[tokio::test]
    async fn status_command_survives_corrupt_snapshot_file() {
        let home = tempfile::tempdir().expect("tempdir");
        std::fs::write(home.path().join("bist_stocks.json"), "{ not json").expect("seed");
        let cli = <crate::cli::Cli as clap::Parser>::try_parse_from([
            "bist",
            "--home",
            home.path().to_str().expect("utf8 path"),
            "status",
        ])
        .expect("parse");
        let context = Context {
            config: DashboardConfig::default().with_home(home.path()),
            ..context()
        };

        let output = super::super::run_with(&cli, &context).await.expect("status");

        assert!(output.envelope.errors.is_empty());
        assert_eq!(output.envelope.data["snapshot_present"], false);
        assert_eq!(output.envelope.meta.warnings.len(), 1);
    }
}
