//! Export the filtered security list to CSV.

use std::path::PathBuf;

use bist_core::{apply_filters, export_file_name, write_csv, UtcDateTime};
use serde_json::json;
use tracing::info;

use crate::cli::ExportArgs;
use crate::error::CliError;

use super::{criteria_from, load, CommandResult, Context};

pub async fn run(args: &ExportArgs, context: &Context) -> Result<CommandResult, CliError> {
    let criteria = criteria_from(&args.filter);

    let loaded = match load(context).await {
        Ok(loaded) => loaded,
        Err(error) => {
            return Ok(CommandResult::failed(
                &error,
                json!({ "path": null, "rows": 0 }),
            ))
        }
    };

    let rows = apply_filters(&loaded.stocks, &criteria);
    let path = output_path(args.output.clone(), UtcDateTime::now());

    let write_path = path.clone();
    let write_rows = rows.clone();
    tokio::task::spawn_blocking(move || write_csv(&write_path, &write_rows))
        .await
        .map_err(|error| CliError::Command(format!("export task failed: {error}")))??;
    info!(path = %path.display(), rows = rows.len(), "exported securities");

    let data = json!({
        "path": path.display().to_string(),
        "rows": rows.len(),
        "filters": criteria,
    });

    Ok(CommandResult::ok(data)
        .with_warnings(loaded.warnings)
        .served_from(loaded.from))
}

fn output_path(requested: Option<PathBuf>, today: UtcDateTime) -> PathBuf {
    requested.unwrap_or_else(|| PathBuf::from(export_file_name(today)))
}
