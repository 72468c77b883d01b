use bist_core::QueryOptions;
use serde_json::json;

use crate::error::CliError;

use super::{into_loaded, CommandResult, Context};

pub async fn run(context: &Context) -> Result<CommandResult, CliError> {
    let client = context.query_client(QueryOptions::default());
    let state = client.refresh().await;
    let next_update = client.service().next_update_time().await;

    match into_loaded(state) {
        Ok(loaded) => {
            let data = json!({
                "count": loaded.stocks.len(),
                "served_from": loaded.from,
                "next_update": next_update,
            });
            Ok(CommandResult::ok(data)
                .with_warnings(loaded.warnings)
                .served_from(loaded.from))
        }
        Err(error) => Ok(CommandResult::failed(
            &error,
            json!({ "count": 0, "served_from": null, "next_update": null }),
        )),
    }
}
