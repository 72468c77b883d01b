use bist_core::synthetic::{ALL_SECTORS_LABEL, SECTORS};
use serde_json::json;

use crate::output::Table;

use super::CommandResult;

/// Sector filter options: the "all" label followed by the fixed sector list.
pub fn run() -> CommandResult {
    let sectors: Vec<&str> = std::iter::once(ALL_SECTORS_LABEL)
        .chain(SECTORS.iter().copied())
        .collect();

    let mut table = Table::new(["Sektör"]);
    for sector in &sectors {
        table.push_row(vec![(*sector).to_owned()]);
    }

    CommandResult::ok(json!({ "count": sectors.len(), "sectors": sectors })).with_table(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_label_comes_first() {
        let result = run();

        assert_eq!(result.data["sectors"][0], ALL_SECTORS_LABEL);
        assert_eq!(result.data["count"], SECTORS.len() + 1);
        assert!(result.served_from.is_none());
    }
}
