use bist_core::format::{
    format_currency, format_large_number, format_number, format_optional, format_percentage,
    is_below_book_value, is_near_ath,
};
use bist_core::{apply_filters, Security, SortColumn, SortDirection, SortState};
use serde_json::json;

use crate::cli::ListArgs;
use crate::error::CliError;
use crate::output::Table;

use super::{criteria_from, empty_list, load, CommandResult, Context};

const TABLE_HEADERS: [&str; 9] = [
    "Hisse",
    "Fiyat",
    "Değişim",
    "Piyasa Değeri",
    "F/DD",
    "Defter Değeri",
    "F/K",
    "Hacim",
    "Temettü",
];

pub async fn run(args: &ListArgs, context: &Context) -> Result<CommandResult, CliError> {
    let sort = sort_state(args)?;
    let criteria = criteria_from(&args.filter);

    let loaded = match load(context).await {
        Ok(loaded) => loaded,
        Err(error) => return Ok(CommandResult::failed(&error, empty_list())),
    };

    let total = loaded.stocks.len();
    let mut rows = apply_filters(&loaded.stocks, &criteria);
    let matched = rows.len();
    sort.apply(&mut rows);
    if let Some(limit) = args.limit {
        rows.truncate(limit);
    }

    let data = json!({
        "total": total,
        "matched": matched,
        "count": rows.len(),
        "filters": criteria,
        "stocks": rows,
    });

    Ok(CommandResult::ok(data)
        .with_table(table(&rows))
        .with_warnings(loaded.warnings)
        .served_from(loaded.from))
}

fn sort_state(args: &ListArgs) -> Result<SortState, CliError> {
    let Some(raw) = &args.sort else {
        return Ok(SortState::none());
    };
    let column: SortColumn = raw.parse()?;
    let direction = if args.desc {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    };
    Ok(SortState::by(column, direction))
}

pub(crate) fn table(rows: &[Security]) -> Table {
    let mut table = Table::new(TABLE_HEADERS);
    for security in rows {
        table.push_row(row(security));
    }
    table
}

fn row(security: &Security) -> Vec<String> {
    let mut price = format_currency(security.current_price);
    if is_below_book_value(security.current_price, security.book_value) {
        price.push_str(" ▼DD");
    }
    if is_near_ath(security.current_price, security.all_time_high) {
        price.push_str(" ★ATH");
    }

    vec![
        format!("{} {}", security.symbol, security.name),
        price,
        format!(
            "{} ({})",
            format_percentage(security.daily_change_percent),
            format_currency(security.daily_change)
        ),
        format_large_number(security.market_cap),
        format_number(security.price_to_book),
        format_currency(security.book_value),
        format_optional(security.price_to_earnings, format_number),
        format_large_number(security.volume as f64),
        format_optional(security.dividend_yield, format_percentage),
    ]
}

#[cfg(test)]
mod tests {
    use bist_core::{Symbol, UtcDateTime};

    use super::*;

    fn security() -> Security {
        let as_of = UtcDateTime::parse("2024-01-01T00:00:00Z").expect("timestamp");
        Security::new(
            Symbol::parse("AKBNK").expect("symbol"),
            "Akbank",
            "Bankacılık",
            50.0,
            62.5,
            as_of,
        )
        .expect("valid")
        .with_daily_change(1.0, 2.04)
        .with_market_cap(1_500_000_000.0)
        .with_volume(2_500_000)
        .with_all_time_high(51.0, "2023-12-01")
    }

    #[test]
    fn row_mirrors_dashboard_columns() {
        let cells = row(&security());

        assert_eq!(cells[0], "AKBNK Akbank");
        assert_eq!(cells[1], "₺50,00 ▼DD ★ATH");
        assert_eq!(cells[2], "+2.04% (₺1,00)");
        assert_eq!(cells[3], "1.5B");
        assert_eq!(cells[4], "0,80");
        assert_eq!(cells[5], "₺62,50");
        assert_eq!(cells[6], "-");
        assert_eq!(cells[7], "2.5M");
        assert_eq!(cells[8], "-");
    }

    #[test]
    fn unknown_sort_column_is_validation_error() {
        let args = ListArgs {
            filter: Default::default(),
            sort: Some(String::from("colour")),
            desc: false,
            limit: None,
        };
        let err = sort_state(&args).expect_err("must fail");
        assert_eq!(err.exit_code(), 2);
    }
}
