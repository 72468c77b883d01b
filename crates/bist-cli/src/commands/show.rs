use bist_core::format::{
    format_currency, format_date, format_date_time, format_large_number, format_number,
    format_optional, format_percentage, is_below_book_value, is_near_ath,
};
use bist_core::{Security, Symbol, UtcDateTime};
use serde::Serialize;
use serde_json::json;

use crate::cli::ShowArgs;
use crate::error::CliError;
use crate::output::Table;

use super::{load, CommandResult, Context};

#[derive(Debug, Serialize)]
struct Badges {
    below_book_value: bool,
    near_all_time_high: bool,
}

#[derive(Debug, Serialize)]
struct DetailResponseData<'a> {
    security: &'a Security,
    badges: Badges,
    display: Vec<(&'static str, String)>,
}

pub async fn run(args: &ShowArgs, context: &Context) -> Result<CommandResult, CliError> {
    let symbol = Symbol::parse_listing(&args.symbol)?;

    let loaded = match load(context).await {
        Ok(loaded) => loaded,
        Err(error) => return Ok(CommandResult::failed(&error, json!({ "security": null }))),
    };

    let security = loaded
        .stocks
        .iter()
        .find(|security| security.symbol == symbol)
        .ok_or_else(|| CliError::Command(format!("symbol '{symbol}' is not listed")))?;

    let display = detail_fields(security);
    let mut table = Table::new(["Alan", "Değer"]);
    for (label, value) in &display {
        table.push_row(vec![(*label).to_owned(), value.clone()]);
    }

    let data = serde_json::to_value(DetailResponseData {
        security,
        badges: Badges {
            below_book_value: is_below_book_value(security.current_price, security.book_value),
            near_all_time_high: is_near_ath(security.current_price, security.all_time_high),
        },
        display,
    })?;

    Ok(CommandResult::ok(data)
        .with_table(table)
        .with_warnings(loaded.warnings)
        .served_from(loaded.from))
}

/// Labelled display values in detail-panel order.
fn detail_fields(security: &Security) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("Sembol", security.symbol.to_string()),
        ("Hisse Adı", security.name.clone()),
        ("Mevcut Fiyat", format_currency(security.current_price)),
        (
            "Günlük Değişim",
            format!(
                "{} ({})",
                format_percentage(security.daily_change_percent),
                format_currency(security.daily_change)
            ),
        ),
    ];

    if is_below_book_value(security.current_price, security.book_value) {
        fields.push(("Uyarı", String::from("Defter Değeri Altında")));
    }
    if is_near_ath(security.current_price, security.all_time_high) {
        fields.push(("Rozet", String::from("ATH'a Yakın")));
    }

    fields.extend([
        ("Piyasa Değeri", format_large_number(security.market_cap)),
        ("Hacim", format_large_number(security.volume as f64)),
        ("Sektör", security.sector.clone()),
        ("F/DD", format_number(security.price_to_book)),
        ("F/K", format_optional(security.price_to_earnings, format_number)),
        ("Defter Değeri", format_currency(security.book_value)),
        (
            "Temettü Verimi",
            format_optional(security.dividend_yield, format_percentage),
        ),
        (
            "Tüm Zamanların En Yükseği",
            format!(
                "{} ({})",
                format_currency(security.all_time_high),
                format_date(&security.all_time_high_date)
            ),
        ),
        ("52 Hafta En Yüksek", format_currency(security.fifty_two_week_high)),
        ("52 Hafta En Düşük", format_currency(security.fifty_two_week_low)),
        (
            "Dolaşımdaki Pay",
            format_optional(security.float_percent, format_percentage),
        ),
        ("Son Güncelleme", last_update(&security.last_update)),
    ]);
    fields
}

fn last_update(raw: &str) -> String {
    match UtcDateTime::parse(raw) {
        Ok(timestamp) => format_date_time(timestamp),
        Err(_) => format_date(raw),
    }
}
