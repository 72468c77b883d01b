//! CSV export of the filtered security list.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::{Security, UtcDateTime};

/// Fixed Turkish header row.
pub const CSV_HEADERS: [&str; 10] = [
    "Sembol",
    "Hisse Adı",
    "Mevcut Fiyat",
    "Günlük Değişim (%)",
    "Piyasa Değeri",
    "F/DD",
    "F/K",
    "Hacim",
    "Temettü (%)",
    "Sektör",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write export '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// `bist100-YYYY-MM-DD.csv` for the given day.
pub fn export_file_name(today: UtcDateTime) -> String {
    format!("bist100-{}.csv", today.date_string())
}

/// Full CSV document: header plus one row per record, rows joined by `\n`.
///
/// Every cell is quoted and embedded quotes are doubled; absent P/E and
/// dividend yield become empty cells.
pub fn to_csv(securities: &[Security]) -> String {
    let mut lines = Vec::with_capacity(securities.len() + 1);
    lines.push(join_row(CSV_HEADERS.iter().map(|header| (*header).to_owned())));
    lines.extend(securities.iter().map(|security| join_row(row_cells(security))));
    lines.join("\n")
}

/// Write the CSV document to `path`.
pub fn write_csv(path: &Path, securities: &[Security]) -> Result<(), ExportError> {
    let write_error = |source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(write_error)?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(to_csv(securities).as_bytes())
        .map_err(write_error)?;
    writer.flush().map_err(write_error)
}

fn row_cells(security: &Security) -> [String; 10] {
    [
        security.symbol.to_string(),
        security.name.clone(),
        plain_number(security.current_price),
        plain_number(security.daily_change_percent),
        plain_number(security.market_cap),
        plain_number(security.price_to_book),
        security.price_to_earnings.map(plain_number).unwrap_or_default(),
        security.volume.to_string(),
        security.dividend_yield.map(plain_number).unwrap_or_default(),
        security.sector.clone(),
    ]
}

fn plain_number(value: f64) -> String {
    format!("{value}")
}

fn join_row(cells: impl IntoIterator<Item = String>) -> String {
    cells
        .into_iter()
        .map(|cell| format!("\"{}\"", cell.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(",")
}
