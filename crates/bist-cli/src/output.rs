use std::io::Write;

use bist_core::Envelope;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Pre-rendered rows for `--format table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Left-aligned columns separated by two spaces, widths measured in chars.
    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (index, cell) in row.iter().enumerate() {
                let width = cell.chars().count();
                match widths.get_mut(index) {
                    Some(current) => *current = (*current).max(width),
                    None => widths.push(width),
                }
            }
        }

        let line = |cells: &[String]| {
            cells
                .iter()
                .enumerate()
                .map(|(index, cell)| {
                    let pad = widths[index].saturating_sub(cell.chars().count());
                    format!("{cell}{}", " ".repeat(pad))
                })
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_owned()
        };

        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(line(&self.headers));
        lines.push(
            widths
                .iter()
                .map(|width| "-".repeat(*width))
                .collect::<Vec<_>>()
                .join("  "),
        );
        lines.extend(self.rows.iter().map(|row| line(row)));
        lines.join("\n")
    }
}

pub fn render<W: Write>(
    out: &mut W,
    envelope: &Envelope<Value>,
    table: Option<&Table>,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(envelope)?
            } else {
                serde_json::to_string(envelope)?
            };
            writeln!(out, "{payload}")?;
        }
        OutputFormat::Table => render_table(out, envelope, table)?,
    }

    Ok(())
}

fn render_table<W: Write>(
    out: &mut W,
    envelope: &Envelope<Value>,
    table: Option<&Table>,
) -> Result<(), CliError> {
    writeln!(out, "request_id  : {}", envelope.meta.request_id)?;
    writeln!(out, "generated_at: {}", envelope.meta.generated_at)?;
    if let Some(served_from) = envelope.meta.served_from {
        writeln!(out, "served_from : {served_from}")?;
    }
    writeln!(out, "latency_ms  : {}", envelope.meta.latency_ms)?;

    if !envelope.meta.warnings.is_empty() {
        writeln!(out, "warnings:")?;
        for warning in &envelope.meta.warnings {
            writeln!(out, "  - {warning}")?;
        }
    }

    writeln!(out)?;
    match table {
        Some(table) => writeln!(out, "{}", table.render())?,
        None => {
            let pretty_data = serde_json::to_string_pretty(&envelope.data)?;
            for line in pretty_data.lines() {
                writeln!(out, "  {line}")?;
            }
        }
    }

    if !envelope.errors.is_empty() {
        writeln!(out, "errors:")?;
        for error in &envelope.errors {
            writeln!(out, "  - {}: {}", error.code, error.message)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use bist_core::{EnvelopeMeta, ResolvedFrom};
    use serde_json::json;

    use super::*;

    fn envelope() -> Envelope<Value> {
        let meta = EnvelopeMeta::new("request-12345", Some(ResolvedFrom::Remote), 7).expect("meta");
        Envelope::success(meta, json!({ "count": 1 }))
    }

    #[test]
    fn table_pads_by_character_count() {
        let mut table = Table::new(["Hisse", "Sektör"]);
        table.push_row(vec![String::from("AKBNK"), String::from("Bankacılık")]);
        table.push_row(vec![String::from("SISE"), String::from("Cam")]);

        let rendered = table.render();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "Hisse  Sektör");
        assert_eq!(lines[1], "-----  ----------");
        assert_eq!(lines[2], "AKBNK  Bankacılık");
        assert_eq!(lines[3], "SISE   Cam");
    }

    #[test]
    fn json_output_is_a_single_line() {
        let mut out = Vec::new();
        render(&mut out, &envelope(), None, OutputFormat::Json, false).expect("render");

        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text.lines().count(), 1);
        let value: Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value["meta"]["served_from"], "remote");
        assert_eq!(value["data"]["count"], 1);
    }

    #[test]
    fn table_output_prefers_rendered_rows() {
        let mut table = Table::new(["Hisse"]);
        table.push_row(vec![String::from("THYAO")]);

        let mut out = Vec::new();
        render(&mut out, &envelope(), Some(&table), OutputFormat::Table, false).expect("render");

        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("served_from : remote"));
        assert!(text.contains("THYAO"));
        assert!(!text.contains("\"count\""));
    }
}
