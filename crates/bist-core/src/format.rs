//! Turkish-locale display formatting and price classifications.
//!
//! Numbers use `.` as the thousands separator and `,` as the decimal mark.
//! Absent optional values render as [`PLACEHOLDER`], never as zero.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::UtcDateTime;

/// Rendered in place of absent or non-finite values.
pub const PLACEHOLDER: &str = "-";

/// Threshold of `price / all_time_high` at which a price counts as near its peak.
pub const NEAR_ATH_RATIO: f64 = 0.95;

/// `₺1.234,56`; negative values render as `-₺1.234,56`.
pub fn format_currency(value: f64) -> String {
    match split_cents(value) {
        Some((negative, digits)) => format!("{}₺{digits}", if negative { "-" } else { "" }),
        None => PLACEHOLDER.to_owned(),
    }
}

/// `1.234,56`.
pub fn format_number(value: f64) -> String {
    match split_cents(value) {
        Some((negative, digits)) => format!("{}{digits}", if negative { "-" } else { "" }),
        None => PLACEHOLDER.to_owned(),
    }
}

/// Compact magnitude: `1.2T`, `3.4B`, `5.6M`, `7.8K`, else the plain value.
pub fn format_large_number(value: f64) -> String {
    const SCALES: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

    for (scale, suffix) in SCALES {
        if value >= scale {
            return format!("{:.1}{suffix}", value / scale);
        }
    }
    format!("{value}")
}

/// Signed percentage with two decimals: `+1.25%`, `-0.50%`.
pub fn format_percentage(value: f64) -> String {
    let sign = if value >= 0.0 { "+" } else { "" };
    format!("{sign}{value:.2}%")
}

/// `DD.MM.YYYY` for an ISO date or RFC 3339 date-time; other input is returned unchanged.
pub fn format_date(input: &str) -> String {
    match parse_calendar_date(input) {
        Some(date) => format!(
            "{:02}.{:02}.{:04}",
            date.day(),
            u8::from(date.month()),
            date.year()
        ),
        None => input.to_owned(),
    }
}

/// `DD.MM.YYYY HH:MM:SS` in UTC.
pub fn format_date_time(value: UtcDateTime) -> String {
    let inner = value.into_inner();
    format!(
        "{:02}.{:02}.{:04} {:02}:{:02}:{:02}",
        inner.day(),
        u8::from(inner.month()),
        inner.year(),
        inner.hour(),
        inner.minute(),
        inner.second()
    )
}

/// Applies `render` to present values and the placeholder otherwise.
pub fn format_optional(value: Option<f64>, render: impl FnOnce(f64) -> String) -> String {
    value.map_or_else(|| PLACEHOLDER.to_owned(), render)
}

pub fn is_near_ath(current_price: f64, all_time_high: f64) -> bool {
    current_price / all_time_high >= NEAR_ATH_RATIO
}

pub fn is_below_book_value(current_price: f64, book_value: f64) -> bool {
    current_price < book_value
}

fn parse_calendar_date(input: &str) -> Option<Date> {
    let trimmed = input.trim();
    if let Ok(value) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Some(value.date());
    }
    let date_part = trimmed.get(..10)?;
    Date::parse(date_part, format_description!("[year]-[month]-[day]")).ok()
}

/// Sign flag and grouped `#.###,##` digits of `value` rounded to cents.
fn split_cents(value: f64) -> Option<(bool, String)> {
    if !value.is_finite() {
        return None;
    }

    let cents = (value.abs() * 100.0).round() as u128;
    let whole = cents / 100;
    let fraction = cents % 100;
    let negative = value < 0.0 && cents > 0;

    Some((negative, format!("{},{fraction:02}", group_thousands(whole))))
}

fn group_thousands(value: u128) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_uses_turkish_grouping() {
        assert_eq!(format_currency(1234.56), "₺1.234,56");
        assert_eq!(format_currency(0.0), "₺0,00");
        assert_eq!(format_currency(-1234567.891), "-₺1.234.567,89");
        assert_eq!(format_currency(f64::NAN), PLACEHOLDER);
    }

    #[test]
    fn number_rounds_to_two_decimals() {
        assert_eq!(format_number(999.999), "1.000,00");
        assert_eq!(format_number(12.3), "12,30");
        assert_eq!(format_number(-0.001), "0,00");
    }

    #[test]
    fn large_numbers_get_suffixes() {
        assert_eq!(format_large_number(1.23e12), "1.2T");
        assert_eq!(format_large_number(3.44e9), "3.4B");
        assert_eq!(format_large_number(5_600_000.0), "5.6M");
        assert_eq!(format_large_number(7_800.0), "7.8K");
        assert_eq!(format_large_number(999.0), "999");
        assert_eq!(format_large_number(12.5), "12.5");
    }

    #[test]
    fn percentage_is_signed() {
        assert_eq!(format_percentage(1.25), "+1.25%");
        assert_eq!(format_percentage(0.0), "+0.00%");
        assert_eq!(format_percentage(-0.5), "-0.50%");
    }

    #[test]
    fn dates_render_day_first() {
        assert_eq!(format_date("2024-03-07"), "07.03.2024");
        assert_eq!(format_date("2024-03-07T10:15:00Z"), "07.03.2024");
        assert_eq!(format_date("2024-03-07T10:15:00.123Z"), "07.03.2024");
        assert_eq!(format_date("yesterday"), "yesterday");

        let ts = UtcDateTime::parse("2024-03-07T09:05:03Z").expect("timestamp");
        assert_eq!(format_date_time(ts), "07.03.2024 09:05:03");
    }

    #[test]
    fn optional_values_use_placeholder() {
        assert_eq!(format_optional(None, format_number), "-");
        assert_eq!(format_optional(Some(8.5), |v| format!("{v:.1}%")), "8.5%");
    }

    #[test]
    fn near_ath_boundary_is_inclusive() {
        assert!(is_near_ath(95.0, 100.0));
        assert!(!is_near_ath(94.99, 100.0));
        assert!(is_near_ath(100.0, 100.0));
    }

    #[test]
    fn below_book_excludes_equal() {
        assert!(is_below_book_value(9.99, 10.0));
        assert!(!is_below_book_value(10.0, 10.0));
    }
}
