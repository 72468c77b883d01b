use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{Symbol, UtcDateTime, ValidationError};

/// One listed equity as served to the dashboard.
///
/// Field names on the wire follow the camelCase document format of `data.json`.
/// Optional ratios are `None` when the upstream has no value and must be shown
/// as a placeholder rather than zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Security {
    pub id: String,
    pub symbol: Symbol,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub current_price: f64,
    pub daily_change: f64,
    pub daily_change_percent: f64,
    pub market_cap: f64,
    pub book_value: f64,
    pub price_to_book: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_to_earnings: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub float_percent: Option<f64>,
    /// Whole shares; documents may encode it as a float.
    #[serde(deserialize_with = "volume_from_number")]
    pub volume: u64,
    pub all_time_high: f64,
    /// ISO calendar date (`YYYY-MM-DD`).
    pub all_time_high_date: String,
    pub fifty_two_week_high: f64,
    pub fifty_two_week_low: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dividend_yield: Option<f64>,
    pub sector: String,
    /// ISO date-time of the last price update.
    pub last_update: String,
}

impl Security {
    /// Minimal record with price-to-book derived from `current_price / book_value`.
    ///
    /// Remaining numeric fields start at zero; use the `with_*` setters to fill them.
    pub fn new(
        symbol: Symbol,
        name: impl Into<String>,
        sector: impl Into<String>,
        current_price: f64,
        book_value: f64,
        as_of: UtcDateTime,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("current_price", current_price)?;
        validate_non_negative("book_value", book_value)?;

        let price_to_book = if book_value > 0.0 {
            current_price / book_value
        } else {
            0.0
        };

        Ok(Self {
            id: symbol.as_str().to_owned(),
            symbol,
            name: name.into(),
            logo: None,
            current_price,
            daily_change: 0.0,
            daily_change_percent: 0.0,
            market_cap: 0.0,
            book_value,
            price_to_book,
            price_to_earnings: None,
            float_percent: None,
            volume: 0,
            all_time_high: current_price,
            all_time_high_date: as_of.date_string(),
            fifty_two_week_high: current_price,
            fifty_two_week_low: current_price,
            dividend_yield: None,
            sector: sector.into(),
            last_update: as_of.format_rfc3339(),
        })
    }

    pub fn with_daily_change(mut self, change: f64, change_percent: f64) -> Self {
        self.daily_change = change;
        self.daily_change_percent = change_percent;
        self
    }

    pub fn with_market_cap(mut self, market_cap: f64) -> Self {
        self.market_cap = market_cap;
        self
    }

    pub fn with_volume(mut self, volume: u64) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_price_to_earnings(mut self, value: Option<f64>) -> Self {
        self.price_to_earnings = value;
        self
    }

    pub fn with_dividend_yield(mut self, value: Option<f64>) -> Self {
        self.dividend_yield = value;
        self
    }

    pub fn with_float_percent(mut self, value: Option<f64>) -> Self {
        self.float_percent = value;
        self
    }

    pub fn with_all_time_high(mut self, price: f64, date: impl Into<String>) -> Self {
        self.all_time_high = price;
        self.all_time_high_date = date.into();
        self
    }

    pub fn with_fifty_two_week_range(mut self, low: f64, high: f64) -> Self {
        self.fifty_two_week_low = low;
        self.fifty_two_week_high = high;
        self
    }

    /// Checks numeric fields for NaN/infinite or negative values where those are meaningless.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_non_negative("currentPrice", self.current_price)?;
        validate_finite("dailyChange", self.daily_change)?;
        validate_finite("dailyChangePercent", self.daily_change_percent)?;
        validate_non_negative("marketCap", self.market_cap)?;
        validate_non_negative("bookValue", self.book_value)?;
        validate_finite("priceToBook", self.price_to_book)?;
        validate_optional_finite("priceToEarnings", self.price_to_earnings)?;
        validate_optional_non_negative("floatPercent", self.float_percent)?;
        validate_non_negative("allTimeHigh", self.all_time_high)?;
        validate_non_negative("fiftyTwoWeekHigh", self.fifty_two_week_high)?;
        validate_non_negative("fiftyTwoWeekLow", self.fifty_two_week_low)?;
        validate_optional_non_negative("dividendYield", self.dividend_yield)?;
        Ok(())
    }
}

/// Top-level shape of the primary JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityFeed {
    pub stocks: Vec<Security>,
}

/// Accept any finite non-negative JSON number and drop the fraction.
fn volume_from_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() || raw < 0.0 {
        return Err(D::Error::custom(format!(
            "volume must be a finite non-negative number, got {raw}"
        )));
    }
    Ok(raw.trunc() as u64)
}

fn validate_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    Ok(())
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    validate_finite(field, value)?;
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

fn validate_optional_non_negative(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    if let Some(value) = value {
        validate_non_negative(field, value)?;
    }
    Ok(())
}

fn validate_optional_finite(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    if let Some(value) = value {
        validate_finite(field, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_of() -> UtcDateTime {
        UtcDateTime::parse("2024-03-01T10:00:00Z").expect("timestamp")
    }

    #[test]
    fn derives_price_to_book_from_book_value() {
        let symbol = Symbol::parse("AKBNK").expect("symbol");
        let security =
            Security::new(symbol, "Akbank", "Bankacılık", 50.0, 62.5, as_of()).expect("valid");

        assert_eq!(security.id, "AKBNK");
        assert!((security.price_to_book - 0.8).abs() < 1e-9);
        assert_eq!(security.all_time_high_date, "2024-03-01");
    }

    #[test]
    fn rejects_negative_price() {
        let symbol = Symbol::parse("AKBNK").expect("symbol");
        let err = Security::new(symbol, "Akbank", "Bankacılık", -1.0, 10.0, as_of())
            .expect_err("must fail");
        assert!(matches!(err, ValidationError::NegativeValue { .. }));
    }

    #[test]
    fn absent_optionals_are_omitted_and_null_is_accepted() {
        let symbol = Symbol::parse("GARAN").expect("symbol");
        let security =
            Security::new(symbol, "Garanti", "Bankacılık", 100.0, 80.0, as_of()).expect("valid");

        let value = serde_json::to_value(&security).expect("serialize");
        assert!(value.get("priceToEarnings").is_none());
        assert!(value.get("dividendYield").is_none());
        assert_eq!(value["currentPrice"], 100.0);

        let mut with_null = value.clone();
        with_null["dividendYield"] = serde_json::Value::Null;
        let parsed: Security = serde_json::from_value(with_null).expect("null optional parses");
        assert_eq!(parsed.dividend_yield, None);
    }

    #[test]
    fn volume_accepts_float_encoding() {
        let symbol = Symbol::parse("AKBNK").expect("symbol");
        let security =
            Security::new(symbol, "Akbank", "Bankacılık", 50.0, 60.0, as_of()).expect("valid");
        let mut value = serde_json::to_value(&security).expect("serialize");

        value["volume"] = serde_json::json!(1_250_000.75);
        let parsed: Security = serde_json::from_value(value.clone()).expect("float volume");
        assert_eq!(parsed.volume, 1_250_000);

        value["volume"] = serde_json::json!(-5.0);
        serde_json::from_value::<Security>(value).expect_err("negative volume");
    }
}
