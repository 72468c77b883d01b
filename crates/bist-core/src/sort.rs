//! Single-column table sorting.

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Security, ValidationError};

/// Sortable table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    Symbol,
    Name,
    Sector,
    CurrentPrice,
    DailyChangePercent,
    MarketCap,
    PriceToBook,
    BookValue,
    PriceToEarnings,
    Volume,
    DividendYield,
}

impl SortColumn {
    pub const ALL: [Self; 11] = [
        Self::Symbol,
        Self::Name,
        Self::Sector,
        Self::CurrentPrice,
        Self::DailyChangePercent,
        Self::MarketCap,
        Self::PriceToBook,
        Self::BookValue,
        Self::PriceToEarnings,
        Self::Volume,
        Self::DividendYield,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Symbol => "symbol",
            Self::Name => "name",
            Self::Sector => "sector",
            Self::CurrentPrice => "price",
            Self::DailyChangePercent => "change",
            Self::MarketCap => "market_cap",
            Self::PriceToBook => "pb",
            Self::BookValue => "book_value",
            Self::PriceToEarnings => "pe",
            Self::Volume => "volume",
            Self::DividendYield => "dividend",
        }
    }

    fn compare(self, left: &Security, right: &Security) -> Ordering {
        match self {
            Self::Symbol => left.symbol.cmp(&right.symbol),
            Self::Name => left.name.cmp(&right.name),
            Self::Sector => left.sector.cmp(&right.sector),
            Self::CurrentPrice => left.current_price.total_cmp(&right.current_price),
            Self::DailyChangePercent => left
                .daily_change_percent
                .total_cmp(&right.daily_change_percent),
            Self::MarketCap => left.market_cap.total_cmp(&right.market_cap),
            Self::PriceToBook => left.price_to_book.total_cmp(&right.price_to_book),
            Self::BookValue => left.book_value.total_cmp(&right.book_value),
            Self::Volume => left.volume.cmp(&right.volume),
            Self::PriceToEarnings | Self::DividendYield => Ordering::Equal,
        }
    }

    fn optional_value(self, security: &Security) -> Option<Option<f64>> {
        match self {
            Self::PriceToEarnings => Some(security.price_to_earnings),
            Self::DividendYield => Some(security.dividend_yield),
            _ => None,
        }
    }
}

impl Display for SortColumn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortColumn {
    type Err = ValidationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized = input.trim().to_ascii_lowercase().replace('-', "_");
        let column = match normalized.as_str() {
            "symbol" => Self::Symbol,
            "name" => Self::Name,
            "sector" => Self::Sector,
            "price" | "current_price" => Self::CurrentPrice,
            "change" | "daily_change_percent" => Self::DailyChangePercent,
            "market_cap" | "marketcap" => Self::MarketCap,
            "pb" | "price_to_book" => Self::PriceToBook,
            "book_value" | "book" => Self::BookValue,
            "pe" | "price_to_earnings" => Self::PriceToEarnings,
            "volume" => Self::Volume,
            "dividend" | "dividend_yield" => Self::DividendYield,
            _ => {
                return Err(ValidationError::InvalidSortColumn {
                    value: input.to_owned(),
                })
            }
        };
        Ok(column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// At most one active `(column, direction)` pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    active: Option<(SortColumn, SortDirection)>,
}

impl SortState {
    pub const fn none() -> Self {
        Self { active: None }
    }

    pub const fn by(column: SortColumn, direction: SortDirection) -> Self {
        Self {
            active: Some((column, direction)),
        }
    }

    pub const fn active(&self) -> Option<(SortColumn, SortDirection)> {
        self.active
    }

    /// Header click: none → ascending → descending → none on the same column;
    /// another column starts at ascending.
    pub fn toggle(&mut self, column: SortColumn) {
        self.active = match self.active {
            Some((current, SortDirection::Ascending)) if current == column => {
                Some((column, SortDirection::Descending))
            }
            Some((current, SortDirection::Descending)) if current == column => None,
            _ => Some((column, SortDirection::Ascending)),
        };
    }

    /// Stable sort in place; absent optional values go last in either direction.
    pub fn apply(&self, securities: &mut [Security]) {
        let Some((column, direction)) = self.active else {
            return;
        };

        securities.sort_by(|left, right| {
            if let (Some(left_value), Some(right_value)) =
                (column.optional_value(left), column.optional_value(right))
            {
                return match (left_value, right_value) {
                    (Some(l), Some(r)) => directed(l.total_cmp(&r), direction),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
            }
            directed(column.compare(left, right), direction)
        });
    }

    pub fn sorted(&self, securities: &[Security]) -> Vec<Security> {
        let mut sorted = securities.to_vec();
        self.apply(&mut sorted);
        sorted
    }
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}
