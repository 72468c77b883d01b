//! Filter criteria over the security list.

use serde::{Deserialize, Serialize};

use crate::format::is_below_book_value;
use crate::Security;

/// User-selected constraints; every constraint must hold for a record to be kept.
///
/// Unset optionals and an empty search string are vacuously true.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(default)]
    pub search: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_to_book_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dividend_yield_min: Option<f64>,
    #[serde(default)]
    pub below_book_value: bool,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Empty input clears the constraint.
    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        let sector = sector.into();
        self.sector = (!sector.trim().is_empty()).then_some(sector);
        self
    }

    pub fn with_price_to_book_max(mut self, max: f64) -> Self {
        self.price_to_book_max = Some(max);
        self
    }

    pub fn with_dividend_yield_min(mut self, min: f64) -> Self {
        self.dividend_yield_min = Some(min);
        self
    }

    pub fn with_below_book_value(mut self, enabled: bool) -> Self {
        self.below_book_value = enabled;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty()
            && self.active_sector().is_none()
            && self.price_to_book_max.is_none()
            && self.dividend_yield_min.is_none()
            && !self.below_book_value
    }

    pub fn matches(&self, security: &Security) -> bool {
        self.matches_search(security)
            && self.matches_sector(security)
            && self.matches_price_to_book(security)
            && self.matches_dividend(security)
            && (!self.below_book_value
                || is_below_book_value(security.current_price, security.book_value))
    }

    fn active_sector(&self) -> Option<&str> {
        self.sector
            .as_deref()
            .filter(|sector| !sector.trim().is_empty())
    }

    fn matches_search(&self, security: &Security) -> bool {
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        security.name.to_lowercase().contains(&needle)
            || security.symbol.as_str().to_lowercase().contains(&needle)
    }

    fn matches_sector(&self, security: &Security) -> bool {
        self.active_sector()
            .map_or(true, |sector| security.sector == sector)
    }

    fn matches_price_to_book(&self, security: &Security) -> bool {
        self.price_to_book_max
            .map_or(true, |max| security.price_to_book <= max)
    }

    fn matches_dividend(&self, security: &Security) -> bool {
        self.dividend_yield_min.map_or(true, |min| {
            security
                .dividend_yield
                .is_some_and(|dividend| dividend >= min)
        })
    }
}

/// Records satisfying every constraint, in input order.
pub fn apply_filters(securities: &[Security], criteria: &FilterCriteria) -> Vec<Security> {
    securities
        .iter()
        .filter(|security| criteria.matches(security))
        .cloned()
        .collect()
}

/// Distinct sectors in first-seen order.
pub fn sectors_of(securities: &[Security]) -> Vec<String> {
    let mut sectors: Vec<String> = Vec::new();
    for security in securities {
        if !sectors.iter().any(|known| *known == security.sector) {
            sectors.push(security.sector.clone());
        }
    }
    sectors
}
