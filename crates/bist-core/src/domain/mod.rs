//! # Domain Models
//!
//! Canonical domain types for the BIST dashboard.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Security`] | One listed equity with price, ratios and ranges |
//! | [`SecurityFeed`] | Top-level `{ "stocks": [...] }` document |
//! | [`Symbol`] | Validated ticker symbol |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! Optional ratios (`priceToEarnings`, `dividendYield`, `floatPercent`) are
//! modelled as `Option<f64>` and decided once when a record is produced.

mod models;
mod symbol;
mod timestamp;

pub use models::{Security, SecurityFeed};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
