mod yahoo;

pub use yahoo::{sector_for, YahooSource, SECTOR_MAPPING, UNMAPPED_SECTOR};
