//! Data loaders.

pub mod csv;

pub use self::csv::{CsvConfig, CsvLoader};
