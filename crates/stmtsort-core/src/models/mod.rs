//! Data models and configuration.

pub mod config;
pub mod statement;

pub use config::StmtConfig;
pub use statement::{DateRange, ParseResult, ScanStats, StatementFile, YearMonth};
