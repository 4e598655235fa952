//! Statement parsers: one variant per bank/account format.
//!
//! Every variant follows the same two-phase contract: a cheap format check
//! on the statement text, then a full scan of transaction-row dates.

mod aib_credit;
mod aib_debit;
pub mod registry;
mod revolut_debit;
pub mod rules;

pub use aib_credit::AibCreditParser;
pub use aib_debit::AibDebitParser;
pub use registry::ParserRegistry;
pub use revolut_debit::RevolutDebitParser;

use std::path::Path;

use crate::models::config::ExtractionConfig;
use crate::models::statement::{DateRange, ParseResult, ScanStats};
use crate::pdf::StatementText;

/// Outcome of running one parser over one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// The structural check failed; another parser should be tried.
    NotThisFormat,
    /// Dates were extracted.
    Parsed { range: DateRange, stats: ScanStats },
    /// The format matched but the dates could not be extracted reliably.
    Unparseable { diagnostic: String, stats: ScanStats },
}

impl ParseOutcome {
    /// Attach file and parser identity. `NotThisFormat` yields `None`.
    pub fn into_result(self, path: &Path, parser: &str) -> Option<ParseResult> {
        let (range, diagnostic, stats) = match self {
            ParseOutcome::NotThisFormat => return None,
            ParseOutcome::Parsed { range, stats } => (Some(range), None, stats),
            ParseOutcome::Unparseable { diagnostic, stats } => (None, Some(diagnostic), stats),
        };
        Some(ParseResult {
            path: path.to_path_buf(),
            parser: parser.to_string(),
            range,
            diagnostic,
            stats,
        })
    }
}

/// Tunables for date extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParseSettings {
    /// Maximum share of skipped candidate tokens (0.0 - 1.0).
    pub max_skip_rate: f64,
}

impl Default for ParseSettings {
    fn default() -> Self {
        Self { max_skip_rate: 0.5 }
    }
}

impl From<&ExtractionConfig> for ParseSettings {
    /// Out-of-range rates are clamped into 0.0 - 1.0; `NaN` falls back to
    /// the default.
    fn from(config: &ExtractionConfig) -> Self {
        let rate = config.max_skip_rate;
        if rate.is_nan() {
            return Self::default();
        }
        Self {
            max_skip_rate: rate.clamp(0.0, 1.0),
        }
    }
}

/// Trait for statement parsers.
pub trait StatementParser: Send + Sync {
    /// Parser identity, used in output file names.
    fn name(&self) -> &'static str;

    /// Cheap structural check: is this statement in my format?
    fn matches(&self, text: &StatementText) -> bool;

    /// Extract the covered date range. Only called after `matches`.
    fn extract(&self, text: &StatementText, settings: &ParseSettings) -> ParseOutcome;

    /// Format check followed by extraction.
    fn parse(&self, text: &StatementText, settings: &ParseSettings) -> ParseOutcome {
        if !self.matches(text) {
            return ParseOutcome::NotThisFormat;
        }
        self.extract(text, settings)
    }
}
