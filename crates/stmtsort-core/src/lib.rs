//! Core library for bank statement sorting.
//!
//! This crate provides:
//! - PDF text extraction with a per-file timeout
//! - Date-range parsers for AIB debit, AIB credit and Revolut EUR statements
//! - Byte-identical duplicate detection
//! - Renaming into `<parser>_from_<MMMYYYY>_to_<MMMYYYY>.pdf`
//! - Directory analysis with coverage gaps and statement breaks

pub mod analysis;
pub mod dedup;
pub mod error;
pub mod models;
pub mod parser;
pub mod pdf;
pub mod rename;

pub use analysis::{AnalysisReport, Analyzer, DiscoverOptions, FileOutcome, FileReport, Summary};
pub use dedup::{CanonicalRule, ContentDigest, DuplicateDetector, DuplicateReport};
pub use error::{PdfError, RenameError, Result, StmtError};
pub use models::{DateRange, ParseResult, StatementFile, StmtConfig, YearMonth};
pub use parser::{ParseOutcome, ParseSettings, ParserRegistry, StatementParser};
pub use pdf::{PdfExtractor, StatementText, TextSource};
pub use rename::{RenameOptions, RenamePlanner, RenameReport, RenameTarget, rename_all};
