//! Error types for the stmtsort-core library.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for the stmtsort library.
///
/// Only run-level failures surface as `StmtError`. Per-file problems
/// (unparseable statements, unreadable PDFs) are recorded in the analysis
/// report instead of aborting the run.
#[derive(Error, Debug)]
pub enum StmtError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Output placement error.
    #[error("rename error: {0}")]
    Rename(#[from] RenameError),

    /// The input directory does not exist.
    #[error("input directory not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The input path exists but is not a directory.
    #[error("input path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF text extraction.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Extraction did not finish in time.
    #[error("text extraction timed out after {0:?}")]
    Timeout(Duration),

    /// The file could not be read.
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while placing renamed statements.
#[derive(Error, Debug)]
pub enum RenameError {
    /// The output directory could not be created or listed.
    #[error("output directory {} is not usable: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Copying a statement into the output directory failed.
    #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A different file already occupies the planned target.
    #[error("refusing to overwrite {} with different content", .0.display())]
    Conflict(PathBuf),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the stmtsort library.
pub type Result<T> = std::result::Result<T, StmtError>;
