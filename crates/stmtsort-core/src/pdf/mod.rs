//! PDF text module.
//!
//! Text extraction is a capability behind the [`TextSource`] trait. The
//! extracted text is an owned, finite list of pages that parsers can walk as
//! many times as they need.

mod extractor;

pub use extractor::PdfExtractor;

use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Something that can turn a statement file into page text.
pub trait TextSource: Send + Sync {
    /// Extract the text of every page of the file at `path`.
    fn extract(&self, path: &Path) -> Result<StatementText>;
}

/// Text of a single page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfPage {
    /// Page number (1-indexed).
    pub number: u32,
    /// Extracted text from this page.
    pub text: String,
}

impl PdfPage {
    pub fn lines(&self) -> std::str::Lines<'_> {
        self.text.lines()
    }

    /// Index of the first line that reads as a table header with the given
    /// columns, in order. Other words (currency symbols etc.) may sit between
    /// the column names.
    pub fn column_header_line(&self, columns: &[&str]) -> Option<usize> {
        self.lines().position(|line| {
            let mut wanted = columns.iter().peekable();
            for word in line.split_whitespace() {
                if let Some(col) = wanted.peek() {
                    if word.eq_ignore_ascii_case(col) {
                        wanted.next();
                    }
                }
            }
            wanted.peek().is_none()
        })
    }

    /// Lines below the table header, or all lines when the header is absent.
    pub fn body_lines(&self, columns: &[&str]) -> Vec<&str> {
        let skip = self.column_header_line(columns).map(|i| i + 1).unwrap_or(0);
        self.lines().skip(skip).collect()
    }
}

/// Text of a whole statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementText {
    pages: Vec<PdfPage>,
}

impl StatementText {
    /// Build from page texts in order.
    pub fn from_pages<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pages = pages
            .into_iter()
            .enumerate()
            .map(|(i, text)| PdfPage {
                number: i as u32 + 1,
                text: text.into(),
            })
            .collect();
        Self { pages }
    }

    /// Single-page statement.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::from_pages([text])
    }

    pub fn pages(&self) -> &[PdfPage] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Text of the first page that carries any text. Format checks look here.
    pub fn first_page_text(&self) -> &str {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .find(|t| !t.trim().is_empty())
            .unwrap_or("")
    }

    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|p| p.text.trim().is_empty())
    }

    /// Drop pages whose trimmed text is shorter than `min_len`.
    pub fn without_short_pages(mut self, min_len: usize) -> Self {
        if min_len > 0 {
            self.pages.retain(|p| p.text.trim().len() >= min_len);
        }
        self
    }
}

/// Run `source` on a worker thread and give up after `timeout`.
///
/// A hung extraction thread is detached, not killed; its result is dropped
/// when it eventually finishes.
pub fn extract_with_timeout(
    source: Arc<dyn TextSource>,
    path: &Path,
    timeout: Duration,
) -> Result<StatementText> {
    let (tx, rx) = mpsc::channel();
    let owned = path.to_path_buf();

    thread::Builder::new()
        .name("pdf-extract".to_string())
        .spawn(move || {
            let _ = tx.send(source.extract(&owned));
        })?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            warn!("Text extraction timed out for {}", path.display());
            Err(PdfError::Timeout(timeout))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            debug!("Extraction thread for {} ended without a result", path.display());
            Err(PdfError::TextExtraction(
                "extraction thread terminated unexpectedly".to_string(),
            ))
        }
    }
}
