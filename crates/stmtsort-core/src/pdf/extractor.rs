//! PDF text extraction using lopdf and pdf-extract.

use std::fs;
use std::path::Path;

use lopdf::Document;
use tracing::{debug, trace};

use super::{Result, StatementText, TextSource};
use crate::error::PdfError;

/// PDF text extractor using lopdf, with pdf-extract as a fallback for
/// documents whose per-page text lopdf cannot decode.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
        }
    }

    /// Load a PDF from bytes.
    pub fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    /// Get the number of pages in the loaded PDF.
    pub fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    /// Extract text page by page.
    pub fn extract_pages(&self) -> Result<StatementText> {
        let doc = self
            .document
            .as_ref()
            .ok_or(PdfError::Parse("No document loaded".to_string()))?;

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        let mut pages = Vec::with_capacity(page_numbers.len());

        for number in page_numbers {
            let text = doc.extract_text(&[number]).unwrap_or_else(|e| {
                trace!("lopdf could not extract page {}: {}", number, e);
                String::new()
            });
            pages.push(text);
        }

        let text = StatementText::from_pages(pages);
        if !text.is_blank() {
            return Ok(text);
        }

        debug!("lopdf returned no text, falling back to pdf-extract");
        let full = pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;
        let text = StatementText::from_text(full);

        if text.is_blank() {
            return Err(PdfError::TextExtraction("no text layer found".to_string()));
        }
        Ok(text)
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSource for PdfExtractor {
    fn extract(&self, path: &Path) -> Result<StatementText> {
        let data = fs::read(path)?;
        let mut extractor = PdfExtractor::new();
        extractor.load(&data)?;
        extractor.extract_pages()
    }
}
