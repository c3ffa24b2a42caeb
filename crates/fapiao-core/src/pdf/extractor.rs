//! PDF loading with lopdf and text extraction with pdf-extract.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use lopdf::Document;
use tracing::{debug, trace, warn};

use super::{PdfProcessor, Result};
use crate::error::PdfError;
use crate::models::config::PdfConfig;

/// PDF text extractor using lopdf and pdf-extract.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
    decrypt_empty_password: bool,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
            decrypt_empty_password: true,
        }
    }

    /// Set whether encrypted PDFs are retried with an empty password.
    pub fn with_empty_password_decryption(mut self, enabled: bool) -> Self {
        self.decrypt_empty_password = enabled;
        self
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            if !self.decrypt_empty_password || doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract needs the decrypted bytes
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

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_pages(&self) -> Result<Vec<String>> {
        if self.document.is_none() {
            return Err(PdfError::Parse("No document loaded".to_string()));
        }

        let pages = decode_pages(&self.raw_data)?;
        trace!("Extracted text from {} pages", pages.len());
        Ok(pages)
    }

    /// Decode a single page by saving a copy of the document without the
    /// other pages, so broken later pages never reach the decoder.
    fn extract_page_text(&self, page: u32) -> Result<String> {
        let doc = self
            .document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("No document loaded".to_string()))?;

        let count = self.page_count();
        if page == 0 || page > count {
            return Err(PdfError::InvalidPage(page));
        }

        let mut single = doc.clone();
        let others: Vec<u32> = (1..=count).filter(|&p| p != page).collect();
        if !others.is_empty() {
            single.delete_pages(&others);
        }

        let mut data = Vec::new();
        single
            .save_to(&mut data)
            .map_err(|e| PdfError::Parse(format!("Failed to isolate page {}: {}", page, e)))?;

        let text = decode_pages(&data)?
            .into_iter()
            .next()
            .ok_or(PdfError::InvalidPage(page))?;
        trace!("Extracted {} chars from page {}", text.len(), page);
        Ok(text)
    }
}

/// Run pdf-extract over raw bytes.
///
/// pdf-extract panics on some malformed font and encoding dictionaries that
/// lopdf loads fine; such panics come back as `TextExtraction` errors.
fn decode_pages(data: &[u8]) -> Result<Vec<String>> {
    guard_decoder(|| {
        pdf_extract::extract_text_from_mem_by_pages(data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    })
}

fn guard_decoder<T>(decode: impl FnOnce() -> Result<T>) -> Result<T> {
    panic::catch_unwind(AssertUnwindSafe(decode)).unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        warn!("PDF text decoder panicked: {}", reason);
        Err(PdfError::TextExtraction(format!("decoder panicked: {}", reason)))
    })
}

/// Read the first-page text of a PDF file.
///
/// Returns `Ok(None)` when the page text is shorter than
/// `config.min_text_length` after trimming.
pub fn read_first_page(path: &Path, config: &PdfConfig) -> crate::Result<Option<String>> {
    let data = std::fs::read(path)?;
    let mut extractor =
        PdfExtractor::new().with_empty_password_decryption(config.decrypt_empty_password);
    extractor.load(&data)?;

    let text = extractor.first_page_text()?;
    Ok(text.filter(|t| t.trim().chars().count() >= config.min_text_length))
}
