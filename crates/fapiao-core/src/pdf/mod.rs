//! PDF text provider.
//!
//! Text-layer decoding is left to `pdf-extract`; this module only loads the
//! document, handles empty-password encryption and hands back page text.

mod extractor;

pub use extractor::{read_first_page, PdfExtractor};

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF text providers.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract text from every page, in page order.
    fn extract_pages(&self) -> Result<Vec<String>>;

    /// Extract text from a specific page (1-indexed).
    fn extract_page_text(&self, page: u32) -> Result<String> {
        let index = page.checked_sub(1).ok_or(PdfError::InvalidPage(page))? as usize;
        self.extract_pages()?
            .into_iter()
            .nth(index)
            .ok_or(PdfError::InvalidPage(page))
    }

    /// Text of the first page, or `None` when the page has no text layer.
    fn first_page_text(&self) -> Result<Option<String>> {
        let text = self.extract_page_text(1)?;
        Ok(if text.trim().is_empty() { None } else { Some(text) })
    }
}
