//! Invoice number (发票号码) extraction.

use super::patterns::INVOICE_NUMBER;
use super::{ExtractionMatch, FieldExtractor};

/// Invoice number field extractor.
pub struct InvoiceNumberExtractor;

impl InvoiceNumberExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for InvoiceNumberExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for InvoiceNumberExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut matches = Vec::new();
        let mut start = 0;

        // The pattern consumes the character after the digits, which may open
        // the next label; resume each search right after the digit run.
        while let Some(caps) = INVOICE_NUMBER.captures_at(text, start) {
            let (Some(whole), Some(digits)) = (caps.get(0), caps.get(1)) else {
                break;
            };
            let label_start = whole.start();
            matches.push(
                ExtractionMatch::new(digits.as_str().to_string(), &text[label_start..digits.end()])
                    .with_position(label_start, digits.end()),
            );
            start = digits.end();
        }

        matches
    }
}

/// Extract the invoice number from page text.
pub fn extract_invoice_number(text: &str) -> Option<String> {
    InvoiceNumberExtractor::new().extract(text).map(|m| m.value)
}
