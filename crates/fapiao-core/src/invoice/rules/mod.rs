//! Rule-based field extractors for Chinese VAT e-invoices.

pub mod amount;
pub mod normalize;
pub mod number;
pub mod patterns;
pub mod seller;

pub use amount::{extract_amount, parse_amount_snippet, AmountExtractor};
pub use normalize::normalize_snippet;
pub use number::{extract_invoice_number, InvoiceNumberExtractor};
pub use seller::{extract_seller_name, SellerExtractor, SellerStrategy};
pub use patterns::*;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A located field value.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Byte span in the source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, source: impl Into<String>) -> Self {
        Self {
            value,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}
