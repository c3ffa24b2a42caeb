//! Invoice record produced by the field extractor.

use serde::{Deserialize, Serialize};

/// Fields extracted from the first page of one invoice.
///
/// Every field is independently optional. `amount` stays `None` when nothing
/// parsed; the zero sentinel only appears at export time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceFields {
    /// Invoice number, 8 to 20 ASCII digits.
    pub invoice_number: Option<String>,

    /// Seller name, a run of Han characters.
    pub seller_name: Option<String>,

    /// Total amount in figures.
    pub amount: Option<f64>,
}

impl InvoiceFields {
    /// Amount with the zero sentinel applied.
    ///
    /// `0.0` is ambiguous between "not found" and "genuinely zero".
    pub fn amount_or_zero(&self) -> f64 {
        self.amount.unwrap_or(0.0)
    }

    /// True when no field was found.
    pub fn is_empty(&self) -> bool {
        self.invoice_number.is_none() && self.seller_name.is_none() && self.amount.is_none()
    }
}

/// One extraction result bound to its source file.
///
/// Immutable once built; corrections and annotations belong to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    filename: String,
    #[serde(flatten)]
    fields: InvoiceFields,
}

impl InvoiceRecord {
    /// Bind extracted fields to a filename supplied by the caller.
    pub fn new(filename: impl Into<String>, fields: InvoiceFields) -> Self {
        Self {
            filename: filename.into(),
            fields,
        }
    }

    /// Record for a file that could not be read at all.
    pub fn unreadable(filename: impl Into<String>) -> Self {
        Self::new(filename, InvoiceFields::default())
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn fields(&self) -> &InvoiceFields {
        &self.fields
    }

    pub fn invoice_number(&self) -> Option<&str> {
        self.fields.invoice_number.as_deref()
    }

    pub fn seller_name(&self) -> Option<&str> {
        self.fields.seller_name.as_deref()
    }

    pub fn amount(&self) -> Option<f64> {
        self.fields.amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_amount_sentinel() {
        let fields = InvoiceFields::default();
        assert!(fields.is_empty());
        assert_eq!(fields.amount_or_zero(), 0.0);

        let fields = InvoiceFields {
            amount: Some(12.5),
            ..Default::default()
        };
        assert!(!fields.is_empty());
        assert_eq!(fields.amount_or_zero(), 12.5);
    }

    #[test]
    fn test_record_json_is_flat() {
        let record = InvoiceRecord::new(
            "a.pdf",
            InvoiceFields {
                invoice_number: Some("12345678".to_string()),
                seller_name: None,
                amount: Some(1.5),
            },
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "filename": "a.pdf",
                "invoice_number": "12345678",
                "seller_name": null,
                "amount": 1.5
            })
        );

        let back: InvoiceRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_unreadable_keeps_filename() {
        let record = InvoiceRecord::unreadable("broken.pdf");
        assert_eq!(record.filename(), "broken.pdf");
        assert!(record.fields().is_empty());
    }
}
