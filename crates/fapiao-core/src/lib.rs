//! Core library for Chinese VAT e-invoice processing.
//!
//! This crate provides:
//! - First-page text from PDF invoices (via lopdf and pdf-extract)
//! - Field extraction: invoice number (发票号码), seller name (名称), amount (小写)
//! - An invoice ledger keyed by filename, with annotations and export rows

pub mod error;
pub mod invoice;
pub mod models;
pub mod pdf;
pub mod table;

pub use error::{FapiaoError, PdfError, Result, TableError};
pub use invoice::{extract, ExtractionResult, Field, InvoiceParser, RuleInvoiceParser};
pub use invoice::rules::SellerStrategy;
pub use models::config::FapiaoConfig;
pub use models::record::{InvoiceFields, InvoiceRecord};
pub use pdf::{read_first_page, PdfExtractor, PdfProcessor};
pub use table::{ExportRow, InvoiceRow, InvoiceTable, SyncPlan};
