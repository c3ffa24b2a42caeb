//! Error types for the fapiao-core library.

use thiserror::Error;

/// Main error type for the fapiao library.
#[derive(Error, Debug)]
pub enum FapiaoError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Invoice ledger error.
    #[error("table error: {0}")]
    Table(#[from] TableError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
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

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors raised by the invoice ledger.
#[derive(Error, Debug)]
pub enum TableError {
    /// No row exists for the given filename.
    #[error("no invoice row for file: {0}")]
    UnknownFile(String),

    /// The ledger file could not be decoded or encoded.
    #[error("ledger format error: {0}")]
    Format(#[from] serde_json::Error),
}

/// Result type for the fapiao library.
pub type Result<T> = std::result::Result<T, FapiaoError>;
