//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};

use crate::invoice::rules::SellerStrategy;

/// Main configuration for fapiao.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FapiaoConfig {
    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Invoice extraction configuration.
    pub extraction: ExtractionConfig,

    /// Batch processing configuration.
    pub batch: BatchConfig,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Try to open encrypted PDFs with an empty password.
    pub decrypt_empty_password: bool,

    /// Page text shorter than this (after trimming) counts as no text.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            decrypt_empty_password: true,
            min_text_length: 1,
        }
    }
}

/// Invoice extraction configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// How to choose the seller among several `名称` matches.
    pub seller_strategy: SellerStrategy,
}

/// Batch processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of parallel workers.
    pub jobs: usize,

    /// Keep going when a file cannot be read.
    pub continue_on_error: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            jobs: 4,
            continue_on_error: true,
        }
    }
}

impl FapiaoConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
