//! Seller name (销售方名称) extraction.
//!
//! A standard invoice prints the `名称` label twice: buyer first, seller
//! second. The default strategy relies on that order; it misreads layouts
//! that print the parties the other way round or omit the buyer block.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::patterns::{PARTY_NAME, SELLER_SECTION};
use super::{ExtractionMatch, FieldExtractor};

/// How to pick the seller among the `名称` matches on a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SellerStrategy {
    /// Second match if there are two or more, otherwise the only one.
    #[default]
    Ordinal,
    /// First match after a `销售方` header, falling back to `Ordinal`.
    LabeledRegion,
}

/// Seller name field extractor.
pub struct SellerExtractor {
    strategy: SellerStrategy,
}

impl SellerExtractor {
    /// Create a new seller extractor using the ordinal strategy.
    pub fn new() -> Self {
        Self {
            strategy: SellerStrategy::Ordinal,
        }
    }

    /// Set the disambiguation strategy.
    pub fn with_strategy(mut self, strategy: SellerStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    fn pick_ordinal(matches: Vec<ExtractionMatch<String>>) -> Option<ExtractionMatch<String>> {
        let mut iter = matches.into_iter();
        let first = iter.next()?;
        Some(iter.next().unwrap_or(first))
    }

    fn pick_in_region(
        text: &str,
        matches: Vec<ExtractionMatch<String>>,
    ) -> Option<ExtractionMatch<String>> {
        let Some(header) = SELLER_SECTION.find(text) else {
            trace!("No seller section header, using ordinal selection");
            return Self::pick_ordinal(matches);
        };

        let in_region = matches
            .iter()
            .position(|m| m.position.is_some_and(|(start, _)| start >= header.end()));

        match in_region {
            Some(idx) => matches.into_iter().nth(idx),
            None => {
                trace!("No name after seller header at {}, using ordinal selection", header.start());
                Self::pick_ordinal(matches)
            }
        }
    }
}

impl Default for SellerExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for SellerExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let matches = self.extract_all(text);
        match self.strategy {
            SellerStrategy::Ordinal => Self::pick_ordinal(matches),
            SellerStrategy::LabeledRegion => Self::pick_in_region(text, matches),
        }
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        PARTY_NAME
            .captures_iter(text)
            .filter_map(|caps| {
                let name = caps.get(1)?;
                let full_match = caps.get(0)?;
                Some(
                    ExtractionMatch::new(name.as_str().to_string(), full_match.as_str())
                        .with_position(full_match.start(), full_match.end()),
                )
            })
            .collect()
    }
}

/// Extract the seller name using the ordinal strategy.
pub fn extract_seller_name(text: &str) -> Option<String> {
    SellerExtractor::new().extract(text).map(|m| m.value)
}
