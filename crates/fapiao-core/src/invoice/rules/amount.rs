//! Total amount (价税合计 小写) extraction.

use tracing::trace;

use super::normalize::normalize_snippet;
use super::patterns::{AMOUNT_IN_FIGURES, AMOUNT_PREFIX};
use super::{ExtractionMatch, FieldExtractor};

/// Amount-in-figures field extractor.
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = ExtractionMatch<f64>;

    /// Only the first `小写` line is considered; if it does not parse, there is no amount.
    fn extract(&self, text: &str) -> Option<Self::Output> {
        let m = AMOUNT_IN_FIGURES.find(text)?;
        let value = parse_amount_snippet(m.as_str())?;
        Some(ExtractionMatch::new(value, m.as_str()).with_position(m.start(), m.end()))
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        AMOUNT_IN_FIGURES
            .find_iter(text)
            .filter_map(|m| {
                let value = parse_amount_snippet(m.as_str())?;
                Some(ExtractionMatch::new(value, m.as_str()).with_position(m.start(), m.end()))
            })
            .collect()
    }
}

/// Parse a located `小写...` snippet into a number.
///
/// The snippet is normalized, closing parentheses are dropped (the label is
/// usually printed as `（小写）`), and the `小写¥` prefix is removed. Any other
/// currency glyph leaves the prefix in place and the parse fails.
pub fn parse_amount_snippet(snippet: &str) -> Option<f64> {
    let normalized = normalize_snippet(snippet).replace(')', "");
    let Some(figures) = normalized.strip_prefix(AMOUNT_PREFIX) else {
        trace!("Amount snippet {:?} lacks the {} prefix", normalized, AMOUNT_PREFIX);
        return None;
    };

    match figures.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            trace!("Amount snippet {:?} is not a number", figures);
            None
        }
    }
}

/// Extract the total amount from page text.
pub fn extract_amount(text: &str) -> Option<f64> {
    AmountExtractor::new().extract(text).map(|m| m.value)
}
