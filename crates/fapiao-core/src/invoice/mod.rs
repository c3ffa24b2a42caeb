//! Invoice field extraction module.

mod parser;
pub mod rules;

pub use parser::{ExtractionResult, Field, InvoiceParser, RuleInvoiceParser};

use crate::models::record::InvoiceFields;

/// Extract invoice number, seller name and amount from first-page text.
///
/// Uses the default rules (ordinal seller selection). Never fails.
pub fn extract(text: Option<&str>) -> InvoiceFields {
    RuleInvoiceParser::new().extract(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_end_to_end_two_names() {
        let text = "名称: 北京某某科技有限公司\n...\n名称: 上海某贸易有限公司\n\
                    发票号码: 20231001000123456789\n价税合计 小写¥1234.56";
        assert_eq!(
            extract(Some(text)),
            InvoiceFields {
                invoice_number: Some("20231001000123456789".to_string()),
                seller_name: Some("上海某贸易有限公司".to_string()),
                amount: Some(1234.56),
            }
        );
    }

    #[test]
    fn test_end_to_end_one_name_no_amount() {
        let fields = extract(Some("名称：广州某餐饮管理有限公司\n合计金额 58.00"));
        assert_eq!(fields.invoice_number, None);
        assert_eq!(fields.seller_name.as_deref(), Some("广州某餐饮管理有限公司"));
        assert_eq!(fields.amount_or_zero(), 0.0);
    }

    #[test]
    fn test_end_to_end_no_text() {
        assert_eq!(extract(None), InvoiceFields::default());
        assert_eq!(extract(Some("")), InvoiceFields::default());
    }
}
