//! Rule-based invoice parser combining the three field passes.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::record::InvoiceFields;

use super::rules::{
    AmountExtractor, FieldExtractor, InvoiceNumberExtractor, SellerExtractor, SellerStrategy,
};

/// One of the extracted fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    InvoiceNumber,
    SellerName,
    Amount,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::InvoiceNumber => "invoice number",
            Field::SellerName => "seller name",
            Field::Amount => "amount",
        };
        f.write_str(name)
    }
}

/// Result of invoice extraction.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Extracted fields.
    pub fields: InvoiceFields,
    /// Fields that were not found, in extraction order.
    pub missing: Vec<Field>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Trait for invoice parsing.
///
/// Parsing never fails: absent or malformed text yields absent fields.
pub trait InvoiceParser {
    /// Parse first-page text into a report.
    fn parse(&self, text: Option<&str>) -> ExtractionResult;

    /// Parse first-page text and keep only the fields.
    fn extract(&self, text: Option<&str>) -> InvoiceFields {
        self.parse(text).fields
    }
}

/// Invoice parser built from the regex field rules.
///
/// Holds no mutable state and can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct RuleInvoiceParser {
    /// Seller disambiguation strategy.
    seller_strategy: SellerStrategy,
}

impl RuleInvoiceParser {
    /// Create a new parser with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the seller disambiguation strategy.
    pub fn with_seller_strategy(mut self, strategy: SellerStrategy) -> Self {
        self.seller_strategy = strategy;
        self
    }

    fn extract_fields(&self, text: &str) -> InvoiceFields {
        let invoice_number = InvoiceNumberExtractor::new().extract(text).map(|m| m.value);
        let seller_name = SellerExtractor::new()
            .with_strategy(self.seller_strategy)
            .extract(text)
            .map(|m| m.value);
        let amount = AmountExtractor::new().extract(text).map(|m| m.value);

        InvoiceFields {
            invoice_number,
            seller_name,
            amount,
        }
    }
}

impl InvoiceParser for RuleInvoiceParser {
    fn parse(&self, text: Option<&str>) -> ExtractionResult {
        let start = Instant::now();

        let fields = match text {
            Some(text) if !text.trim().is_empty() => self.extract_fields(text),
            _ => {
                debug!("No page text, returning empty fields");
                InvoiceFields::default()
            }
        };

        let mut missing = Vec::new();
        if fields.invoice_number.is_none() {
            missing.push(Field::InvoiceNumber);
        }
        if fields.seller_name.is_none() {
            missing.push(Field::SellerName);
        }
        if fields.amount.is_none() {
            missing.push(Field::Amount);
        }

        debug!(
            "Extracted invoice {:?} from {:?}, {} field(s) missing",
            fields.invoice_number,
            fields.seller_name,
            missing.len()
        );

        ExtractionResult {
            fields,
            missing,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const STANDARD_INVOICE: &str = r#"
        电子发票（普通发票）
        发票号码: 20231001000123456789
        开票日期: 2023年10月01日
        购买方信息  名称: 北京某某科技有限公司
                    统一社会信用代码/纳税人识别号: 91110000000000000X
        销售方信息  名称: 上海某贸易有限公司
                    统一社会信用代码/纳税人识别号: 91310000000000000Y
        项目名称        规格型号  单位  数量  单价  金额  税率/征收率  税额
        *信息技术服务*软件服务                      1092.53   13%   142.03
        价税合计（大写） 壹仟贰佰叁拾肆圆伍角陆分     （小写）¥1234.56
        开票人: 张三
    "#;

    #[test]
    fn test_parse_standard_invoice() {
        let result = RuleInvoiceParser::new().parse(Some(STANDARD_INVOICE));

        assert_eq!(
            result.fields,
            InvoiceFields {
                invoice_number: Some("20231001000123456789".to_string()),
                seller_name: Some("上海某贸易有限公司".to_string()),
                amount: Some(1234.56),
            }
        );
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_single_name_without_amount() {
        let text = "发票号码：12345678\n名称：深圳某电子有限公司\n合计 100.00";
        let result = RuleInvoiceParser::new().parse(Some(text));

        assert_eq!(result.fields.invoice_number.as_deref(), Some("12345678"));
        assert_eq!(result.fields.seller_name.as_deref(), Some("深圳某电子有限公司"));
        assert_eq!(result.fields.amount, None);
        assert_eq!(result.fields.amount_or_zero(), 0.0);
        assert_eq!(result.missing, vec![Field::Amount]);
    }

    #[test]
    fn test_absent_and_empty_text() {
        let parser = RuleInvoiceParser::new();
        for text in [None, Some(""), Some("  \n\u{3000}")] {
            let result = parser.parse(text);
            assert!(result.fields.is_empty());
            assert_eq!(
                result.missing,
                vec![Field::InvoiceNumber, Field::SellerName, Field::Amount]
            );
        }
    }

    #[test]
    fn test_unrelated_text() {
        let fields = RuleInvoiceParser::new().extract(Some("Invoice No. 12345678\nTotal: $10.00"));
        assert!(fields.is_empty());
        assert_eq!(fields.amount_or_zero(), 0.0);
    }

    #[test]
    fn test_fields_are_independent() {
        let text = "发票号码:123\n名称:某公司\n小写¥12.00";
        let fields = RuleInvoiceParser::new().extract(Some(text));
        assert_eq!(fields.invoice_number, None);
        assert_eq!(fields.seller_name.as_deref(), Some("某公司"));
        assert_eq!(fields.amount, Some(12.0));
    }

    #[test]
    fn test_labeled_region_strategy() {
        let text = "销售方 名称:卖方公司\n购买方 名称:买方公司\n小写¥1.00";
        let fields = RuleInvoiceParser::new()
            .with_seller_strategy(SellerStrategy::LabeledRegion)
            .extract(Some(text));
        assert_eq!(fields.seller_name.as_deref(), Some("卖方公司"));
    }

    #[test]
    fn test_parser_is_shareable_across_threads() {
        let parser = std::sync::Arc::new(RuleInvoiceParser::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let parser = parser.clone();
                std::thread::spawn(move || {
                    let text = format!("发票号码:1000000{}\n小写¥{}.50", i, i);
                    parser.extract(Some(&text))
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let fields = handle.join().unwrap();
            assert_eq!(fields.invoice_number, Some(format!("1000000{}", i)));
            assert_eq!(fields.amount, Some(i as f64 + 0.5));
        }
    }

    #[test]
    fn test_field_display() {
        assert_eq!(Field::SellerName.to_string(), "seller name");
    }
}
