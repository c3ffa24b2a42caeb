//! Common regex patterns for Chinese VAT e-invoice extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // 发票号码: label characters may be split by arbitrary whitespace.
    // The trailing group keeps a 21+ digit run from yielding its first 20 digits.
    pub static ref INVOICE_NUMBER: Regex = Regex::new(
        r"发\s*票\s*号\s*码\s*[:：]?\s*([0-9]{8,20})(?:[^0-9]|$)"
    ).unwrap();

    // 名称: appears once for the buyer and once for the seller
    pub static ref PARTY_NAME: Regex = Regex::new(
        r"名\s*称\s*[:： ]\s*([\x{4e00}-\x{9fa5}]+)"
    ).unwrap();

    // 小写: amount in figures, greedy up to the last digit/dot run on the line
    pub static ref AMOUNT_IN_FIGURES: Regex = Regex::new(
        r"小写.*[0-9.]+"
    ).unwrap();

    // Seller section header (销售方 / 销方)
    pub static ref SELLER_SECTION: Regex = Regex::new(
        r"销\s*售\s*方|销\s*方"
    ).unwrap();
}

/// Literal prefix stripped from a normalized amount snippet.
pub const AMOUNT_PREFIX: &str = "小写¥";
