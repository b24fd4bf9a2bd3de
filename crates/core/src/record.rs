use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Fixed column order of the cheque table.
pub const COLUMNS: [&str; 5] = ["Filename", "Bank Name", "IFSC Code", "Amount", "Date"];

/// One extracted cheque. Built once per processed image and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChequeRecord {
    #[serde(rename = "Filename")]
    pub filename: String,
    #[serde(rename = "Bank Name")]
    pub bank_name: String,
    /// Empty, or an 11-character code shaped `[A-Z]{4}0[0-9A-Z]{6}`.
    #[serde(rename = "IFSC Code")]
    pub ifsc_code: String,
    /// Largest two-decimal number found in the amount region, kept as text.
    #[serde(rename = "Amount")]
    pub amount: Option<String>,
    /// Empty, `DD-MM-YYYY`, or whatever the date normalizer could not reshape.
    #[serde(rename = "Date")]
    pub date: String,
}

impl ChequeRecord {
    /// Numeric amount rounded to two places; `None` when absent or unparseable.
    pub fn amount_value(&self) -> Option<Decimal> {
        let raw = self.amount.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        Decimal::from_str(raw).ok().map(|d| d.round_dp(2))
    }
}
