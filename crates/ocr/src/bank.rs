use cheque_core::{bank_for_prefix, KNOWN_BANKS, UNKNOWN_BANK};

/// Bank name for a cheque: a known name printed on the page wins, then the
/// IFSC prefix table, else `"Unknown"`. `full_text` is expected uppercased.
pub fn resolve_bank(full_text: &str, ifsc_code: &str) -> String {
    if let Some(bank) = KNOWN_BANKS.iter().find(|b| full_text.contains(*b)) {
        return bank.to_string();
    }
    let prefix: String = ifsc_code.chars().take(4).collect();
    bank_for_prefix(&prefix).unwrap_or(UNKNOWN_BANK).to_string()
}
