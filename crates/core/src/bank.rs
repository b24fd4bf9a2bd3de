/// Bank names searched for verbatim in uppercased page text, in priority order.
pub const KNOWN_BANKS: [&str; 8] = [
    "ICICI BANK",
    "AXIS BANK",
    "SYNDICATE BANK",
    "CANARA BANK",
    "STATE BANK OF INDIA",
    "BANK OF BARODA",
    "HDFC BANK",
    "UNION BANK",
];

/// First four characters of an IFSC code mapped to the issuing bank.
pub const IFSC_PREFIXES: [(&str, &str); 8] = [
    ("ICIC", "ICICI BANK"),
    ("UTIB", "AXIS BANK"),
    ("SYNB", "SYNDICATE BANK"),
    ("CNRB", "CANARA BANK"),
    ("SBIN", "STATE BANK OF INDIA"),
    ("BARB", "BANK OF BARODA"),
    ("HDFC", "HDFC BANK"),
    ("UBIN", "UNION BANK"),
];

pub const UNKNOWN_BANK: &str = "Unknown";

pub fn bank_for_prefix(prefix: &str) -> Option<&'static str> {
    IFSC_PREFIXES
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, bank)| *bank)
}
