use std::sync::OnceLock;

use cheque_core::DateStrategy;
use regex::Regex;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_ifsc, r"[A-Z]{4}0[0-9A-Z]{6}");
re!(re_amount, r"\d+\.\d{2}");

re!(re_date_numeric, r"\b\d{2}[-.]\d{2}[-.]\d{4}\b");
re!(re_date_abbr_dash, r"\b\d{1,2}-[A-Za-z]{3}-\d{4}\b");
re!(re_date_abbr_mixed, r"\b\d{1,2}[/-][A-Za-z]{3}[/-]\d{4}\b");

re!(re_norm_abbr, r"^(\d{1,2})[-/\s]?([A-Z]{3})[-/\s]?(\d{4})");
re!(re_norm_numeric, r"^(\d{2})[.-](\d{2})[.-](\d{4})");

re!(re_region_abbr, r"(\d{1,2})[-/.]([A-Z]{3})[-/.](\d{4})");
re!(re_region_numeric, r"(\d{2})[.-](\d{2})[.-](\d{4})");

const MONTHS: [(&str, &str); 12] = [
    ("JAN", "01"), ("FEB", "02"), ("MAR", "03"), ("APR", "04"),
    ("MAY", "05"), ("JUN", "06"), ("JUL", "07"), ("AUG", "08"),
    ("SEP", "09"), ("OCT", "10"), ("NOV", "11"), ("DEC", "12"),
];

/// Two-digit month for a three-letter abbreviation, `"00"` when unknown.
fn month_number(abbr: &str) -> &'static str {
    MONTHS
        .iter()
        .find(|(name, _)| *name == abbr)
        .map(|(_, num)| *num)
        .unwrap_or("00")
}

/// OCR commonly reads the digit zero as the letter O inside codes and numbers.
/// Applied per parser call on that parser's own copy of the text.
pub fn fix_letter_o(text: &str) -> String {
    text.replace('O', "0")
}

// ── IFSC ─────────────────────────────────────────────────────────────────────

/// First `[A-Z]{4}0[0-9A-Z]{6}` after O→0 substitution, or `""`.
///
/// The substitution is global, so a genuine letter O anywhere in the text is
/// turned into a zero before matching.
pub fn extract_ifsc(text: &str) -> String {
    let fixed = fix_letter_o(text);
    re_ifsc()
        .find(&fixed)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

// ── Amount ───────────────────────────────────────────────────────────────────

/// Largest `\d+\.\d{2}` number in the text, after dropping thousands
/// separators and O→0 substitution.
///
/// Candidates are compared digit by digit, so numbers of any length are
/// accepted. Leading zeros are dropped from the result.
pub fn extract_amount(text: &str) -> Option<String> {
    let cleaned = fix_letter_o(&text.replace(',', ""));
    re_amount()
        .find_iter(&cleaned)
        .filter_map(|m| m.as_str().split_once('.'))
        .map(|(int, frac)| (int.trim_start_matches('0'), frac))
        .max_by_key(|&(int, frac)| (int.len(), int, frac))
        .map(|(int, frac)| {
            let int = if int.is_empty() { "0" } else { int };
            format!("{int}.{frac}")
        })
}

// ── Date ─────────────────────────────────────────────────────────────────────

/// First date-looking token in the text, trying numeric dates before month
/// abbreviations. Returns `""` when nothing matches.
pub fn extract_date(text: &str) -> String {
    let fixed = fix_letter_o(text);
    [re_date_numeric(), re_date_abbr_dash(), re_date_abbr_mixed()]
        .into_iter()
        .find_map(|re| re.find(&fixed))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Reshape a raw date into `DD-MM-YYYY`. Anything that does not fit one of
/// the known shapes comes back untouched.
pub fn normalize_date(raw: &str) -> String {
    try_normalize(raw).unwrap_or_else(|| raw.to_string())
}

fn try_normalize(raw: &str) -> Option<String> {
    if let Some(c) = re_norm_abbr().captures(&raw.to_uppercase()) {
        let day: u32 = c.get(1)?.as_str().parse().ok()?;
        let month = month_number(c.get(2)?.as_str());
        let year = c.get(3)?.as_str();
        return Some(format!("{day:02}-{month}-{year}"));
    }
    let c = re_norm_numeric().captures(raw)?;
    Some(format!("{}-{}-{}", c.get(1)?.as_str(), c.get(2)?.as_str(), c.get(3)?.as_str()))
}

/// Single-pass extraction over the DATE region text: month abbreviations are
/// tried first and normalized, numeric dates are kept as written. No O→0
/// substitution happens here.
pub fn extract_region_date(text: &str) -> String {
    let upper = text.to_uppercase();
    if let Some(c) = re_region_abbr().captures(&upper) {
        if let Ok(day) = c[1].parse::<u32>() {
            return format!("{day:02}-{}-{}", month_number(&c[2]), &c[3]);
        }
    }
    if let Some(c) = re_region_numeric().captures(&upper) {
        return format!("{}-{}-{}", &c[1], &c[2], &c[3]);
    }
    String::new()
}

/// Final date field under the given strategy.
pub fn date_for(strategy: DateStrategy, full_text: &str, date_text: &str) -> String {
    match strategy {
        DateStrategy::FullText => normalize_date(&extract_date(full_text)),
        DateStrategy::Region => extract_region_date(date_text),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
