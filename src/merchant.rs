use std::sync::LazyLock;

use regex::Regex;

/// Normalized names shorter than this are noise, not merchants.
pub const MIN_MERCHANT_LEN: usize = 3;

static AMAZON_MARKETPLACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)AMZN\s+MKTP\s+US\*").unwrap());
static TST_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^TST(\*\s*|\s+)").unwrap());
static SP_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^SP\s+").unwrap());
static DD_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^DD\s+\*\s*").unwrap());
static LONG_DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{5,}").unwrap());
static REFERENCE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+#\d+").unwrap());
static TRAILING_CLAUSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+-\s+.*").unwrap());
static TRAILING_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\d{1,2}/\d{1,2}$").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Canonicalize a raw statement description into a stable grouping key
/// for search, so "AMAZON.COM*AB12CD3 12/25" and "AMZN MKTP US*XY987"
/// land under one label.
///
/// The processor tags (TST, SP, DD) and the Amazon Marketplace marker
/// carry the '*' themselves, so those rewrites run before the '*'
/// truncation that drops trailing store codes.
pub fn normalize_merchant(description: &str) -> String {
    let mut name = description.to_uppercase();
    name = AMAZON_MARKETPLACE.replace_all(&name, "AMAZON ").into_owned();
    name = TST_PREFIX.replace(&name, "").into_owned();
    name = SP_PREFIX.replace(&name, "").into_owned();
    name = DD_PREFIX.replace(&name, "").into_owned();
    if let Some(star) = name.find('*') {
        name.truncate(star);
    }
    name = LONG_DIGIT_RUN.replace_all(&name, "").into_owned();
    name = REFERENCE_NUMBER.replace_all(&name, "").into_owned();
    name = TRAILING_CLAUSE.replace(&name, "").into_owned();
    name = TRAILING_DATE.replace(&name, "").into_owned();
    collapse(&name, 40)
}

/// The looser merchant key used by the leaderboard view. Deliberately
/// less aggressive than [`normalize_merchant`] - the leaderboard favors
/// recall over precision - so the two must stay separate functions.
pub fn display_merchant(description: &str) -> String {
    let mut name = description.to_string();
    if let Some(star) = name.find('*') {
        name.truncate(star);
    }
    name = LONG_DIGIT_RUN.replace_all(&name, "").into_owned();
    collapse(&name, 30)
}

/// Collapse whitespace runs, trim, and cap the length.
fn collapse(name: &str, cap: usize) -> String {
    WHITESPACE
        .replace_all(name, " ")
        .trim()
        .chars()
        .take(cap)
        .collect()
}
