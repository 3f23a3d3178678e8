use regex::Regex;
use std::sync::OnceLock;

fn month_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2})月").expect("valid regex"))
}

fn year_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{4})年").expect("valid regex"))
}

fn number_prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?").expect("valid regex")
    })
}

/// Parses a month header such as "1月", "11月" or "4月(30日)" into its month number.
pub fn parse_month_token(text: &str) -> Option<u32> {
    month_token_regex()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Extracts the bare four-digit year from a year header such as "2026年" or " 2025年度".
pub fn parse_year_token(text: &str) -> Option<String> {
    year_token_regex()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Lenient numeric coercion for hand-maintained cells.
///
/// Thousands separators and surrounding whitespace are ignored and the longest numeric
/// prefix is used ("1,234円" -> 1234). Anything without a numeric prefix is 0.
pub fn parse_number(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '，' | ' ' | '\u{3000}'))
        .collect();

    number_prefix_regex()
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

/// Rounds to one decimal place, halves rounding towards positive infinity.
pub fn round1(value: f64) -> f64 {
    (value * 10.0 + 0.5).floor() / 10.0
}

/// Rounds to the nearest integer, halves rounding towards positive infinity.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Converts a raw currency amount to thousands.
pub fn to_thousands(raw: f64) -> i64 {
    round_half_up(raw / 1000.0)
}

/// Percentage of `part` over `base`, or 0 when the base is not positive.
pub fn ratio_percent(part: f64, base: f64) -> f64 {
    if base > 0.0 {
        part / base * 100.0
    } else {
        0.0
    }
}

/// Display label for a monthly column: "25/1月" when the year is known, "1月" otherwise.
pub fn month_label(year: &str, month: u32) -> String {
    if year.is_empty() {
        format!("{}月", month)
    } else {
        let short: String = year.chars().skip(2).collect();
        format!("{}/{}月", short, month)
    }
}

/// Formats a signed percentage with one decimal, e.g. "-1.5".
pub fn format_percent(value: f64) -> String {
    format!("{:.1}", round1(value))
}
