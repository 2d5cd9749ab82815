use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Indonesian magnitude words, substituted in this order.
const MAGNITUDE_WORDS: [(&str, &str); 4] = [
    ("jt", "000000"),
    ("juta", "000000"),
    ("rb", "000"),
    ("ribu", "000"),
];

fn thousand_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d)k").unwrap())
}

fn non_digits() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\D").unwrap())
}

/// Parses an amount as returned by the model: a JSON number or informal text.
///
/// Numbers keep their sign and floats truncate toward zero. Numbers outside
/// the `i64` range are 0, as is anything that is neither a number nor a string.
pub fn parse_amount(value: &Value) -> i64 {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(float_to_amount))
            .unwrap_or(0),
        Value::String(text) => parse_amount_text(text),
        _ => 0,
    }
}

fn float_to_amount(value: f64) -> Option<i64> {
    let truncated = value.trunc();
    // i64::MAX is not representable as f64; 2^63 is the first value out of range.
    if truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
        Some(truncated as i64)
    } else {
        None
    }
}

/// Converts informal amount text ("25rb", "5jt", "25.000", "150k") to whole IDR.
///
/// Never fails; text without digits yields 0.
pub fn parse_amount_text(text: &str) -> i64 {
    let mut normalized: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | ',' | '.'))
        .collect();

    for (word, zeros) in MAGNITUDE_WORDS {
        normalized = normalized.replace(word, zeros);
    }
    normalized = thousand_suffix()
        .replace_all(&normalized, "${1}000")
        .into_owned();

    let digits = non_digits().replace_all(&normalized, "");
    if digits.is_empty() {
        return 0;
    }
    digits.parse::<i64>().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_magnitude_words() {
        assert_eq!(parse_amount_text("25rb"), 25_000);
        assert_eq!(parse_amount_text("25 ribu"), 25_000);
        assert_eq!(parse_amount_text("5jt"), 5_000_000);
        assert_eq!(parse_amount_text("2 juta"), 2_000_000);
        assert_eq!(parse_amount_text("150k"), 150_000);
        assert_eq!(parse_amount_text("150K"), 150_000);
    }

    #[test]
    fn test_thousands_separators() {
        assert_eq!(parse_amount_text("25.000"), 25_000);
        assert_eq!(parse_amount_text("1,250,000"), 1_250_000);
        assert_eq!(parse_amount_text("Rp 45 500"), 45_500);
        assert_eq!(parse_amount_text("25rb"), parse_amount_text("25.000"));
    }

    #[test]
    fn test_canonical_numbers_are_stable() {
        let first = parse_amount_text("25000");
        assert_eq!(first, 25_000);
        assert_eq!(parse_amount_text(&first.to_string()), first);
    }

    #[test]
    fn test_unparseable_is_zero() {
        assert_eq!(parse_amount_text(""), 0);
        assert_eq!(parse_amount_text("gratis"), 0);
        assert_eq!(parse_amount_text("99999999999999999999999"), 0);
    }

    #[test]
    fn test_json_values() {
        assert_eq!(parse_amount(&json!(25000)), 25_000);
        assert_eq!(parse_amount(&json!(25000.9)), 25_000);
        assert_eq!(parse_amount(&json!(-5000)), -5_000);
        assert_eq!(parse_amount(&json!("50rb")), 50_000);
        assert_eq!(parse_amount(&json!(null)), 0);
        assert_eq!(parse_amount(&json!(true)), 0);
    }

    #[test]
    fn test_out_of_range_numbers_are_zero() {
        assert_eq!(parse_amount(&json!(1e19)), 0);
        assert_eq!(parse_amount(&json!(-1e19)), 0);
        assert_eq!(parse_amount(&json!(u64::MAX)), 0);
        assert_eq!(parse_amount(&json!(i64::MAX)), i64::MAX);
        assert_eq!(
            parse_amount(&json!(1e19)),
            parse_amount(&json!("99999999999999999999999"))
        );
    }
}
