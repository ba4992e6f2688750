// 💵 Money helpers - lenient parsing and display formatting
//
// The AI endpoints and the CSV importer receive money fields as free-form
// strings ("$1,234.56", "1.234,56 €", " 950 "). Parsing is deliberately
// forgiving: strip symbols, work out which separator is the decimal point,
// and fall back to None rather than erroring the whole request.

use serde_json::Value;

/// Parse a money string leniently into an amount.
///
/// Accepts currency symbols, thousands separators (comma, dot, space,
/// apostrophe), leading/trailing junk, and both `1,234.56` and `1.234,56`
/// conventions. Returns `None` when no number can be recovered.
pub fn parse_lenient(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Keep digits, separators and sign; drop symbols/letters/whitespace
    let mut cleaned = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        match ch {
            '0'..='9' | '.' | ',' | '-' => cleaned.push(ch),
            _ => {}
        }
    }
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }

    let negative = cleaned.starts_with('-');
    let digits: String = cleaned.chars().filter(|c| *c != '-').collect();
    if digits.is_empty() {
        return None;
    }

    let last_dot = digits.rfind('.');
    let last_comma = digits.rfind(',');

    let normalized = match (last_dot, last_comma) {
        // Both present: the later one is the decimal separator
        (Some(d), Some(c)) => {
            let decimal_sep = if d > c { '.' } else { ',' };
            normalize_with_decimal(&digits, decimal_sep)
        }
        // Only one separator: decimal if it looks like one (1-2 trailing
        // digits and a single occurrence), thousands grouping otherwise
        (Some(_), None) => normalize_single_separator(&digits, '.'),
        (None, Some(_)) => normalize_single_separator(&digits, ','),
        (None, None) => digits.clone(),
    };

    let value: f64 = normalized.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

fn normalize_with_decimal(digits: &str, decimal_sep: char) -> String {
    let mut out = String::with_capacity(digits.len());
    let decimal_pos = digits.rfind(decimal_sep);
    for (i, ch) in digits.char_indices() {
        match ch {
            '.' | ',' => {
                if Some(i) == decimal_pos {
                    out.push('.');
                }
                // Grouping separators are dropped
            }
            _ => out.push(ch),
        }
    }
    out
}

fn normalize_single_separator(digits: &str, sep: char) -> String {
    let count = digits.matches(sep).count();
    let tail_len = digits.rsplit(sep).next().map_or(0, |t| t.len());
    let head = digits.split(sep).next().unwrap_or("");

    // "1.234" / "1,234" with exactly three trailing digits reads as grouping;
    // "10.5", "10.50" read as decimals, as does anything led by a bare zero
    // ("0.056")
    let is_decimal = count == 1 && (tail_len != 3 || head == "0" || head.is_empty());
    if is_decimal {
        digits.replace(sep, ".")
    } else {
        digits.chars().filter(|c| *c != sep).collect()
    }
}

/// Lenient amount extraction from a JSON value: numbers pass through,
/// strings go through `parse_lenient`, everything else is `None`.
pub fn lenient_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_lenient(s),
        _ => None,
    }
}

/// Format an amount for reports and prompts: "$1,234.56"
pub fn format_amount(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    // Insert thousands separators right-to-left
    let whole_str = whole.to_string();
    let mut grouped = String::with_capacity(whole_str.len() + whole_str.len() / 3);
    for (i, ch) in whole_str.chars().enumerate() {
        if i > 0 && (whole_str.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-${}.{:02}", grouped, frac)
    } else {
        format!("${}.{:02}", grouped, frac)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_numbers() {
        assert_eq!(parse_lenient("1234.56"), Some(1234.56));
        assert_eq!(parse_lenient("950"), Some(950.0));
        assert_eq!(parse_lenient("-12.5"), Some(-12.5));
        assert_eq!(parse_lenient("0.05"), Some(0.05));
    }

    #[test]
    fn test_currency_symbols_and_whitespace() {
        assert_eq!(parse_lenient("$1,234.56"), Some(1234.56));
        assert_eq!(parse_lenient(" 950 USD "), Some(950.0));
        assert_eq!(parse_lenient("€99.99"), Some(99.99));
        assert_eq!(parse_lenient("-$40.00"), Some(-40.0));
    }

    #[test]
    fn test_european_convention() {
        assert_eq!(parse_lenient("1.234,56"), Some(1234.56));
        assert_eq!(parse_lenient("1 234,56"), Some(1234.56));
        assert_eq!(parse_lenient("10,5"), Some(10.5));
    }

    #[test]
    fn test_grouping_only() {
        assert_eq!(parse_lenient("1,234"), Some(1234.0));
        assert_eq!(parse_lenient("12,345,678"), Some(12345678.0));
        assert_eq!(parse_lenient("1.234"), Some(1234.0));
    }

    #[test]
    fn test_garbage_returns_none() {
        assert_eq!(parse_lenient(""), None);
        assert_eq!(parse_lenient("   "), None);
        assert_eq!(parse_lenient("n/a"), None);
        assert_eq!(parse_lenient("-"), None);
        assert_eq!(parse_lenient("$"), None);
    }

    #[test]
    fn test_lenient_amount_from_json() {
        assert_eq!(lenient_amount(&json!(1234.56)), Some(1234.56));
        assert_eq!(lenient_amount(&json!("$1,234.56")), Some(1234.56));
        assert_eq!(lenient_amount(&json!(null)), None);
        assert_eq!(lenient_amount(&json!(["x"])), None);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1234.56), "$1,234.56");
        assert_eq!(format_amount(0.0), "$0.00");
        assert_eq!(format_amount(-40.0), "-$40.00");
        assert_eq!(format_amount(999.999), "$1,000.00");
        assert_eq!(format_amount(1234567.0), "$1,234,567.00");
    }
}
