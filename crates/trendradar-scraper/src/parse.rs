//! Lenient parsing of localized price strings.

use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;

fn numeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // First run of digits possibly interleaved with '.', ',' and thin/plain
    // spaces used as grouping separators.
    RE.get_or_init(|| Regex::new(r"\d[\d.,\u{202f}\u{a0} ]*").expect("valid regex"))
}

/// Parses a localized price string into a [`Decimal`].
///
/// Handles currency symbols on either side, thousands separators, and both
/// decimal-comma ("29,99 €") and decimal-point ("$1,299.00") conventions.
/// Returns `None` when no numeric token is present ("free", "N/A").
#[must_use]
pub fn parse_price(raw: &str) -> Option<Decimal> {
    let token = numeric_re().find(raw)?.as_str();

    // Strip grouping spaces first, then decide which of '.'/',' is the
    // decimal separator: whichever occurs last, and only if its trailing
    // digit run looks like cents (1-2 digits). Everything else is grouping.
    let compact: String = token.chars().filter(|c| !c.is_whitespace()).collect();
    let compact = compact.replace(['\u{202f}', '\u{a0}'], "");

    let last_dot = compact.rfind('.');
    let last_comma = compact.rfind(',');
    let decimal_sep = match (last_dot, last_comma) {
        (Some(d), Some(c)) => Some(if d > c { '.' } else { ',' }),
        (Some(_), None) => Some('.'),
        (None, Some(_)) => Some(','),
        (None, None) => None,
    };

    let normalized = match decimal_sep {
        Some(sep) => {
            let idx = compact.rfind(sep)?;
            let fraction = &compact[idx + 1..];
            if fraction.len() <= 2 {
                let integer: String = compact[..idx]
                    .chars()
                    .filter(char::is_ascii_digit)
                    .collect();
                format!("{integer}.{fraction}")
            } else {
                // Trailing run is too long for cents; it's a grouped integer
                // like "1.299" (EUR thousands).
                compact.chars().filter(char::is_ascii_digit).collect()
            }
        }
        None => compact,
    };

    normalized.parse::<Decimal>().ok().map(|d| d.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn decimal_comma_with_euro_sign() {
        assert_eq!(parse_price("29,99 €"), Some(dec("29.99")));
    }

    #[test]
    fn decimal_point_with_leading_dollar() {
        assert_eq!(parse_price("$49.50"), Some(dec("49.50")));
    }

    #[test]
    fn us_thousands_grouping() {
        assert_eq!(parse_price("$1,299.00"), Some(dec("1299.00")));
    }

    #[test]
    fn eu_thousands_grouping() {
        assert_eq!(parse_price("€1.299,00"), Some(dec("1299.00")));
    }

    #[test]
    fn grouped_integer_without_cents() {
        assert_eq!(parse_price("1.299 EUR"), Some(dec("1299")));
    }

    #[test]
    fn bare_integer() {
        assert_eq!(parse_price("49"), Some(dec("49")));
    }

    #[test]
    fn thin_space_grouping() {
        assert_eq!(parse_price("1\u{202f}299,00 kr"), Some(dec("1299.00")));
    }

    #[test]
    fn no_digits_is_none() {
        assert_eq!(parse_price("free"), None);
        assert_eq!(parse_price(""), None);
    }
}
