//! Display formatting for amounts, dates and percentages

use chrono::NaiveDate;

/// Format an amount with currency symbol and thousands separators
///
/// `format_currency(-1234.5, "USD")` → `"-$1,234.50"`. Unknown currency codes
/// are appended after the number instead of prefixed.
pub fn format_currency(amount: f64, currency: &str) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    let code = currency.trim().to_uppercase();
    let (symbol, decimals) = match code.as_str() {
        "USD" => (Some("$"), 2),
        "EUR" => (Some("€"), 2),
        "GBP" => (Some("£"), 2),
        "JPY" => (Some("¥"), 0),
        _ => (None, 2),
    };

    let sign = if amount < 0.0 && round_to(amount.abs(), decimals) > 0.0 {
        "-"
    } else {
        ""
    };
    let number = group_thousands(amount.abs(), decimals);

    match symbol {
        Some(symbol) => format!("{}{}{}", sign, symbol, number),
        None => format!("{}{} {}", sign, number, code),
    }
}

/// `"Jan 5, 2026"`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// `"January 2026"`
pub fn format_month(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

/// `"12.3%"`
pub fn format_percentage(value: f64, decimals: usize) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    format!("{:.*}%", decimals, value)
}

/// Signed change, e.g. `"+12.3%"` or `"-4.0%"`
pub fn format_change(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    if value > 0.0 {
        format!("+{:.1}%", value)
    } else {
        format!("{:.1}%", value)
    }
}

fn round_to(value: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

fn group_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value);
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac_part {
        Some(frac) => format!("{}.{}", grouped, frac),
        None => grouped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1234.5, "USD"), "$1,234.50");
        assert_eq!(format_currency(-1234.5, "usd"), "-$1,234.50");
        assert_eq!(format_currency(0.0, "USD"), "$0.00");
        assert_eq!(format_currency(999.999, "USD"), "$1,000.00");
        assert_eq!(format_currency(1_000_000.0, "EUR"), "€1,000,000.00");
        assert_eq!(format_currency(1500.4, "JPY"), "¥1,500");
        assert_eq!(format_currency(12.0, "CHF"), "12.00 CHF");
        assert_eq!(format_currency(f64::NAN, "USD"), "$0.00");
    }

    #[test]
    fn test_negative_rounding_to_zero_has_no_sign() {
        assert_eq!(format_currency(-0.001, "USD"), "$0.00");
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert_eq!(format_date(date), "Jan 5, 2026");
        assert_eq!(format_month(date), "January 2026");
    }

    #[test]
    fn test_format_percentages() {
        assert_eq!(format_percentage(12.345, 1), "12.3%");
        assert_eq!(format_percentage(f64::INFINITY, 1), "0.0%");
        assert_eq!(format_change(12.34), "+12.3%");
        assert_eq!(format_change(-4.0), "-4.0%");
        assert_eq!(format_change(0.0), "0.0%");
    }
}
