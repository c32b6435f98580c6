//! Best-effort numeric parsing for scraped text.
//!
//! Every parser returns the value together with a `defaulted` flag so the
//! caller decides how to report the fallback instead of hiding it.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse a decimal, stripping thousands separators and whitespace.
///
/// Returns `(0, true)` when the text is not a number.
pub fn parse_decimal_or_default(text: &str) -> (Decimal, bool) {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    match Decimal::from_str(&cleaned).or_else(|_| Decimal::from_scientific(&cleaned)) {
        Ok(value) => (value, false),
        Err(_) => (Decimal::ZERO, true),
    }
}

/// Parse a decimal that uses `,` as the decimal separator (e.g. `81,1234`).
pub fn parse_locale_decimal(text: &str) -> Option<Decimal> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    Decimal::from_str(&cleaned).ok()
}

/// Parse a growth cell such as `12.5%`, `-3,4 %` or `"\n 7.1\n%"`.
///
/// Whitespace and `%` are removed and `,` becomes `.`. Anything that is not
/// a finite float yields `(0.0, true)`.
pub fn parse_growth(text: &str) -> (f64, bool) {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != '%' && !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => (v, false),
        _ => (0.0, true),
    }
}

/// Upside from `low` to `high` in percent: `(high - low) / low * 100`.
///
/// Zero when `low` is not positive; never negative. `None` when an
/// intermediate result does not fit in a `Decimal`.
pub fn potential_profit(low: Decimal, high: Decimal) -> Option<Decimal> {
    if low <= Decimal::ZERO {
        return Some(Decimal::ZERO);
    }
    let upside = high
        .checked_sub(low)?
        .checked_div(low)?
        .checked_mul(Decimal::ONE_HUNDRED)?;
    Some(upside.max(Decimal::ZERO))
}
