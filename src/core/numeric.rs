//! Canonical decimal text for FatturaPA quantity and price fields.
//!
//! The schema wants `<integer>.<7 digits>` with at most 15 integer digits for
//! quantities and unit prices. Values are handled as text so that formatting
//! never passes through floating point.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use super::error::FatturaError;

/// Number of fractional digits in the canonical form.
pub const FRACTION_DIGITS: usize = 7;

/// Maximum integer digits kept for capped fields.
pub const MAX_INTEGER_DIGITS: usize = 15;

/// Canonical form of an empty or reset field.
pub const ZERO_CANONICAL: &str = "0.0000000";

/// Numeric line-item fields with distinct formatting rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecimalField {
    /// `Quantita`
    Quantity,
    /// `PrezzoUnitario`
    UnitPrice,
    /// `PrezzoTotale`, never capped.
    TotalPrice,
}

impl DecimalField {
    /// Integer digit cap for this field, if any.
    pub fn max_integer_digits(self) -> Option<usize> {
        match self {
            DecimalField::Quantity | DecimalField::UnitPrice => Some(MAX_INTEGER_DIGITS),
            DecimalField::TotalPrice => None,
        }
    }
}

/// Format user input as canonical decimal text.
///
/// - a comma is accepted as decimal separator;
/// - leading zeros are stripped (a bare `0` stays);
/// - the fraction is truncated or right-padded to exactly 7 digits;
/// - capped fields keep only the **rightmost** 15 integer digits, silently
///   dropping magnitude;
/// - empty input gives `0.0000000`.
///
/// ```
/// use fatturapa::core::{canonical_decimal, DecimalField};
///
/// assert_eq!(canonical_decimal("007.1", DecimalField::Quantity).unwrap(), "7.1000000");
/// assert_eq!(canonical_decimal("", DecimalField::UnitPrice).unwrap(), "0.0000000");
/// ```
pub fn canonical_decimal(input: &str, field: DecimalField) -> Result<String, FatturaError> {
    let value = input.trim().replace(',', ".");
    if value.is_empty() {
        return Ok(ZERO_CANONICAL.to_string());
    }

    let (int_part, frac_part) = value.split_once('.').unwrap_or((value.as_str(), ""));
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(FatturaError::InvalidNumber(input.to_string()));
    }

    let mut int_part = strip_leading_zeros(int_part);
    if let Some(max) = field.max_integer_digits() {
        if int_part.len() > max {
            int_part = strip_leading_zeros(&int_part[int_part.len() - max..]);
        }
    }

    let mut fraction: String = frac_part.chars().take(FRACTION_DIGITS).collect();
    while fraction.len() < FRACTION_DIGITS {
        fraction.push('0');
    }

    Ok(format!("{int_part}.{fraction}"))
}

/// Like [`canonical_decimal`], but resets unparseable input to `0.0000000`.
///
/// This is the focus-loss behaviour of an editor field.
pub fn canonical_or_zero(input: &str, field: DecimalField) -> String {
    canonical_decimal(input, field).unwrap_or_else(|_| ZERO_CANONICAL.to_string())
}

fn strip_leading_zeros(digits: &str) -> &str {
    let stripped = digits.trim_start_matches('0');
    if stripped.is_empty() { "0" } else { stripped }
}

/// Whether a partially typed value is acceptable in a numeric field.
///
/// Accepts the empty string, digits, and at most one dot, with at most 7
/// fractional digits and, for capped fields, at most 15 integer digits.
pub fn accepts_partial_input(field: DecimalField, text: &str) -> bool {
    if text.is_empty() {
        return true;
    }
    if !text.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return false;
    }
    if text.matches('.').count() > 1 {
        return false;
    }

    let (int_part, frac_part) = text.split_once('.').unwrap_or((text, ""));
    if let Some(max) = field.max_integer_digits() {
        if int_part.len() > max {
            return false;
        }
    }
    frac_part.len() <= FRACTION_DIGITS
}

/// Parse decimal text as stored in the document. A comma separator is accepted.
pub fn parse_decimal(text: &str) -> Result<Decimal, FatturaError> {
    let normalized = text.trim().replace(',', ".");
    Decimal::from_str(&normalized).map_err(|_| FatturaError::InvalidNumber(text.to_string()))
}

/// Line total `quantity * unit_price` with exactly 7 fractional digits.
///
/// Plain rounding of the product, not the capped canonical form.
pub fn line_total(quantity: &str, unit_price: &str) -> Result<String, FatturaError> {
    let q = parse_decimal(quantity)?;
    let p = parse_decimal(unit_price)?;
    let total = q
        .checked_mul(p)
        .ok_or_else(|| FatturaError::InvalidNumber(format!("{quantity} * {unit_price} overflows")))?;
    Ok(format_fixed(total, FRACTION_DIGITS as u32))
}

/// Format an amount with two decimals, rounding half away from zero.
pub fn format_amount(amount: Decimal) -> String {
    format_fixed(amount, 2)
}

fn format_fixed(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.prec$}", rounded, prec = dp as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn canonical_cases() {
        let q = DecimalField::Quantity;
        assert_eq!(canonical_decimal("5", q).unwrap(), "5.0000000");
        assert_eq!(canonical_decimal("12.3", q).unwrap(), "12.3000000");
        assert_eq!(canonical_decimal("", q).unwrap(), "0.0000000");
        assert_eq!(canonical_decimal("007.1", q).unwrap(), "7.1000000");
        assert_eq!(canonical_decimal("0", q).unwrap(), "0.0000000");
        assert_eq!(canonical_decimal("000", q).unwrap(), "0.0000000");
        assert_eq!(canonical_decimal(".5", q).unwrap(), "0.5000000");
        assert_eq!(canonical_decimal("3,25", q).unwrap(), "3.2500000");
    }

    #[test]
    fn fraction_is_truncated_not_rounded() {
        assert_eq!(
            canonical_decimal("1.123456789", DecimalField::UnitPrice).unwrap(),
            "1.1234567"
        );
    }

    #[test]
    fn integer_overflow_keeps_rightmost_digits() {
        assert_eq!(
            canonical_decimal("1234567890123456789", DecimalField::Quantity).unwrap(),
            "567890123456789.0000000"
        );
        assert_eq!(
            canonical_decimal("1234567890123456789", DecimalField::TotalPrice).unwrap(),
            "1234567890123456789.0000000"
        );
    }

    #[test]
    fn truncation_restrips_exposed_zeros() {
        assert_eq!(
            canonical_decimal("1000000000000000012", DecimalField::UnitPrice).unwrap(),
            "12.0000000"
        );
    }

    #[test]
    fn non_numeric_is_rejected() {
        assert!(canonical_decimal("12a", DecimalField::Quantity).is_err());
        assert!(canonical_decimal("1.2.3", DecimalField::Quantity).is_err());
        assert!(canonical_decimal("-4", DecimalField::Quantity).is_err());
        assert_eq!(canonical_or_zero("abc", DecimalField::Quantity), ZERO_CANONICAL);
    }

    #[test]
    fn partial_input_rules() {
        assert!(accepts_partial_input(DecimalField::Quantity, ""));
        assert!(accepts_partial_input(DecimalField::Quantity, "12."));
        assert!(accepts_partial_input(DecimalField::Quantity, "0.1234567"));
        assert!(!accepts_partial_input(DecimalField::Quantity, "0.12345678"));
        assert!(!accepts_partial_input(DecimalField::Quantity, "1,5"));
        assert!(!accepts_partial_input(DecimalField::Quantity, "1.2.3"));
        assert!(!accepts_partial_input(DecimalField::UnitPrice, "1234567890123456"));
        assert!(accepts_partial_input(DecimalField::TotalPrice, "1234567890123456"));
    }

    #[test]
    fn line_total_has_seven_decimals() {
        assert_eq!(line_total("2.0000000", "5.2500000").unwrap(), "10.5000000");
        assert_eq!(line_total("3", "0.3333333").unwrap(), "0.9999999");
        assert_eq!(line_total("1.0000001", "1.0000001").unwrap(), "1.0000002");
        assert!(line_total("x", "1").is_err());
    }

    #[test]
    fn amounts_round_to_two_decimals() {
        assert_eq!(format_amount(dec!(15.5)), "15.50");
        assert_eq!(format_amount(dec!(3.41)), "3.41");
        assert_eq!(format_amount(dec!(0)), "0.00");
        assert_eq!(format_amount(dec!(2.675)), "2.68");
        assert_eq!(format_amount(dec!(2.665)), "2.67");
        assert_eq!(format_amount(dec!(0.125)), "0.13");
    }
}
