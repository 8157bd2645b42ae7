//! Fixed-point amounts of money.
//!
//! Amounts have exactly two decimal places and at most twelve significant digits.
//! They are stored in the database as whole cents and serialized as decimal strings,
//! e.g. "25.00", so that no precision is lost on the way to the client.

use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub},
    str::FromStr,
};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Error;

/// An amount of money with two decimal places.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
    /// No money.
    pub const ZERO: Amount = Amount(0);

    /// The largest magnitude an amount may have, 9,999,999,999.99.
    pub const MAX_CENTS: i64 = 999_999_999_999;

    /// Create an amount from a whole number of cents.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// The amount as a whole number of cents.
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// The amount as a decimal number with a scale of two.
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Parse an amount from loosely formatted text such as "$1,234.50" or "(12.00)".
    ///
    /// Currency symbols and whitespace around the number are ignored, as are
    /// comma thousands separators. Amounts wrapped in parentheses are negative.
    ///
    /// # Errors
    /// Returns [Error::InvalidAmount] if anything else is left over, e.g. letters,
    /// exponents, spaces inside the number or misplaced separators, or if the
    /// amount is out of range.
    pub fn parse_lenient(text: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidAmount(text.to_owned());

        let trimmed = text.trim();
        let (is_parenthesised, inner) = match trimmed
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
        {
            Some(inner) => (true, inner),
            None => (false, trimmed),
        };

        let is_padding = |c: char| c.is_whitespace() || CURRENCY_SYMBOLS.contains(&c);
        let mut number = inner.trim_matches(is_padding);
        let mut is_negative = false;

        // The sign may come before or after the currency symbol, "-$3" or "$-3".
        if let Some(rest) = number.strip_prefix('-') {
            is_negative = true;
            number = rest.trim_start_matches(is_padding);
        } else if let Some(rest) = number.strip_prefix('+') {
            number = rest.trim_start_matches(is_padding);
        }

        let digits = strip_thousands_separators(number).ok_or_else(invalid)?;
        let value = Decimal::from_str(&digits).map_err(|_| invalid())?;
        let value = if is_parenthesised {
            -value.abs()
        } else if is_negative {
            -value
        } else {
            value
        };

        Self::try_from(value).map_err(|_| invalid())
    }
}

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹', '₩', '₽', '¢'];

/// Remove comma thousands separators from a plain decimal number such as "1,234.50".
///
/// Returns `None` unless `number` is digits with correctly placed commas,
/// optionally followed by a point and more digits.
fn strip_thousands_separators(number: &str) -> Option<String> {
    let is_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());

    let (whole, fraction) = match number.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (number, None),
    };

    if let Some(fraction) = fraction {
        if fraction.is_empty() || !is_digits(fraction) {
            return None;
        }
    }

    let mut groups = whole.split(',');
    let first = groups.next()?;

    if whole.contains(',') {
        if first.is_empty() || first.len() > 3 || !is_digits(first) {
            return None;
        }

        if !groups.all(|group| group.len() == 3 && is_digits(group)) {
            return None;
        }
    } else if !is_digits(whole) || (whole.is_empty() && fraction.is_none()) {
        return None;
    }

    let mut digits = whole.replace(',', "");

    if let Some(fraction) = fraction {
        digits.push('.');
        digits.push_str(fraction);
    }

    Some(digits)
}

impl TryFrom<Decimal> for Amount {
    type Error = Error;

    /// Round `value` half away from zero to two decimal places.
    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let cents = (rounded * Decimal::ONE_HUNDRED)
            .to_i64()
            .filter(|cents| cents.abs() <= Self::MAX_CENTS)
            .ok_or_else(|| Error::InvalidAmount(value.to_string()))?;

        Ok(Self(cents))
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(|_| Error::InvalidAmount(s.to_owned()))?;

        Self::try_from(value)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.to_decimal().fmt(f)
    }
}

impl Neg for Amount {
    type Output = Amount;

    fn neg(self) -> Self::Output {
        Amount(-self.0)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount(self.0 - rhs.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    /// Accepts either a JSON string ("12.50") or a JSON number (12.5).
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;

        Amount::try_from(value).map_err(serde::de::Error::custom)
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Amount)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal_macros::dec;

    use crate::Error;

    use super::Amount;

    #[test]
    fn displays_two_decimal_places() {
        assert_eq!(Amount::from_cents(2500).to_string(), "25.00");
        assert_eq!(Amount::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Amount::ZERO.to_string(), "0.00");
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(Amount::try_from(dec!(1.005)), Ok(Amount::from_cents(101)));
        assert_eq!(Amount::try_from(dec!(-1.005)), Ok(Amount::from_cents(-101)));
        assert_eq!(Amount::try_from(dec!(1.004)), Ok(Amount::from_cents(100)));
    }

    #[test]
    fn rejects_amounts_over_twelve_digits() {
        assert_eq!(
            Amount::try_from(dec!(9999999999.99)),
            Ok(Amount::from_cents(Amount::MAX_CENTS))
        );
        assert!(matches!(
            Amount::try_from(dec!(10000000000.00)),
            Err(Error::InvalidAmount(_))
        ));
    }

    #[test]
    fn from_str_rejects_garbage() {
        assert!(matches!(Amount::from_str("abc"), Err(Error::InvalidAmount(_))));
        assert_eq!(Amount::from_str(" 12.5 "), Ok(Amount::from_cents(1250)));
    }

    #[test]
    fn parse_lenient_strips_currency_symbols_and_separators() {
        assert_eq!(Amount::parse_lenient("$1,234.50"), Ok(Amount::from_cents(123_450)));
        assert_eq!(Amount::parse_lenient("€ 12"), Ok(Amount::from_cents(1200)));
        assert_eq!(Amount::parse_lenient("-$3.10"), Ok(Amount::from_cents(-310)));
    }

    #[test]
    fn parse_lenient_treats_parentheses_as_negative() {
        assert_eq!(Amount::parse_lenient("(12.50)"), Ok(Amount::from_cents(-1250)));
    }

    #[test]
    fn parse_lenient_rejects_empty_and_symbol_only_text() {
        assert!(matches!(Amount::parse_lenient(""), Err(Error::InvalidAmount(_))));
        assert!(matches!(Amount::parse_lenient("$"), Err(Error::InvalidAmount(_))));
        assert!(matches!(Amount::parse_lenient("1.2.3"), Err(Error::InvalidAmount(_))));
    }

    #[test]
    fn parse_lenient_rejects_leftover_text() {
        for text in ["12 apples 3", "1e5", "1.234,56", "12,34", "1 000", "--5", "12$3", "USD"] {
            assert_eq!(
                Amount::parse_lenient(text),
                Err(Error::InvalidAmount(text.to_owned())),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn parse_lenient_accepts_sign_on_either_side_of_the_symbol() {
        assert_eq!(Amount::parse_lenient("$-3.10"), Ok(Amount::from_cents(-310)));
        assert_eq!(Amount::parse_lenient("+£7"), Ok(Amount::from_cents(700)));
        assert_eq!(Amount::parse_lenient("12.50 €"), Ok(Amount::from_cents(1250)));
        assert_eq!(Amount::parse_lenient("1,234,567"), Ok(Amount::from_cents(123_456_700)));
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&Amount::from_cents(1999)).unwrap();

        assert_eq!(json, "\"19.99\"");
    }

    #[test]
    fn deserializes_from_string_or_number() {
        let from_string: Amount = serde_json::from_str("\"25.10\"").unwrap();
        let from_number: Amount = serde_json::from_str("25.1").unwrap();

        assert_eq!(from_string, Amount::from_cents(2510));
        assert_eq!(from_number, Amount::from_cents(2510));
    }

    #[test]
    fn sums_and_negates() {
        let total: Amount = [100, 250, -50].into_iter().map(Amount::from_cents).sum();

        assert_eq!(total, Amount::from_cents(300));
        assert_eq!(-total, Amount::from_cents(-300));
        assert_eq!(total - Amount::from_cents(300), Amount::ZERO);
    }
}
