use std::{fmt, ops::Neg, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{EngineError, ResultEngine};

/// An amount of money in minor units (centavos), signed.
///
/// Balances may be negative; transaction amounts and maintenance costs are
/// validated to be non-negative before they are stored. Every stored amount
/// stays within [`Money::MAX_AMOUNT`] in magnitude, so a handful of them can
/// be combined without leaving `i64`. Combining goes through [`Money::try_add`]
/// and [`Money::try_sub`], which report an out-of-range result as
/// [`EngineError::InvalidAmount`] instead of wrapping.
///
/// Serialized as a decimal string with two fraction digits (`"1250.00"`).
///
/// ```rust
/// use engine::Money;
///
/// let fee: Money = "12,5".parse().unwrap();
/// assert_eq!(fee.minor(), 1250);
/// assert_eq!(fee.try_add(Money::new(5)).unwrap().to_string(), "12.55");
/// assert!("0.125".parse::<Money>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Largest magnitude accepted for a stored amount: 10 trillion.
    pub const MAX_AMOUNT: Money = Money(1_000_000_000_000_000);

    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Rejects amounts whose magnitude exceeds [`Money::MAX_AMOUNT`].
    /// `what` names the field in the error message.
    pub fn bounded(self, what: &str) -> ResultEngine<Self> {
        if self.0.unsigned_abs() > Self::MAX_AMOUNT.0.unsigned_abs() {
            return Err(EngineError::InvalidAmount(format!(
                "{what} must not exceed {}",
                Self::MAX_AMOUNT
            )));
        }
        Ok(self)
    }

    pub fn try_add(self, rhs: Money) -> ResultEngine<Self> {
        self.0.checked_add(rhs.0).map(Money).ok_or_else(out_of_range)
    }

    pub fn try_sub(self, rhs: Money) -> ResultEngine<Self> {
        self.0.checked_sub(rhs.0).map(Money).ok_or_else(out_of_range)
    }
}

fn out_of_range() -> EngineError {
    EngineError::InvalidAmount("amount out of range".to_string())
}

/// Saturates at `i64::MAX` for `i64::MIN`, which no validated amount reaches.
impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(self.0.saturating_neg())
    }
}

impl From<i64> for Money {
    fn from(minor: i64) -> Self {
        Self(minor)
    }
}

impl From<Money> for i64 {
    fn from(amount: Money) -> Self {
        amount.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            f.write_str("-")?;
        }
        let magnitude = self.0.unsigned_abs();
        write!(f, "{}.{:02}", magnitude / 100, magnitude % 100)
    }
}

/// Accepts an optional sign, whole units, and up to two fraction digits after
/// `.` or `,`. Surrounding whitespace is ignored.
impl FromStr for Money {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let malformed = || EngineError::InvalidAmount(format!("malformed amount '{raw}'"));

        let (negative, unsigned) = match raw.as_bytes().first() {
            Some(b'-') => (true, raw[1..].trim_start()),
            Some(b'+') => (false, raw[1..].trim_start()),
            _ => (false, raw),
        };
        let (units, fraction) = match unsigned.find(['.', ',']) {
            Some(at) => (&unsigned[..at], &unsigned[at + 1..]),
            None => (unsigned, ""),
        };

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if units.is_empty() || !all_digits(units) || !all_digits(fraction) {
            return Err(malformed());
        }

        if fraction.len() > 2 {
            return Err(EngineError::InvalidAmount(
                "at most two decimal places are allowed".to_string(),
            ));
        }
        let cents = if fraction.is_empty() {
            0
        } else {
            format!("{fraction:0<2}")
                .parse::<i64>()
                .map_err(|_| malformed())?
        };

        let minor = units
            .parse::<i64>()
            .ok()
            .and_then(|units| units.checked_mul(100))
            .and_then(|minor| minor.checked_add(cents))
            .ok_or_else(out_of_range)?;
        let amount = Money(if negative { -minor } else { minor });
        amount.bounded("amount")
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ResultEngine<i64> {
        text.parse::<Money>().map(Money::minor)
    }

    #[test]
    fn renders_two_fraction_digits_with_sign() {
        assert_eq!(Money::ZERO.to_string(), "0.00");
        assert_eq!(Money::new(7).to_string(), "0.07");
        assert_eq!(Money::new(-30).to_string(), "-0.30");
        assert_eq!(Money::new(125_000).to_string(), "1250.00");
        assert_eq!(Money::new(i64::MIN).to_string(), "-92233720368547758.08");
    }

    #[test]
    fn parses_both_decimal_separators() {
        assert_eq!(parse("42").unwrap(), 42_00);
        assert_eq!(parse("42,5").unwrap(), 42_50);
        assert_eq!(parse("42.05").unwrap(), 42_05);
        assert_eq!(parse("- 0.01").unwrap(), -1);
        assert_eq!(parse("+3,").unwrap(), 3_00);
        assert_eq!(parse(" 7.10\n").unwrap(), 7_10);
    }

    #[test]
    fn parse_errors_are_invalid_amount() {
        for text in ["", "-", ".5", "1.2.3", "1,2.3", "12a", "1.x", "12.345", "0.001"] {
            assert!(
                matches!(parse(text), Err(EngineError::InvalidAmount(_))),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn parse_enforces_the_amount_limit() {
        let limit = Money::MAX_AMOUNT.to_string();
        assert_eq!(parse(&limit).unwrap(), Money::MAX_AMOUNT.minor());
        assert_eq!(parse(&format!("-{limit}")).unwrap(), -Money::MAX_AMOUNT.minor());
        assert!(parse("10000000000000.01").is_err());
        assert!(parse("50000000000000000.00").is_err());
        assert!(parse("99999999999999999999").is_err());
    }

    #[test]
    fn arithmetic_reports_overflow_instead_of_wrapping() {
        let big = Money::new(i64::MAX - 1);
        assert_eq!(big.try_add(Money::new(1)).unwrap(), Money::new(i64::MAX));
        assert!(matches!(
            big.try_add(Money::new(2)),
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(
            Money::new(i64::MIN).try_sub(Money::new(1)),
            Err(EngineError::InvalidAmount(_))
        ));
        assert_eq!(-Money::new(i64::MIN), Money::new(i64::MAX));
    }

    #[test]
    fn bounded_checks_magnitude() {
        assert!(Money::MAX_AMOUNT.bounded("cost").is_ok());
        assert!((-Money::MAX_AMOUNT).bounded("cost").is_ok());
        let err = Money::new(Money::MAX_AMOUNT.minor() + 1)
            .bounded("cost")
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidAmount("cost must not exceed 10000000000000.00".to_string())
        );
    }

    #[test]
    fn serde_round_trips_as_string() {
        assert_eq!(serde_json::to_string(&Money::new(25_000)).unwrap(), "\"250.00\"");
        let back: Money = serde_json::from_str("\"-1,5\"").unwrap();
        assert_eq!(back, Money::new(-150));
        assert!(serde_json::from_str::<Money>("\"1.234\"").is_err());
        assert!(serde_json::from_str::<Money>("125").is_err());
    }
}
