//! Amount type for handling monetary values scraped as text, such as `£1,234.56`.
//!
//! This module provides the `Amount` type which wraps `Decimal` and handles parsing values that
//! may or may not include a pound sign and commas.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Represents how sterling amounts were (or should be) formatted.
///
/// # Examples
///  - `AmountFormat{ pound: true, commas: true }` -> `-£60,000.00`
///  - `AmountFormat{ pound: false, commas: true }` -> `-60,000.00`
///  - `AmountFormat{ pound: false, commas: false }` -> `-60000.00`
///  - `AmountFormat{ pound: true, commas: false }` -> `-£60000.00`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AmountFormat {
    /// Whether a pound sign is present in the formatting.
    pound: bool,
    /// Whether commas are present as thousands separators in the formatting.
    commas: bool,
}

impl Default for AmountFormat {
    fn default() -> Self {
        DEFAULT_FORMAT
    }
}

/// The default format has a pound sign and commas: e.g. `-£60,000.00`.
const DEFAULT_FORMAT: AmountFormat = AmountFormat {
    pound: true,
    commas: true,
};

/// No pound sign and no commas: e.g. `-60000.00`. Used for values that feed spreadsheet formulas.
pub const PLAIN_FORMAT: AmountFormat = AmountFormat {
    pound: false,
    commas: false,
};

/// Represents a sterling amount.
///
/// Formatting is considered significant for the purposes of equality, so for numeric comparisons,
/// you should access the `Decimal` value and use that.
///
/// # Examples
///
/// ```
/// # use moverperfect::model::Amount;
/// # use std::str::FromStr;
/// let a = Amount::from_str("-5000.00").unwrap();
/// let b = Amount::from_str("-£5,000.00").unwrap();
/// assert_ne!(a, b);
/// assert_eq!(b.to_string(), "-£5,000.00");
/// assert_eq!(a.value(), b.value());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    /// The parsed numerical value.
    value: Decimal,
    /// The way the numerical value was parsed from, or should be written to, a `String`.
    format: AmountFormat,
}

impl Amount {
    /// Creates a new Amount from a Decimal value with default `String` formatting.
    pub const fn new(value: Decimal) -> Self {
        Self {
            value,
            format: DEFAULT_FORMAT,
        }
    }

    /// Creates a new Amount from a Decimal value with the specified formatting.
    pub const fn new_with_format(value: Decimal, format: AmountFormat) -> Self {
        Self { value, format }
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.value().is_zero()
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.value().is_sign_negative() && !self.is_zero()
    }

    /// Interprets this amount as pence and converts it to pounds, e.g. `1234.5` -> `12.345`.
    pub fn pence_to_pounds(&self) -> Amount {
        Amount::new_with_format(self.value / Decimal::ONE_HUNDRED, PLAIN_FORMAT)
    }
}

/// An error that can occur when parsing strings into `Decimal` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut pound_sign = false;

        let trimmed = s.trim();

        // The scrapers produce empty text for missing values
        if trimmed.is_empty() {
            return Ok(Amount::default());
        }

        let without_pound = if let Some(after_minus) = trimmed.strip_prefix('-') {
            // Negative number: could be "-£50.00" or "-50.00"
            if let Some(after_pound) = after_minus.strip_prefix('£') {
                pound_sign = true;
                format!("-{after_pound}")
            } else {
                trimmed.to_string()
            }
        } else if let Some(after_pound) = trimmed.strip_prefix('£') {
            pound_sign = true;
            after_pound.to_string()
        } else {
            trimmed.to_string()
        };

        // Remove commas (thousand separators)
        let without_commas = without_pound.replace(',', "");
        let commas = without_commas.len() < without_pound.len();

        let value = Decimal::from_str(&without_commas).map_err(AmountError)?;
        Ok(Amount {
            value,
            format: AmountFormat {
                pound: pound_sign,
                commas,
            },
        })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (sign, num) = if self.is_negative() {
            (String::from("-"), self.value().abs())
        } else {
            (String::new(), self.value().abs())
        };

        let pound = if self.format.pound {
            String::from("£")
        } else {
            String::new()
        };

        if self.format.commas {
            write!(
                f,
                "{sign}{pound}{}",
                format_num::format_num!(",.2", num.to_f64().unwrap_or_default())
            )
        } else {
            write!(f, "{sign}{pound}{num}")
        }
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_with_pound_sign() {
        let amount = Amount::from_str("£50.00").unwrap();
        assert_eq!(amount.value(), dec("50.00"));
    }

    #[test]
    fn test_parse_negative_with_pound_sign() {
        let amount = Amount::from_str("-£50.00").unwrap();
        assert_eq!(amount.value(), dec("-50.00"));
    }

    #[test]
    fn test_parse_empty_string_is_zero() {
        let amount = Amount::from_str("   ").unwrap();
        assert!(amount.is_zero());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(Amount::from_str("n/a").is_err());
    }

    #[test]
    fn test_display_zero() {
        let amount = Amount::default();
        assert_eq!(amount.to_string(), "£0.00");
    }

    #[test]
    fn test_display_negative() {
        let amount = Amount::new(dec("-1234.5"));
        assert_eq!(amount.to_string(), "-£1,234.50");
    }

    #[test]
    fn test_parse_retain_commas_no_pound_sign() {
        let s = "1,000,000.00";
        let amount = Amount::from_str(s).unwrap();
        assert_eq!(amount.to_string(), s);
    }

    #[test]
    fn test_parse_no_commas_retain_pound_sign() {
        let s = "-£1000000.00";
        let amount = Amount::from_str(s).unwrap();
        assert_eq!(amount.to_string(), s);
    }

    #[test]
    fn test_value_equality_across_formats() {
        let a = Amount::from_str("£12,500.00").unwrap();
        let b = Amount::from_str("12500").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.value(), b.value());
    }

    #[test]
    fn test_pence_to_pounds() {
        let pence = Amount::from_str("1234.5").unwrap();
        assert_eq!(pence.pence_to_pounds().to_string(), "12.345");
        assert_eq!(Amount::default().pence_to_pounds().to_string(), "0");
    }

    #[test]
    fn test_deserialize() {
        let amount: Amount = serde_json::from_str("\"£7,420.18\"").unwrap();
        assert_eq!(amount.value(), dec("7420.18"));
        assert_eq!(serde_json::to_string(&amount).unwrap(), "\"£7,420.18\"");
    }
}
