use std::{
    fmt,
    ops::{Add, AddAssign, Sub},
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::EngineError;

/// Number of fractional digits carried by an [`Amount`].
pub const AMOUNT_DECIMALS: usize = 8;

const SCALE: i64 = 100_000_000;

/// Token amount represented as **integer minor units** (1e-8).
///
/// Use this type for **all** monetary values in the engine (requested and
/// confirmed amounts, balances, report totals) so sums never drift.
///
/// # Examples
///
/// ```rust
/// use engine::Amount;
///
/// let amount: Amount = "95.5".parse().unwrap();
/// assert_eq!(amount.minor(), 9_550_000_000);
/// assert_eq!(amount.to_string(), "95.50000000");
/// ```
///
/// Parsing accepts `.` or `,` as decimal separator and rejects more than 8
/// decimals:
///
/// ```rust
/// use engine::Amount;
///
/// assert_eq!("10,25".parse::<Amount>().unwrap().minor(), 1_025_000_000);
/// assert!("0.000000001".parse::<Amount>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Creates a new amount from integer minor units.
    #[must_use]
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / SCALE as u64;
        let fraction = abs % SCALE as u64;
        write!(f, "{sign}{units}.{fraction:0width$}", width = AMOUNT_DECIMALS)
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Amount> for i64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        self.0 += rhs.0;
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Self::Output {
        Amount(self.0 - rhs.0)
    }
}

impl FromStr for Amount {
    type Err = EngineError;

    /// Parses a decimal string into minor units.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
    /// Sign is kept: positivity is checked by the commands that need it.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || EngineError::Validation("empty amount".to_string());
        let invalid = || EngineError::Validation(format!("invalid amount: {s}"));
        let overflow = || EngineError::Validation("amount too large".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (true, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (false, stripped)
        } else {
            (false, trimmed)
        };
        if rest.is_empty() {
            return Err(empty());
        }

        let rest = rest.replace(',', ".");
        let mut parts = rest.split('.');
        let units_str = parts.next().ok_or_else(invalid)?;
        let fraction_str = parts.next();
        if parts.next().is_some() {
            return Err(invalid());
        }

        if units_str.is_empty() || !units_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let units: i64 = units_str.parse().map_err(|_| overflow())?;

        let fraction: i64 = match fraction_str {
            None | Some("") => 0,
            Some(frac) => {
                if !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                if frac.len() > AMOUNT_DECIMALS {
                    return Err(EngineError::Validation("too many decimals".to_string()));
                }
                let padded = format!("{frac:0<width$}", width = AMOUNT_DECIMALS);
                padded.parse().map_err(|_| invalid())?
            }
        };

        let total = units
            .checked_mul(SCALE)
            .and_then(|v| v.checked_add(fraction))
            .ok_or_else(overflow)?;

        Ok(Amount(if negative { -total } else { total }))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_always_has_eight_decimals() {
        assert_eq!(Amount::from_minor(0).to_string(), "0.00000000");
        assert_eq!(Amount::from_minor(1).to_string(), "0.00000001");
        assert_eq!(Amount::from_minor(9_500_000_000).to_string(), "95.00000000");
        assert_eq!(Amount::from_minor(-150_000_000).to_string(), "-1.50000000");
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!("100".parse::<Amount>().unwrap().minor(), 10_000_000_000);
        assert_eq!("95.00".parse::<Amount>().unwrap().minor(), 9_500_000_000);
        assert_eq!("0,5".parse::<Amount>().unwrap().minor(), 50_000_000);
        assert_eq!("  2.30 ".parse::<Amount>().unwrap().minor(), 230_000_000);
        assert_eq!("-0.00000001".parse::<Amount>().unwrap().minor(), -1);
        assert_eq!("1.".parse::<Amount>().unwrap().minor(), SCALE);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<Amount>().is_err());
        assert!("-".parse::<Amount>().is_err());
        assert!("1.2.3".parse::<Amount>().is_err());
        assert!("abc".parse::<Amount>().is_err());
        assert!(".5".parse::<Amount>().is_err());
        assert!("1.123456789".parse::<Amount>().is_err());
        assert!("99999999999999999999".parse::<Amount>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        let amount = Amount::from_minor(123_456_789_012);
        assert_eq!(amount.to_string().parse::<Amount>().unwrap(), amount);
    }
}
