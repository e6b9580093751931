//! Fixed-precision money arithmetic.
//!
//! All amounts are represented in nanounits (scale 9, matching the
//! underlying chain's smallest unit) as a signed 128-bit integer.
//! Floating point is never used for money internally; the only place a
//! fractional percentage enters is as basis points (hundredths of a
//! percent) so `subtract_fee` stays exact integer arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// 10^9 — nanounits per whole unit.
pub const NANO_SCALE: i128 = 1_000_000_000;

/// A money amount in nanounits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(i128);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Construct directly from a nanounit amount.
    pub fn from_nano(nano: i128) -> Self {
        Self(nano)
    }

    /// The raw nanounit amount.
    pub fn to_nano(self) -> i128 {
        self.0
    }

    /// Parse a decimal string (e.g. `"50.0"`) into nanounits. Accepts an
    /// optional sign and up to 9 fractional digits; extra precision is
    /// rejected rather than silently truncated.
    pub fn from_decimal_str(s: &str) -> Result<Self, MoneyParseError> {
        let s = s.trim();
        let (sign, body) = match s.strip_prefix('-') {
            Some(rest) => (-1i128, rest),
            None => (1i128, s.strip_prefix('+').unwrap_or(s)),
        };
        let mut parts = body.splitn(2, '.');
        let whole = parts.next().unwrap_or("");
        let frac = parts.next().unwrap_or("");
        if whole.is_empty() && frac.is_empty() {
            return Err(MoneyParseError::Empty);
        }
        if frac.len() > 9 {
            return Err(MoneyParseError::TooManyFractionalDigits);
        }
        let whole_val: i128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| MoneyParseError::NotADecimal)?
        };
        let mut frac_digits = frac.to_string();
        while frac_digits.len() < 9 {
            frac_digits.push('0');
        }
        let frac_val: i128 = if frac_digits.is_empty() {
            0
        } else {
            frac_digits
                .parse()
                .map_err(|_| MoneyParseError::NotADecimal)?
        };
        Ok(Money(sign * (whole_val * NANO_SCALE + frac_val)))
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn add(self, other: Money) -> Money {
        Money(self.0 + other.0)
    }

    pub fn sub(self, other: Money) -> Money {
        Money(self.0 - other.0)
    }

    /// Multiply by a percentage expressed in basis points (1/100 of a
    /// percent — 10_000 bps = 100%), rounding half-even at the nanounit
    /// scale.
    pub fn mul_percent_bps(self, percent_bps: u32) -> Money {
        Money(half_even_div(
            self.0 * percent_bps as i128,
            10_000,
        ))
    }

    /// Split `self` into `(fee, payout)` where `fee = self * percent_bps /
    /// 10_000` (half-even rounded) and `payout = self - fee`.
    pub fn subtract_fee(self, percent_bps: u32) -> (Money, Money) {
        let fee = self.mul_percent_bps(percent_bps);
        let payout = self.sub(fee);
        (fee, payout)
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money::add(self, rhs)
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money::sub(self, rhs)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / NANO_SCALE as u128;
        let frac = abs % NANO_SCALE as u128;
        write!(f, "{sign}{whole}.{frac:09}")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MoneyParseError {
    #[error("empty money string")]
    Empty,
    #[error("not a decimal number")]
    NotADecimal,
    #[error("at most 9 fractional digits are supported")]
    TooManyFractionalDigits,
}

/// Half-even (banker's) rounding division: `numerator / denominator`,
/// rounding ties to the nearest even result. `denominator` must be positive.
fn half_even_div(numerator: i128, denominator: i128) -> i128 {
    debug_assert!(denominator > 0);
    let quotient = numerator.div_euclid(denominator);
    let remainder = numerator.rem_euclid(denominator);
    let twice = remainder * 2;
    if twice < denominator {
        quotient
    } else if twice > denominator {
        quotient + 1
    } else if quotient % 2 == 0 {
        quotient
    } else {
        quotient + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_strings() {
        assert_eq!(Money::from_decimal_str("50.0").unwrap().to_nano(), 50 * NANO_SCALE);
        assert_eq!(Money::from_decimal_str("0.000000001").unwrap().to_nano(), 1);
        assert_eq!(Money::from_decimal_str("-2.5").unwrap().to_nano(), -2_500_000_000);
    }

    #[test]
    fn rejects_excess_precision() {
        assert!(Money::from_decimal_str("1.0000000001").is_err());
    }

    #[test]
    fn displays_back_as_decimal() {
        let m = Money::from_decimal_str("47.5").unwrap();
        assert_eq!(m.to_string(), "47.500000000");
    }

    #[test]
    fn subtract_fee_splits_exactly() {
        let amount = Money::from_decimal_str("50.0").unwrap();
        let (fee, payout) = amount.subtract_fee(500); // 5%
        assert_eq!(fee.to_string(), "2.500000000");
        assert_eq!(payout.to_string(), "47.500000000");
        assert_eq!(fee.add(payout), amount);
    }

    #[test]
    fn half_even_rounds_ties_to_even() {
        // 25 / 10 with a tie at .5 → banker's rounding to nearest even.
        assert_eq!(half_even_div(25, 10), 2);
        assert_eq!(half_even_div(15, 10), 2);
        assert_eq!(half_even_div(5, 10), 0);
    }

    #[test]
    fn add_is_inverse_of_sub() {
        let a = Money::from_decimal_str("10.5").unwrap();
        let b = Money::from_decimal_str("3.25").unwrap();
        assert_eq!(a.add(b).sub(b), a);
    }
}
