//! Monetary amounts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};
use thiserror::Error;

use crate::currency::Currency;

/// A monetary amount with currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount value (high precision decimal).
    pub value: Decimal,
    /// ISO 4217 currency code.
    pub currency: Currency,
}

impl Money {
    /// Create a new Money instance.
    pub fn new(value: Decimal, currency: Currency) -> Self {
        Self { value, currency }
    }

    /// Create from a string value.
    pub fn from_str(value: &str, currency: Currency) -> Result<Self, rust_decimal::Error> {
        Ok(Self {
            value: value.parse()?,
            currency,
        })
    }

    /// Create a zero amount in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self {
            value: Decimal::ZERO,
            currency,
        }
    }

    /// Check if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.value > Decimal::ZERO
    }

    /// Check if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Check if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.value < Decimal::ZERO
    }

    /// Get the absolute value.
    pub fn abs(&self) -> Self {
        Self {
            value: self.value.abs(),
            currency: self.currency.clone(),
        }
    }

    /// Round to the currency's standard decimal places.
    pub fn round(&self) -> Self {
        let places = self.currency.decimal_places();
        Self {
            value: self.value.round_dp(places),
            currency: self.currency.clone(),
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.currency)
    }
}

impl Add for Money {
    type Output = Result<Money, CurrencyMismatchError>;

    fn add(self, other: Money) -> Self::Output {
        if self.currency != other.currency {
            return Err(CurrencyMismatchError {
                expected: self.currency,
                actual: other.currency,
            });
        }
        Ok(Money {
            value: self.value + other.value,
            currency: self.currency,
        })
    }
}

impl Sub for Money {
    type Output = Result<Money, CurrencyMismatchError>;

    fn sub(self, other: Money) -> Self::Output {
        if self.currency != other.currency {
            return Err(CurrencyMismatchError {
                expected: self.currency,
                actual: other.currency,
            });
        }
        Ok(Money {
            value: self.value - other.value,
            currency: self.currency,
        })
    }
}

impl Mul<Decimal> for Money {
    type Output = Money;

    fn mul(self, rate: Decimal) -> Self::Output {
        Money {
            value: self.value * rate,
            currency: self.currency,
        }
    }
}

/// Error when attempting operations on different currencies.
#[derive(Debug, Clone, Error)]
#[error("Currency mismatch: expected {expected}, got {actual}")]
pub struct CurrencyMismatchError {
    pub expected: Currency,
    pub actual: Currency,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_operations() {
        let m1 = Money::from_str("100.00", Currency::usd()).unwrap();
        let m2 = Money::from_str("50.00", Currency::usd()).unwrap();

        let sum = (m1.clone() + m2.clone()).unwrap();
        assert_eq!(sum.value, Decimal::from(150));

        let diff = (m1 - m2).unwrap();
        assert_eq!(diff.value, Decimal::from(50));
    }

    #[test]
    fn test_currency_mismatch() {
        let m1 = Money::from_str("100.00", Currency::usd()).unwrap();
        let m2 = Money::from_str("100.00", Currency::eur()).unwrap();

        assert!((m1 + m2).is_err());
    }

    #[test]
    fn test_round_to_currency_places() {
        let usd = Money::from_str("12.3456", Currency::usd()).unwrap().round();
        assert_eq!(usd.value, Decimal::from_str_exact("12.35").unwrap());

        let jpy = Money::from_str("12.6", Currency::jpy()).unwrap().round();
        assert_eq!(jpy.value, Decimal::from(13));
    }

    #[test]
    fn test_mul_by_rate() {
        let m = Money::from_str("100.00", Currency::usd()).unwrap();
        let out = m * Decimal::from(4);
        assert_eq!(out.value, Decimal::from(400));
        assert_eq!(out.currency, Currency::usd());
    }
}
