//! Money type with decimal precision and currency.
//!
//! Never use floating-point for fee calculations. Amounts are held as
//! `rust_decimal::Decimal` and persisted as integer paise.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Represents a monetary amount with currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount in major units (rupees), two decimal places.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: Currency,
}

/// ISO 4217 currency codes accepted by the payment gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Indian Rupee
    #[default]
    Inr,
}

impl Money {
    /// Creates a new Money instance.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Creates an INR amount from whole rupees.
    #[must_use]
    pub fn rupees(rupees: i64) -> Self {
        Self::new(Decimal::from(rupees), Currency::Inr)
    }

    /// Creates an amount from minor units (paise).
    #[must_use]
    pub fn from_minor_units(minor: i64, currency: Currency) -> Self {
        Self::new(Decimal::new(minor, 2), currency)
    }

    /// Returns the amount in minor units (paise), or `None` if it does not fit.
    #[must_use]
    pub fn to_minor_units(&self) -> Option<i64> {
        (self.amount * Decimal::ONE_HUNDRED).round().to_i64()
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative()
    }

    /// Formats the amount with exactly two decimals, e.g. `1500.00`.
    #[must_use]
    pub fn format_amount(&self) -> String {
        format!("{:.2}", self.amount.round_dp(2))
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.currency, self.format_amount())
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inr => write!(f, "INR"),
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "INR" => Ok(Self::Inr),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn test_money_from_minor_units() {
        let money = Money::from_minor_units(150_050, Currency::Inr);
        assert_eq!(money.amount, dec!(1500.50));
        assert_eq!(money.to_minor_units(), Some(150_050));
    }

    #[test]
    fn test_money_rupees() {
        let money = Money::rupees(2500);
        assert_eq!(money.to_minor_units(), Some(250_000));
        assert_eq!(money.format_amount(), "2500.00");
        assert_eq!(money.to_string(), "INR 2500.00");
    }

    #[test]
    fn test_money_is_zero_and_negative() {
        assert!(Money::rupees(0).is_zero());
        assert!(!Money::rupees(10).is_zero());
        assert!(Money::new(dec!(-1), Currency::Inr).is_negative());
        assert!(!Money::rupees(0).is_negative());
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!(Currency::from_str("INR").unwrap(), Currency::Inr);
        assert_eq!(Currency::from_str("inr").unwrap(), Currency::Inr);
        assert!(Currency::from_str("USD").is_err());
        assert!(Currency::from_str("").is_err());
    }
}
