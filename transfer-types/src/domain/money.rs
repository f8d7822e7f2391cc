//! Money domain model with exact decimal arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ParseValueError;

/// Supported currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    USD,
    EUR,
    GBP,
    COP,
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::COP => "COP",
        };
        write!(f, "{}", code)
    }
}

impl std::str::FromStr for Currency {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            "GBP" => Ok(Currency::GBP),
            "COP" => Ok(Currency::COP),
            _ => Err(ParseValueError::new("currency", s)),
        }
    }
}

/// A monetary value with its currency.
///
/// Amounts are exact decimals and may be negative: money leaving the wallet
/// is represented with a negative amount, money entering it with a positive
/// one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Creates a monetary value.
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Returns the decimal amount.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns `|amount| * rate` in the same currency.
    ///
    /// Used to compute the processing fee charged on a transfer. The
    /// multiplication is exact, no rounding is applied.
    pub fn fraction_of(&self, rate: Decimal) -> Money {
        Money::new(self.amount.abs() * rate, self.currency)
    }

    /// Returns `|amount| - deduction` in the same currency.
    ///
    /// Used to net a fee out of the requested amount regardless of the sign
    /// the amount was recorded with.
    pub fn deduct(&self, deduction: Decimal) -> Money {
        Money::new(self.amount.abs() - deduction, self.currency)
    }

    /// Returns the same amount with the opposite sign.
    pub fn negate(&self) -> Money {
        Money::new(-self.amount, self.currency)
    }

    /// Compares amounts only when the currencies match.
    ///
    /// Returns `false` for differing currencies rather than guessing at an
    /// exchange rate.
    pub fn is_same_currency_and_gte(&self, other: &Money) -> bool {
        self.currency == other.currency && self.amount >= other.amount
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fraction_of_is_exact() {
        let amount = Money::new(dec!(1000), Currency::USD);
        let fee = amount.fraction_of(dec!(0.10));
        assert_eq!(fee.amount(), dec!(100.00));
        assert_eq!(fee.currency(), Currency::USD);
    }

    #[test]
    fn test_fraction_of_uses_absolute_amount() {
        let amount = Money::new(dec!(-1000), Currency::USD);
        let fee = amount.fraction_of(dec!(0.10));
        assert_eq!(fee.amount(), dec!(100.00));
    }

    #[test]
    fn test_deduct_nets_out_of_absolute_amount() {
        let amount = Money::new(dec!(-1000), Currency::USD);
        let net = amount.deduct(dec!(100));
        assert_eq!(net.amount(), dec!(900));
    }

    #[test]
    fn test_negate_flips_sign() {
        let amount = Money::new(dec!(-1000), Currency::USD);
        assert_eq!(amount.negate().amount(), dec!(1000));
        assert_eq!(amount.negate().negate(), amount);
    }

    #[test]
    fn test_gte_same_currency() {
        let balance = Money::new(dec!(2500), Currency::USD);
        let requested = Money::new(dec!(1000), Currency::USD);
        assert!(balance.is_same_currency_and_gte(&requested));
        assert!(requested.is_same_currency_and_gte(&requested));
        assert!(!requested.is_same_currency_and_gte(&balance));
    }

    #[test]
    fn test_gte_rejects_currency_mismatch() {
        let balance = Money::new(dec!(2500), Currency::USD);
        let requested = Money::new(dec!(1000), Currency::EUR);
        assert!(!balance.is_same_currency_and_gte(&requested));
    }

    #[test]
    fn test_currency_round_trip() {
        let parsed: Currency = "usd".parse().unwrap();
        assert_eq!(parsed, Currency::USD);
        assert_eq!(Currency::COP.to_string(), "COP");
        assert!("XXX".parse::<Currency>().is_err());
    }

    #[test]
    fn test_display() {
        let money = Money::new(dec!(-900.50), Currency::USD);
        assert_eq!(money.to_string(), "-900.50 USD");
    }
}
