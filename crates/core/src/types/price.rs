//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A catalog price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (euros, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A whole-euro price, as the catalog lists them.
    #[must_use]
    pub fn eur(euros: i64) -> Self {
        Self::new(Decimal::from(euros), CurrencyCode::EUR)
    }

    /// Zero euros; used for bottles identified outside the catalog.
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(Decimal::ZERO, CurrencyCode::EUR)
    }

    /// Whether the price carries no amount.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:.2}",
            self.currency_code.symbol(),
            self.amount.round_dp(2)
        )
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    EUR,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::EUR => "€",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_eur() {
        assert_eq!(Price::eur(120).to_string(), "€120.00");
        assert_eq!(Price::zero().to_string(), "€0.00");
    }

    #[test]
    fn test_zero() {
        assert!(Price::zero().is_zero());
        assert!(!Price::eur(105).is_zero());
    }
}
