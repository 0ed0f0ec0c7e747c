//! Decimal money amounts.
//!
//! The business only sells in Indian rupees. Amounts are stored and returned
//! in whole rupees with two decimal places; the payment gateway wants the
//! minor unit (paise), which [`Money::to_minor_units`] produces.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// ISO 4217 currency codes accepted by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    INR,
}

impl Currency {
    /// The three-letter code sent to the payment gateway.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::INR => "INR",
        }
    }

    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::INR => "₹",
        }
    }

    /// Number of minor units per major unit.
    #[must_use]
    pub const fn minor_units_per_major(self) -> i64 {
        match self {
            Self::INR => 100,
        }
    }
}

/// Errors converting a [`Money`] amount to gateway minor units.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount must be greater than zero")]
    NotPositive,
    #[error("amount is too large")]
    Overflow,
}

/// An amount of money in a given currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the currency's standard unit (rupees, not paise).
    pub amount: Decimal,
    pub currency: Currency,
}

impl Money {
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Shorthand for an INR amount.
    #[must_use]
    pub const fn inr(amount: Decimal) -> Self {
        Self::new(amount, Currency::INR)
    }

    /// Convert to the gateway's integer minor unit, rounding half away from
    /// zero (`499.995` → `50000`).
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::NotPositive`] for zero or negative amounts and
    /// [`MoneyError::Overflow`] if the result does not fit in an `i64`.
    pub fn to_minor_units(&self) -> Result<i64, MoneyError> {
        if self.amount <= Decimal::ZERO {
            return Err(MoneyError::NotPositive);
        }
        let scaled = self
            .amount
            .checked_mul(Decimal::from(self.currency.minor_units_per_major()))
            .ok_or(MoneyError::Overflow)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        scaled.to_i64().ok_or(MoneyError::Overflow)
    }

    /// Format for display, e.g. `₹1499.00`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency.symbol(), self.amount)
    }
}
