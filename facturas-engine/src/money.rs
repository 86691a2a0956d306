//! Currency-aware monetary arithmetic and formatting.
//!
//! Amounts are `rust_decimal::Decimal`. All tolerance comparisons use a
//! fixed epsilon of 1e-6 currency units; nothing here ever coerces one
//! currency into another.

use facturas_core::AppError;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance for monetary comparisons, in currency units.
pub static MONEY_EPSILON: Lazy<Decimal> = Lazy::new(|| Decimal::new(1, 6));

/// Supported invoice currencies. Documents persisted without a currency
/// deserialize as DOP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    #[serde(rename = "DOP")]
    Dop,
    #[serde(rename = "USD")]
    Usd,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Dop => "DOP",
            Currency::Usd => "USD",
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Currency::Dop => "RD$",
            Currency::Usd => "US$",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An amount tagged with its currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Money {
    pub amount: Decimal,
    pub currency: Currency,
}

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.amount.abs() <= *MONEY_EPSILON
    }

    /// Add an amount of the same currency.
    pub fn checked_add(self, other: Money) -> Result<Money, AppError> {
        self.require_same_currency(other)?;
        Ok(Money::new(self.amount + other.amount, self.currency))
    }

    /// Subtract an amount of the same currency.
    pub fn checked_sub(self, other: Money) -> Result<Money, AppError> {
        self.require_same_currency(other)?;
        Ok(Money::new(self.amount - other.amount, self.currency))
    }

    fn require_same_currency(&self, other: Money) -> Result<(), AppError> {
        if self.currency != other.currency {
            return Err(AppError::CurrencyMismatch {
                context: "money arithmetic".to_string(),
                expected: self.currency.as_str().to_string(),
                actual: other.currency.as_str().to_string(),
            });
        }
        Ok(())
    }

    /// Render as a localized string with exactly two fraction digits,
    /// e.g. `RD$1,234.56`.
    pub fn format(&self) -> String {
        let rounded = self.amount.round_dp(2);
        let negative = rounded.is_sign_negative();
        let abs = rounded.abs();

        let as_text = format!("{:.2}", abs);
        let (whole, frac) = as_text
            .split_once('.')
            .unwrap_or((as_text.as_str(), "00"));

        let mut grouped = String::new();
        let digits = whole.as_bytes();
        for (i, digit) in digits.iter().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(*digit as char);
        }

        let sign = if negative { "-" } else { "" };
        format!("{}{}{}.{}", sign, self.currency.symbol(), grouped, frac)
    }
}

/// Compare two amounts of the same currency within the money epsilon.
pub fn approx_eq(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= *MONEY_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn format_renders_two_fraction_digits_with_separators() {
        assert_eq!(Money::new(dec("1234.5"), Currency::Dop).format(), "RD$1,234.50");
        assert_eq!(Money::new(dec("0"), Currency::Usd).format(), "US$0.00");
        assert_eq!(
            Money::new(dec("1000000.999"), Currency::Dop).format(),
            "RD$1,000,001.00"
        );
        assert_eq!(Money::new(dec("-45.5"), Currency::Usd).format(), "-US$45.50");
    }

    #[test]
    fn add_requires_matching_currency() {
        let dop = Money::new(dec("100"), Currency::Dop);
        let usd = Money::new(dec("50"), Currency::Usd);

        assert!(matches!(
            dop.checked_add(usd),
            Err(AppError::CurrencyMismatch { .. })
        ));

        let sum = dop.checked_add(Money::new(dec("25.25"), Currency::Dop)).unwrap();
        assert_eq!(sum.amount, dec("125.25"));
    }

    #[test]
    fn subtract_requires_matching_currency() {
        let dop = Money::new(dec("100"), Currency::Dop);
        assert!(matches!(
            dop.checked_sub(Money::new(dec("1"), Currency::Usd)),
            Err(AppError::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn epsilon_absorbs_drift() {
        assert!(approx_eq(dec("10.0000001"), dec("10.0000005")));
        assert!(!approx_eq(dec("10.01"), dec("10.02")));
        assert!(Money::new(dec("0.0000004"), Currency::Dop).is_zero());
        assert!(Money::zero(Currency::Usd).is_zero());
    }
}
