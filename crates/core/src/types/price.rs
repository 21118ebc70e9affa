//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A catalogue price with currency information.
///
/// Amounts are in the currency's standard unit (dirhams, not fils) and
/// serialize as strings so JSON content files keep exact values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    #[serde(default)]
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

    /// Create a price in UAE dirhams.
    #[must_use]
    pub const fn aed(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::AED)
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency_code)
    }

    /// Format for display, e.g. `AED 1,250.00`.
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self.amount.round_dp(2);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let text = format!("{:.2}", rounded.abs());
        let (whole, fraction) = text.split_once('.').unwrap_or((&text, "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, c) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }

        let sign = if negative { "-" } else { "" };
        format!("{} {sign}{grouped}.{fraction}", self.currency_code.code())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes the business quotes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    AED,
    USD,
}

impl CurrencyCode {
    /// The ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::AED => "AED",
            Self::USD => "USD",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        let price = Price::aed(Decimal::new(125_000, 2));
        assert_eq!(price.display(), "AED 1,250.00");

        let price = Price::aed(Decimal::new(123_456_789, 1));
        assert_eq!(price.display(), "AED 12,345,678.90");
    }

    #[test]
    fn test_display_small_amounts() {
        assert_eq!(Price::aed(Decimal::new(5, 1)).display(), "AED 0.50");
        assert_eq!(Price::aed(Decimal::ZERO).display(), "AED 0.00");
        assert_eq!(Price::aed(Decimal::new(999, 0)).display(), "AED 999.00");
    }

    #[test]
    fn test_times() {
        let unit = Price::aed(Decimal::new(4_500, 2));
        assert_eq!(unit.times(3).amount, Decimal::new(13_500, 2));
        assert_eq!(unit.times(0).amount, Decimal::ZERO);
    }

    #[test]
    fn test_deserialize_from_string_amount() {
        let price: Price = serde_json::from_str(r#"{"amount": "150.00"}"#).unwrap();
        assert_eq!(price.amount, Decimal::new(15_000, 2));
        assert_eq!(price.currency_code, CurrencyCode::AED);
    }
}
