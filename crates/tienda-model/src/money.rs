use crate::fields::{Quantity, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Amount in integer cents. On the wire it is a decimal number with two places.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Money(i64);

impl Money {
    pub const ZERO: Self = Self(0);
    /// Highest price a product or sale line may carry: 1,000,000.00.
    pub const MAX_UNIT_PRICE: Self = Self(100_000_000);

    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn from_decimal(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError("amount must be a finite number".to_string()));
        }
        let cents = (value * 100.0).round();
        if cents.abs() > i64::MAX as f64 / 2.0 {
            return Err(ValidationError("amount is out of range".to_string()));
        }
        Ok(Self(cents as i64))
    }

    #[must_use]
    pub fn as_decimal(self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Parses a price charged per unit: positive and at most
    /// [`Money::MAX_UNIT_PRICE`].
    pub fn unit_price(value: f64) -> Result<Self, ValidationError> {
        let price = Self::from_decimal(value)?;
        if !price.is_positive() {
            return Err(ValidationError("price must be greater than 0".to_string()));
        }
        if price > Self::MAX_UNIT_PRICE {
            return Err(ValidationError(format!(
                "price must not exceed {}",
                Self::MAX_UNIT_PRICE
            )));
        }
        Ok(price)
    }

    #[must_use]
    pub fn checked_mul(self, quantity: Quantity) -> Option<Self> {
        self.0.checked_mul(i64::from(quantity.get())).map(Self)
    }

    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Sums amounts, `None` on overflow.
    pub fn sum<I: IntoIterator<Item = Self>>(items: I) -> Option<Self> {
        items
            .into_iter()
            .try_fold(Self::ZERO, |acc, m| acc.checked_add(m))
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl TryFrom<f64> for Money {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::from_decimal(value)
    }
}

impl From<Money> for f64 {
    fn from(value: Money) -> Self {
        value.as_decimal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_input_rounds_to_cents() {
        assert_eq!(Money::from_decimal(19.99).expect("money").cents(), 1999);
        assert_eq!(Money::from_decimal(0.125).expect("money").cents(), 13);
        assert!(Money::from_decimal(f64::NAN).is_err());
    }

    #[test]
    fn unit_prices_are_positive_and_bounded() {
        assert_eq!(Money::unit_price(349.5).expect("price").cents(), 34_950);
        assert_eq!(
            Money::unit_price(1_000_000.0).expect("price"),
            Money::MAX_UNIT_PRICE
        );
        assert!(Money::unit_price(0.0).is_err());
        assert!(Money::unit_price(-1.0).is_err());
        let err = Money::unit_price(1_000_000.01).expect_err("too expensive");
        assert_eq!(err.0, "price must not exceed 1000000.00");
        assert!(Money::unit_price(1e17).is_err());
    }

    #[test]
    fn display_uses_two_decimal_places() {
        assert_eq!(Money::from_cents(1205).to_string(), "12.05");
        assert_eq!(Money::from_cents(-7).to_string(), "-0.07");
    }

    #[test]
    fn line_totals_multiply_and_sum() {
        let q = Quantity::new(3).expect("qty");
        let line = Money::from_cents(250).checked_mul(q).expect("line");
        assert_eq!(line.cents(), 750);
        let total = Money::sum([line, Money::from_cents(50)]).expect("sum");
        assert_eq!(total.cents(), 800);
        assert!(Money::sum([Money::from_cents(i64::MAX), Money::from_cents(1)]).is_none());
    }
}
