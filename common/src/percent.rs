//! [`Percent`]-related definitions.

use std::str::FromStr;

use derive_more::Display;
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;

/// Percentage in the `0..=100` range.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Decimal", into = "Decimal")
)]
pub struct Percent(Decimal);

impl Percent {
    /// Creates a new [`Percent`] by checking the provided value is within the
    /// `0..=100` range.
    #[must_use]
    pub fn new(val: Decimal) -> Option<Self> {
        (Decimal::ZERO..=Decimal::ONE_HUNDRED)
            .contains(&val)
            .then_some(Self(val))
    }

    /// Returns the value of this [`Percent`] (`8` for `8%`).
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }

    /// Returns this [`Percent`] of the provided `amount`.
    ///
    /// [`None`] is returned on overflow.
    #[must_use]
    pub fn checked_of(self, amount: Decimal) -> Option<Decimal> {
        amount
            .checked_mul(self.0)?
            .checked_div(Decimal::ONE_HUNDRED)
    }
}

impl From<Percent> for Decimal {
    fn from(percent: Percent) -> Self {
        percent.0
    }
}

impl TryFrom<Decimal> for Percent {
    type Error = &'static str;

    fn try_from(val: Decimal) -> Result<Self, Self::Error> {
        Self::new(val).ok_or("percent must be within `0..=100`")
    }
}

impl FromStr for Percent {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s)
            .map_err(|_| "invalid percent value")
            .and_then(Self::try_from)
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::Percent;

    #[test]
    fn checks_range() {
        assert!(Percent::from_str("0").is_ok());
        assert!(Percent::from_str("8").is_ok());
        assert!(Percent::from_str("100").is_ok());
        assert!(Percent::from_str("100.01").is_err());
        assert!(Percent::from_str("-1").is_err());
        assert!(Percent::from_str("eight").is_err());
    }

    #[test]
    fn applies_to_amount() {
        let p = Percent::from_str("8").unwrap();

        assert_eq!(
            p.checked_of(Decimal::ONE_HUNDRED),
            Some(Decimal::from(8)),
        );
        assert_eq!(p.checked_of(Decimal::ZERO), Some(Decimal::ZERO));
    }

    #[test]
    fn detects_overflow() {
        let p = Percent::from_str("8").unwrap();

        assert_eq!(p.checked_of(Decimal::MAX), None);
        assert_eq!(
            Percent::from_str("0").unwrap().checked_of(Decimal::MAX),
            Some(Decimal::ZERO),
        );
    }
}
