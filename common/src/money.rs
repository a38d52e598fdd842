//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

use rust_decimal::{Decimal, RoundingStrategy};

use crate::{define_kind, Percent};

/// Amount of money in some [`Currency`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(rename_all = "camelCase")
)]
pub struct Money {
    /// Amount of this [`Money`].
    pub amount: Decimal,

    /// [`Currency`] of this amount.
    pub currency: Currency,
}

impl Money {
    /// Number of decimal places money is rounded to.
    pub const SCALE: u32 = 2;

    /// Creates a new [`Money`] amount in the given [`Currency`].
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Creates a zero [`Money`] amount in the given [`Currency`].
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    /// Indicates whether this [`Money`] amount is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Rounds this [`Money`] to [`Money::SCALE`] decimal places, with
    /// midpoints rounded away from zero.
    #[must_use]
    pub fn round(self) -> Self {
        Self {
            amount: self.amount.round_dp_with_strategy(
                Self::SCALE,
                RoundingStrategy::MidpointAwayFromZero,
            ),
            ..self
        }
    }

    /// Returns the given [`Percent`] of this [`Money`], not rounded.
    ///
    /// [`None`] is returned on overflow.
    #[must_use]
    pub fn checked_percent(self, percent: Percent) -> Option<Self> {
        percent
            .checked_of(self.amount)
            .map(|amount| Self { amount, ..self })
    }

    /// Adds the `other` amount to this one.
    ///
    /// [`None`] is returned if the currencies differ or on overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        (self.currency == other.currency)
            .then(|| self.amount.checked_add(other.amount))
            .flatten()
            .map(|amount| Self { amount, ..self })
    }

    /// Subtracts the `other` amount from this one.
    ///
    /// [`None`] is returned if the currencies differ or on overflow.
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        (self.currency == other.currency)
            .then(|| self.amount.checked_sub(other.amount))
            .flatten()
            .map(|amount| Self { amount, ..self })
    }

    /// Multiplies this amount by the given `quantity`.
    ///
    /// [`None`] is returned on overflow.
    #[must_use]
    pub fn checked_mul(self, quantity: u32) -> Option<Self> {
        self.amount
            .checked_mul(Decimal::from(quantity))
            .map(|amount| Self { amount, ..self })
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        write!(f, "{:.2}{currency}", amount.normalize())
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 4 || !s.is_char_boundary(s.len() - 3) {
            return Err("too short");
        }

        let (amount, currency) = s.split_at(s.len() - 3);
        let amount = Decimal::from_str(amount).map_err(|_| "invalid amount")?;
        let currency =
            Currency::from_str(currency).map_err(|_| "invalid currency")?;

        Ok(Self { amount, currency })
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    enum Currency {
        #[doc = "US Dollar."]
        Usd = 1,

        #[doc = "Euro."]
        Eur = 2,

        #[doc = "Pound Sterling."]
        Gbp = 3,
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::Usd
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use crate::Percent;

    use super::{Currency, Money};

    fn usd(s: &str) -> Money {
        Money::new(s.parse().unwrap(), Currency::Usd)
    }

    #[test]
    fn from_str() {
        assert_eq!(Money::from_str("123.45USD").unwrap(), usd("123.45"));
        assert_eq!(
            Money::from_str("9.99EUR").unwrap(),
            Money::new(Decimal::new(999, 2), Currency::Eur),
        );
        assert_eq!(
            Money::from_str("10GBP").unwrap(),
            Money::new(Decimal::TEN, Currency::Gbp),
        );

        assert!(Money::from_str("123.45").is_err());
        assert!(Money::from_str("123.45Us").is_err());
        assert!(Money::from_str("123.45Usdollar").is_err());
        assert!(Money::from_str("USD").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(usd("123.45").to_string(), "123.45USD");
        assert_eq!(usd("123").to_string(), "123.00USD");
        assert_eq!(usd("9.9").to_string(), "9.90USD");
        assert_eq!(usd("0").to_string(), "0.00USD");
    }

    #[test]
    fn rounds_midpoint_away_from_zero() {
        assert_eq!(usd("0.125").round(), usd("0.13"));
        assert_eq!(usd("0.124").round(), usd("0.12"));
        assert_eq!(usd("3.9992").round(), usd("4.00"));
    }

    #[test]
    fn takes_percent() {
        let rate = Percent::new(Decimal::from(8)).unwrap();

        assert_eq!(usd("100.00").checked_percent(rate), Some(usd("8")));
        assert_eq!(
            usd("12.34").checked_percent(rate).map(Money::round),
            Some(usd("0.99")),
        );
        assert_eq!(
            usd("50000000000000000000000000000").checked_percent(rate),
            None,
        );
    }

    #[test]
    fn refuses_mixing_currencies() {
        let eur = Money::new(Decimal::ONE, Currency::Eur);

        assert_eq!(usd("1").checked_add(eur), None);
        assert_eq!(usd("1").checked_sub(eur), None);
        assert_eq!(usd("1").checked_add(usd("2.5")), Some(usd("3.5")));
    }

    #[test]
    fn multiplies_by_quantity() {
        assert_eq!(usd("4.99").checked_mul(3), Some(usd("14.97")));
        assert_eq!(usd("4.99").checked_mul(0), Some(usd("0")));
    }

    #[test]
    fn detects_negative_amounts() {
        assert!(usd("-0.01").is_negative());
        assert!(!usd("0").is_negative());
        assert!(!usd("-0").is_negative());
    }
}
