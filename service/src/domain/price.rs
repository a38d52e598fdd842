//! [`Price`] definitions.

use common::{Money, Percent};
use serde::{Deserialize, Serialize};

/// Price of a product, either flat or discounted from an original price.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Price {
    /// Regular price.
    #[serde(rename_all = "camelCase")]
    Flat {
        /// Price to pay.
        price: Money,
    },

    /// Price reduced from the original one.
    #[serde(rename_all = "camelCase")]
    Discounted {
        /// Price to pay.
        price: Money,

        /// Price before the discount.
        original_price: Money,

        /// Advertised discount.
        discount: Percent,
    },
}

impl Price {
    /// Creates a [`Price::Discounted`] by applying the `discount` to the
    /// `original_price` and rounding the result.
    ///
    /// [`None`] is returned if the `original_price` is negative.
    #[must_use]
    pub fn discounted(original_price: Money, discount: Percent) -> Option<Self>
    {
        if original_price.is_negative() {
            return None;
        }
        let price = original_price
            .checked_sub(original_price.checked_percent(discount)?)?
            .round();
        Some(Self::Discounted {
            price,
            original_price,
            discount,
        })
    }

    /// Returns the [`Money`] actually paid per unit.
    #[must_use]
    pub const fn effective(&self) -> Money {
        match self {
            Self::Flat { price } | Self::Discounted { price, .. } => *price,
        }
    }

    /// Returns the [`Money`] before any discount.
    #[must_use]
    pub const fn original(&self) -> Money {
        match self {
            Self::Flat { price }
            | Self::Discounted {
                original_price: price,
                ..
            } => *price,
        }
    }

    /// Returns the discount of this [`Price`], if any.
    #[must_use]
    pub const fn discount(&self) -> Option<Percent> {
        match self {
            Self::Flat { .. } => None,
            Self::Discounted { discount, .. } => Some(*discount),
        }
    }

    /// Checks whether this [`Price`] is consistent:
    /// - no amount is negative;
    /// - a discounted price doesn't exceed the original one and shares its
    ///   currency.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Flat { price } => !price.is_negative(),
            Self::Discounted {
                price,
                original_price,
                discount: _,
            } => {
                !price.is_negative()
                    && price.currency == original_price.currency
                    && price.amount <= original_price.amount
            }
        }
    }
}

#[cfg(test)]
mod spec {
    use common::{Currency, Money, Percent};

    use super::Price;

    fn usd(s: &str) -> Money {
        Money::new(s.parse().unwrap(), Currency::Usd)
    }

    #[test]
    fn applies_discount() {
        let price =
            Price::discounted(usd("19.99"), "25".parse::<Percent>().unwrap())
                .unwrap();

        assert_eq!(price.effective(), usd("14.99"));
        assert_eq!(price.original(), usd("19.99"));
        assert_eq!(price.discount(), Some("25".parse().unwrap()));
        assert!(price.is_valid());
    }

    #[test]
    fn flat_price_has_no_discount() {
        let price = Price::Flat {
            price: usd("4.99"),
        };

        assert_eq!(price.effective(), price.original());
        assert_eq!(price.discount(), None);
        assert!(price.is_valid());
    }

    #[test]
    fn detects_inconsistent_prices() {
        assert!(!Price::Flat {
            price: usd("-1.00"),
        }
        .is_valid());
        assert!(!Price::Discounted {
            price: usd("12.00"),
            original_price: usd("10.00"),
            discount: "10".parse().unwrap(),
        }
        .is_valid());
        assert!(!Price::Discounted {
            price: usd("9.00"),
            original_price: Money::new(
                "10.00".parse().unwrap(),
                Currency::Eur,
            ),
            discount: "10".parse().unwrap(),
        }
        .is_valid());
    }
}
