//! Pricing of [`LineItem`]s into an order [`Summary`].

use common::{Currency, Money, Percent};
use derive_more::{Display, Error as StdError};
use rust_decimal::Decimal;
use smart_default::SmartDefault;

use super::{LineItem, Summary};

/// Pricing constants applied to every cart and order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, SmartDefault)]
pub struct Policy {
    /// Subtotal which must be exceeded for shipping to be free.
    #[default(Money::new(Decimal::new(50_00, 2), Currency::Usd))]
    pub free_shipping_threshold: Money,

    /// Shipping fee charged when the subtotal doesn't exceed the
    /// [`Policy::free_shipping_threshold`].
    #[default(Money::new(Decimal::new(9_99, 2), Currency::Usd))]
    pub flat_shipping_fee: Money,

    /// Tax rate applied to the subtotal.
    #[default(Percent::new(Decimal::from(8)).expect("valid percent"))]
    pub tax_rate: Percent,
}

impl Policy {
    /// Returns the [`Currency`] all amounts are priced in.
    #[must_use]
    pub const fn currency(&self) -> Currency {
        self.flat_shipping_fee.currency
    }

    /// Computes the [`Summary`] of the provided `items`.
    ///
    /// Shipping is free only if the subtotal is strictly greater than the
    /// [`Policy::free_shipping_threshold`]. Tax is rounded to cents, the
    /// subtotal is not rounded at all.
    ///
    /// # Errors
    ///
    /// If any of the `items` is malformed, or the amounts overflow.
    pub fn compute(&self, items: &[LineItem]) -> Result<Summary, Error> {
        let currency = self.currency();

        let mut subtotal = Money::zero(currency);
        let mut item_count = 0_u64;
        for (index, item) in items.iter().enumerate() {
            self.check(index, item)?;

            subtotal = item
                .price
                .effective()
                .checked_mul(item.quantity)
                .and_then(|line| subtotal.checked_add(line))
                .ok_or(Error::Overflow)?;
            item_count += u64::from(item.quantity);
        }

        let shipping = if subtotal.amount > self.free_shipping_threshold.amount
        {
            Money::zero(currency)
        } else {
            self.flat_shipping_fee
        };
        let tax = subtotal
            .checked_percent(self.tax_rate)
            .ok_or(Error::Overflow)?
            .round();
        let total = subtotal
            .checked_add(shipping)
            .and_then(|t| t.checked_add(tax))
            .ok_or(Error::Overflow)?;

        Ok(Summary {
            subtotal,
            shipping,
            tax,
            total,
            item_count,
        })
    }

    /// Checks that the `item` at the `index` is well-formed.
    fn check(&self, index: usize, item: &LineItem) -> Result<(), Error> {
        if item.quantity == 0 {
            return Err(Error::ZeroQuantity { index });
        }
        if item.price.effective().currency != self.currency()
            || item.price.original().currency != self.currency()
        {
            return Err(Error::CurrencyMismatch { index });
        }
        if !item.price.is_valid() {
            return Err(Error::InvalidPrice { index });
        }
        Ok(())
    }
}

/// Error of computing a [`Summary`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, StdError)]
pub enum Error {
    /// [`LineItem`] has zero quantity.
    #[display("Line item #{index} has zero quantity")]
    ZeroQuantity {
        /// Position of the malformed [`LineItem`].
        index: usize,
    },

    /// [`LineItem`] has a negative or inconsistent price.
    #[display("Line item #{index} has invalid price")]
    InvalidPrice {
        /// Position of the malformed [`LineItem`].
        index: usize,
    },

    /// [`LineItem`] is priced in a foreign currency.
    #[display("Line item #{index} is priced in a foreign currency")]
    CurrencyMismatch {
        /// Position of the malformed [`LineItem`].
        index: usize,
    },

    /// Amounts are too large to be represented.
    #[display("Amount overflow")]
    Overflow,
}

#[cfg(test)]
mod spec {
    use common::{Currency, Money};

    use crate::domain::{order::LineItem, product, Price};

    use super::{Error, Policy};

    fn usd(s: &str) -> Money {
        Money::new(s.parse().unwrap(), Currency::Usd)
    }

    fn item(price: &str, quantity: u32) -> LineItem {
        LineItem {
            product_id: product::Id::new(),
            price: Price::Flat { price: usd(price) },
            quantity,
        }
    }

    #[test]
    fn is_idempotent() {
        let cart = [item("12.99", 2), item("3.50", 1)];
        let policy = Policy::default();

        let first = policy.compute(&cart).unwrap();
        let second = policy.compute(&cart).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn threshold_is_strict() {
        let policy = Policy::default();

        let at = policy.compute(&[item("25.00", 2)]).unwrap();
        assert_eq!(at.subtotal, usd("50.00"));
        assert_eq!(at.shipping, usd("9.99"));

        let above = policy.compute(&[item("50.01", 1)]).unwrap();
        assert_eq!(above.shipping, usd("0"));
    }

    #[test]
    fn applies_tax() {
        let summary = Policy::default().compute(&[item("100.00", 1)]).unwrap();

        assert_eq!(summary.subtotal, usd("100.00"));
        assert_eq!(summary.shipping, usd("0"));
        assert_eq!(summary.tax, usd("8.00"));
        assert_eq!(summary.total, usd("108.00"));
        assert_eq!(summary.item_count, 1);
    }

    #[test]
    fn rounds_tax_to_cents() {
        let summary = Policy::default().compute(&[item("12.34", 1)]).unwrap();

        assert_eq!(summary.tax, usd("0.99"));
        assert_eq!(summary.total, usd("23.32"));
    }

    #[test]
    fn empty_cart() {
        let summary = Policy::default().compute(&[]).unwrap();

        assert_eq!(summary.subtotal, usd("0"));
        assert_eq!(summary.shipping, usd("9.99"));
        assert_eq!(summary.tax, usd("0"));
        assert_eq!(summary.total, usd("9.99"));
        assert_eq!(summary.item_count, 0);
    }

    #[test]
    fn uses_discounted_price() {
        let cart = [LineItem {
            product_id: product::Id::new(),
            price: Price::discounted(usd("40.00"), "50".parse().unwrap())
                .unwrap(),
            quantity: 3,
        }];

        let summary = Policy::default().compute(&cart).unwrap();

        assert_eq!(summary.subtotal, usd("60.00"));
        assert_eq!(summary.shipping, usd("0"));
        assert_eq!(summary.item_count, 3);
    }

    #[test]
    fn does_not_mutate_input() {
        let cart = vec![item("1.00", 1), item("2.00", 2)];
        let before = cart.clone();

        drop(Policy::default().compute(&cart).unwrap());

        assert_eq!(cart, before);
    }

    #[test]
    fn rejects_malformed_items() {
        let policy = Policy::default();

        assert_eq!(
            policy.compute(&[item("1.00", 1), item("1.00", 0)]),
            Err(Error::ZeroQuantity { index: 1 }),
        );
        assert_eq!(
            policy.compute(&[item("-1.00", 1)]),
            Err(Error::InvalidPrice { index: 0 }),
        );
        assert_eq!(
            policy.compute(&[LineItem {
                product_id: product::Id::new(),
                price: Price::Flat {
                    price: Money::new("1.00".parse().unwrap(), Currency::Eur),
                },
                quantity: 1,
            }]),
            Err(Error::CurrencyMismatch { index: 0 }),
        );
    }

    #[test]
    fn reports_tax_overflow() {
        let huge = "50000000000000000000000000000";

        assert_eq!(
            Policy::default().compute(&[item(huge, 1)]),
            Err(Error::Overflow),
        );
    }

    #[test]
    fn honors_custom_policy() {
        let policy = Policy {
            free_shipping_threshold: usd("100"),
            flat_shipping_fee: usd("5"),
            tax_rate: "10".parse().unwrap(),
        };

        let summary = policy.compute(&[item("60.00", 1)]).unwrap();

        assert_eq!(summary.shipping, usd("5"));
        assert_eq!(summary.tax, usd("6.00"));
        assert_eq!(summary.total, usd("71.00"));
    }
}
