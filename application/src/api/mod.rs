//! REST API definitions.

pub mod cart;
pub mod order;
pub mod product;
pub mod user;

use std::fmt;

use axum::{
    routing::{get, patch, post},
    Router,
};
use common::{Currency, Money, Percent};
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use service::domain::Price;

/// Creates a new [`Router`] serving the whole REST API.
///
/// Handlers expect the [`Service`] to be provided as an [`Extension`].
///
/// [`Extension`]: axum::Extension
/// [`Service`]: crate::Service
pub fn router() -> Router {
    Router::new()
        .route("/auth/register", post(user::register))
        .route("/auth/login", post(user::login))
        .route("/auth/me", get(user::me))
        .route("/products", get(product::list).post(product::create))
        .route(
            "/products/:id",
            get(product::get)
                .put(product::update)
                .delete(product::delete),
        )
        .route("/cart/summary", post(cart::summary))
        .route("/orders", get(order::list).post(order::place))
        .route("/orders/:id", patch(order::update_status))
}

/// Amount of money as exchanged over the API.
///
/// Serialized as a string with at least two decimal places. Deserialized from
/// a string or a number with at most two decimal places.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Amount(pub Decimal);

impl From<Money> for Amount {
    fn from(money: Money) -> Self {
        Self(money.amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut amount = self.0.normalize();
        if amount.scale() < Money::SCALE {
            amount.rescale(Money::SCALE);
        }
        write!(f, "{amount}")
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let amount = <Decimal as Deserialize>::deserialize(d)?.normalize();
        if amount.scale() > Money::SCALE {
            return Err(de::Error::custom(format!(
                "`{amount}` has more than {} decimal places",
                Money::SCALE,
            )));
        }
        Ok(Self(amount))
    }
}

/// Builds a [`Price`] in the provided [`Currency`] out of its API fields.
///
/// The discount is derived from the prices if only the `original_price` is
/// provided. [`None`] is returned if the fields are inconsistent.
fn price(
    price: Amount,
    original_price: Option<Amount>,
    discount_percent: Option<Decimal>,
    currency: Currency,
) -> Option<Price> {
    let price = Money::new(price.0, currency);
    let Some(original) = original_price else {
        let price = Price::Flat { price };
        return (discount_percent.is_none() && price.is_valid())
            .then_some(price);
    };
    let original = Money::new(original.0, currency);
    if price.is_negative() || price.amount > original.amount {
        return None;
    }

    let discount = match discount_percent {
        Some(d) => Percent::new(d)?,
        None if original.amount.is_zero() => Percent::new(Decimal::ZERO)?,
        None => Percent::new(
            original
                .amount
                .checked_sub(price.amount)?
                .checked_div(original.amount)?
                .checked_mul(Decimal::ONE_HUNDRED)?
                .round_dp(2),
        )?,
    };
    let price = Price::Discounted {
        price,
        original_price: original,
        discount,
    };
    price.is_valid().then_some(price)
}

/// Splits the provided [`Price`] into its API fields.
fn price_fields(price: &Price) -> (Amount, Option<Amount>, Option<Decimal>) {
    (
        price.effective().into(),
        price.discount().map(|_| price.original().into()),
        price.discount().map(Decimal::from),
    )
}

#[cfg(test)]
mod spec {
    use common::Currency;
    use rust_decimal::Decimal;
    use service::domain::Price;

    use super::{price, price_fields, Amount};

    fn amount(s: &str) -> Amount {
        Amount(s.parse().unwrap())
    }

    #[test]
    fn renders_at_least_two_decimals() {
        assert_eq!(amount("9.9").to_string(), "9.90");
        assert_eq!(amount("10").to_string(), "10.00");
        assert_eq!(amount("0.125").to_string(), "0.125");
        assert_eq!(
            serde_json::to_value(amount("4.5")).unwrap(),
            serde_json::json!("4.50"),
        );
    }

    #[test]
    fn accepts_strings_and_numbers() {
        let from_str: Amount = serde_json::from_str("\"12.99\"").unwrap();
        let from_num: Amount = serde_json::from_str("12.99").unwrap();

        assert_eq!(from_str, amount("12.99"));
        assert_eq!(from_num, amount("12.99"));
        assert!(serde_json::from_str::<Amount>("\"1.001\"").is_err());
        assert!(serde_json::from_str::<Amount>("\"1.000\"").is_ok());
    }

    #[test]
    fn derives_discount_from_original_price() {
        let p = price(amount("7.50"), Some(amount("10.00")), None, Currency::Usd)
            .unwrap();

        let (effective, original, discount) = price_fields(&p);
        assert_eq!(effective, amount("7.50"));
        assert_eq!(original, Some(amount("10.00")));
        assert_eq!(discount, Some(Decimal::from(25)));
    }

    #[test]
    fn rejects_inconsistent_prices() {
        assert!(
            price(amount("12.00"), Some(amount("10.00")), None, Currency::Usd)
                .is_none()
        );
        assert!(price(
            amount("5.00"),
            None,
            Some(Decimal::from(10)),
            Currency::Usd,
        )
        .is_none());
        assert!(price(
            amount("5.00"),
            Some(amount("10.00")),
            Some(Decimal::from(150)),
            Currency::Usd,
        )
        .is_none());
        assert!(price(amount("-5.00"), None, None, Currency::Usd).is_none());
        assert!(price(
            Amount(Decimal::MIN),
            Some(Amount(Decimal::MAX)),
            None,
            Currency::Usd,
        )
        .is_none());
        assert!(matches!(
            price(amount("5.00"), None, None, Currency::Usd),
            Some(Price::Flat { .. }),
        ));
    }
}
