//! Cart pricing endpoint and the [`LineItem`]s shared with orders.

use axum::Json;
use axum_extra::extract::WithRejection;
use common::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service::domain::{
    order::{self, pricing},
    product,
};

use crate::{define_error, Context, Error};

use super::Amount;

/// Product reference with a purchase quantity.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// ID of the purchased product.
    pub product_id: product::Id,

    /// Number of purchased units.
    pub quantity: u32,

    /// Price to pay per unit.
    pub price: Amount,

    /// Unit price before the discount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Amount>,

    /// Advertised discount in percents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<Decimal>,
}

impl LineItem {
    /// Converts this [`LineItem`] into an [`order::LineItem`] priced in the
    /// provided [`Currency`].
    ///
    /// [`None`] is returned if the prices are inconsistent.
    fn into_domain(self, currency: Currency) -> Option<order::LineItem> {
        Some(order::LineItem {
            product_id: self.product_id,
            price: super::price(
                self.price,
                self.original_price,
                self.discount_percent,
                currency,
            )?,
            quantity: self.quantity,
        })
    }
}

impl From<order::LineItem> for LineItem {
    fn from(item: order::LineItem) -> Self {
        let (price, original_price, discount_percent) =
            super::price_fields(&item.price);
        Self {
            product_id: item.product_id,
            quantity: item.quantity,
            price,
            original_price,
            discount_percent,
        }
    }
}

/// Converts the provided [`LineItem`]s into [`order::LineItem`]s.
///
/// # Errors
///
/// With `INVALID_LINE_ITEM` code if any of the [`LineItem`]s has inconsistent
/// prices.
pub(crate) fn line_items(
    items: Vec<LineItem>,
    currency: Currency,
) -> Result<Vec<order::LineItem>, Error> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            item.into_domain(currency).ok_or_else(|| {
                invalid_line_item(&pricing::Error::InvalidPrice { index })
            })
        })
        .collect()
}

/// Creates an `INVALID_LINE_ITEM` [`Error`] describing the provided
/// [`pricing::Error`].
pub(crate) fn invalid_line_item(err: &pricing::Error) -> Error {
    let mut e = Error::from(CartError::InvalidLineItem);
    e.message = err.to_string();
    e
}

/// Request body carrying [`LineItem`]s.
#[derive(Debug, Deserialize)]
pub struct Cart {
    /// [`LineItem`]s of this [`Cart`].
    pub items: Vec<LineItem>,
}

/// Derived pricing of a [`Cart`].
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Sum of unit prices multiplied by quantities.
    pub subtotal: Amount,

    /// Shipping fee.
    pub shipping: Amount,

    /// Tax over the subtotal.
    pub tax: Amount,

    /// Grand total.
    pub total: Amount,

    /// Total number of units.
    pub item_count: u64,

    /// [`Currency`] of the amounts.
    pub currency: Currency,
}

impl From<order::Summary> for Summary {
    fn from(s: order::Summary) -> Self {
        Self {
            subtotal: s.subtotal.into(),
            shipping: s.shipping.into(),
            tax: s.tax.into(),
            total: s.total.into(),
            item_count: s.item_count,
            currency: s.total.currency,
        }
    }
}

/// Computes the [`Summary`] of a [`Cart`] without placing an order.
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_LINE_ITEM` if any quantity is zero or any price is negative or
///   inconsistent.
#[tracing::instrument(skip_all, fields(items = cart.items.len()))]
pub async fn summary(
    ctx: Context,
    WithRejection(Json(cart), _): WithRejection<Json<Cart>, Error>,
) -> Result<Json<Summary>, Error> {
    let policy = ctx.service().config().pricing;
    let items = line_items(cart.items, policy.currency())?;

    let summary = policy
        .compute(&items)
        .map_err(|e| invalid_line_item(&e))?;

    Ok(Json(summary.into()))
}

define_error! {
    enum CartError {
        #[code = "INVALID_LINE_ITEM"]
        #[status = BAD_REQUEST]
        #[message = "Line item is malformed"]
        InvalidLineItem,
    }
}

#[cfg(test)]
mod spec {
    use common::Currency;
    use service::domain::order::PricingPolicy;

    use super::{line_items, Cart, Summary};

    fn cart(json: serde_json::Value) -> Cart {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn prices_cart() {
        let cart = cart(serde_json::json!({"items": [
            {
                "productId": "6a1d3b8e-8c0f-4a37-9d3e-0b4c2f1e5a77",
                "quantity": 2,
                "price": "27.99",
            },
        ]}));
        let items = line_items(cart.items, Currency::Usd).unwrap();

        let summary: Summary =
            PricingPolicy::default().compute(&items).unwrap().into();

        assert_eq!(
            serde_json::to_value(summary).unwrap(),
            serde_json::json!({
                "subtotal": "55.98",
                "shipping": "0.00",
                "tax": "4.48",
                "total": "60.46",
                "itemCount": 2,
                "currency": "USD",
            }),
        );
    }

    #[test]
    fn rejects_inconsistent_item() {
        let cart = cart(serde_json::json!({"items": [
            {
                "productId": "6a1d3b8e-8c0f-4a37-9d3e-0b4c2f1e5a77",
                "quantity": 1,
                "price": "5.00",
            },
            {
                "productId": "6a1d3b8e-8c0f-4a37-9d3e-0b4c2f1e5a77",
                "quantity": 1,
                "price": "12.00",
                "originalPrice": "10.00",
            },
        ]}));

        let err = line_items(cart.items, Currency::Usd).unwrap_err();

        assert_eq!(err.code, "INVALID_LINE_ITEM");
        assert_eq!(err.message, "Line item #1 has invalid price");
    }

    #[test]
    fn rejects_extreme_prices() {
        let cart = cart(serde_json::json!({"items": [{
            "productId": "6a1d3b8e-8c0f-4a37-9d3e-0b4c2f1e5a77",
            "quantity": 1,
            "price": "-79228162514264337593543950335",
            "originalPrice": "79228162514264337593543950335",
        }]}));

        let err = line_items(cart.items, Currency::Usd).unwrap_err();

        assert_eq!(err.code, "INVALID_LINE_ITEM");
        assert_eq!(err.message, "Line item #0 has invalid price");
    }
}
