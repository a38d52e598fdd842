//! [`Order`] definitions.

pub mod pricing;

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{product, user, Price};

pub use self::pricing::Policy as PricingPolicy;

/// Order placed by a customer, with its pricing frozen at placement.
#[derive(Clone, Debug)]
pub struct Order {
    /// ID of this [`Order`].
    pub id: Id,

    /// ID of the [`User`] who placed this [`Order`].
    ///
    /// [`User`]: crate::domain::User
    pub user_id: user::Id,

    /// Ordered [`LineItem`]s.
    pub items: Vec<LineItem>,

    /// [`Summary`] computed when this [`Order`] was placed.
    pub summary: Summary,

    /// [`Status`] of this [`Order`].
    pub status: Status,

    /// [`DateTime`] when this [`Order`] was placed.
    pub created_at: CreationDateTime,
}

/// ID of an [`Order`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Product reference with a purchase quantity.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// ID of the purchased [`Product`].
    ///
    /// [`Product`]: crate::domain::Product
    pub product_id: product::Id,

    /// Unit [`Price`] of the purchased [`Product`].
    ///
    /// [`Product`]: crate::domain::Product
    pub price: Price,

    /// Number of purchased units, at least `1`.
    pub quantity: u32,
}

/// Derived pricing of a set of [`LineItem`]s.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Sum of unit prices multiplied by quantities.
    pub subtotal: Money,

    /// Shipping fee.
    pub shipping: Money,

    /// Tax over the subtotal.
    pub tax: Money,

    /// Grand total: `subtotal + shipping + tax`.
    pub total: Money,

    /// Total number of purchased units.
    pub item_count: u64,
}

/// Fulfillment status of an [`Order`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    Hash,
    PartialEq,
    Serialize,
)]
#[cfg_attr(
    feature = "postgres",
    derive(FromSql, ToSql),
    postgres(name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Accepted and awaiting shipment.
    #[default]
    #[display("PLACED")]
    Placed,

    /// Handed to the carrier.
    #[display("SHIPPED")]
    Shipped,

    /// Cancelled before shipment.
    #[display("CANCELLED")]
    Cancelled,
}

/// [`DateTime`] when an [`Order`] was placed.
pub type CreationDateTime = DateTimeOf<(Order, unit::Creation)>;
