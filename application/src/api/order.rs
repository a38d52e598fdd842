//! [`Order`] endpoints.

use axum::{extract::Path, http::StatusCode, Json};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, place_order, update_order_status, Command as _},
    domain::{self, order, user},
    query, Query as _,
};

use crate::{context::AuthError, define_error, AsError, Context, Error};

use super::cart::{self, Cart, LineItem, Summary};

/// [`domain::Order`] as exposed over the API.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// ID of this [`Order`].
    pub id: order::Id,

    /// ID of the user who placed this [`Order`].
    pub user_id: user::Id,

    /// Ordered [`LineItem`]s.
    pub items: Vec<LineItem>,

    /// [`Summary`] frozen when this [`Order`] was placed.
    pub summary: Summary,

    /// Fulfillment status of this [`Order`].
    pub status: order::Status,

    /// RFC 3339 [`DateTime`] when this [`Order`] was placed.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: String,
}

impl From<domain::Order> for Order {
    fn from(o: domain::Order) -> Self {
        Self {
            id: o.id,
            user_id: o.user_id,
            items: o.items.into_iter().map(Into::into).collect(),
            summary: o.summary.into(),
            status: o.status,
            created_at: o.created_at.to_rfc3339(),
        }
    }
}

/// Request body of the [`update_status()`] endpoint.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct StatusUpdate {
    /// New status of the [`Order`].
    pub status: order::Status,
}

/// Places a new [`Order`] of the authenticated user.
///
/// # Errors
///
/// Possible error codes:
/// - `AUTHORIZATION_REQUIRED` if the request is not authenticated;
/// - `EMPTY_CART` if no items are provided;
/// - `INVALID_LINE_ITEM` if any item is malformed.
#[tracing::instrument(skip_all, fields(items = cart.items.len()))]
pub async fn place(
    ctx: Context,
    WithRejection(Json(cart), _): WithRejection<Json<Cart>, Error>,
) -> Result<(StatusCode, Json<Order>), Error> {
    let session = ctx.current_session().await?;
    let currency = ctx.service().config().pricing.currency();
    let items = cart::line_items(cart.items, currency)?;

    let order = ctx
        .service()
        .execute(command::PlaceOrder {
            user_id: session.user_id,
            items,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok((StatusCode::CREATED, Json(order.into())))
}

/// Lists [`Order`]s visible to the authenticated user, from the newest to
/// the oldest.
///
/// Administrators see all [`Order`]s.
///
/// # Errors
///
/// Possible error codes:
/// - `AUTHORIZATION_REQUIRED` if the request is not authenticated.
#[tracing::instrument(skip_all)]
pub async fn list(ctx: Context) -> Result<Json<Vec<Order>>, Error> {
    let session = ctx.current_session().await?;

    let orders = ctx
        .service()
        .execute(query::orders::List {
            initiator: session.user_id,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// Moves the [`Order`] with the provided ID to a new status.
///
/// # Errors
///
/// Possible error codes:
/// - `AUTHORIZATION_REQUIRED` if the request is not authenticated;
/// - `NOT_ADMIN` if the authenticated user is not an administrator;
/// - `ORDER_NOT_EXISTS` if there is no such [`Order`];
/// - `WRONG_STATUS_TRANSITION` if the [`Order`] is shipped or cancelled
///   already.
#[tracing::instrument(
    skip_all,
    fields(order.id = %id, order.status = %body.status),
)]
pub async fn update_status(
    ctx: Context,
    WithRejection(Path(id), _): WithRejection<Path<order::Id>, Error>,
    WithRejection(Json(body), _): WithRejection<Json<StatusUpdate>, Error>,
) -> Result<Json<Order>, Error> {
    let session = ctx.admin_session().await?;

    let order = ctx
        .service()
        .execute(command::UpdateOrderStatus {
            initiator: session.user_id,
            id,
            status: body.status,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(order.into()))
}

impl AsError for place_order::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::EmptyCart => Some(OrderError::EmptyCart.into()),
            Self::Pricing(e) => Some(cart::invalid_line_item(e)),
        }
    }
}

impl AsError for update_order_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotAdmin(_) => Some(AuthError::NotAdmin.into()),
            Self::NotExists(_) => Some(OrderError::NotExists.into()),
            Self::WrongTransition { .. } => {
                let mut e = Error::from(OrderError::WrongTransition);
                e.message = self.to_string();
                Some(e)
            }
        }
    }
}

define_error! {
    enum OrderError {
        #[code = "EMPTY_CART"]
        #[status = BAD_REQUEST]
        #[message = "Cart is empty"]
        EmptyCart,

        #[code = "ORDER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "Order does not exist"]
        NotExists,

        #[code = "WRONG_STATUS_TRANSITION"]
        #[status = CONFLICT]
        #[message = "Order status cannot be changed this way"]
        WrongTransition,
    }
}

#[cfg(test)]
mod spec {
    use common::{Currency, DateTime, Money};
    use service::{
        command::{place_order, update_order_status},
        domain::{self, order, product, user, Price},
    };

    use crate::AsError as _;

    use super::Order;

    #[test]
    fn renders_frozen_summary() {
        let usd = |s: &str| Money::new(s.parse().unwrap(), Currency::Usd);
        let order = domain::Order {
            id: order::Id::new(),
            user_id: user::Id::new(),
            items: vec![order::LineItem {
                product_id: product::Id::new(),
                price: Price::Flat { price: usd("4.5") },
                quantity: 3,
            }],
            summary: order::Summary {
                subtotal: usd("13.5"),
                shipping: usd("9.99"),
                tax: usd("1.08"),
                total: usd("24.57"),
                item_count: 3,
            },
            status: order::Status::Placed,
            created_at: DateTime::now().coerce(),
        };

        let json = serde_json::to_value(Order::from(order)).unwrap();

        assert_eq!(json["status"], "PLACED");
        assert_eq!(json["items"][0]["price"], "4.50");
        assert_eq!(json["items"][0]["quantity"], 3);
        assert!(json["items"][0].get("originalPrice").is_none());
        assert_eq!(json["summary"]["subtotal"], "13.50");
        assert_eq!(json["summary"]["total"], "24.57");
    }

    #[test]
    fn maps_errors() {
        let empty = place_order::ExecutionError::EmptyCart.as_error();
        assert_eq!(empty.code, "EMPTY_CART");
        assert_eq!(empty.status_code, http::StatusCode::BAD_REQUEST);

        let wrong = update_order_status::ExecutionError::WrongTransition {
            from: order::Status::Shipped,
            to: order::Status::Cancelled,
        }
        .as_error();
        assert_eq!(wrong.code, "WRONG_STATUS_TRANSITION");
        assert_eq!(wrong.status_code, http::StatusCode::CONFLICT);
        assert_eq!(
            wrong.message,
            "`Order` cannot go from `SHIPPED` to `CANCELLED`",
        );
    }
}
