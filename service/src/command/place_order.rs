//! [`Command`] for placing a new [`Order`].

use common::{
    operations::{Commit, Insert, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        order::{self, pricing, LineItem},
        user, Order,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for placing a new [`Order`] out of cart [`LineItem`]s.
///
/// The computed [`order::Summary`] is frozen into the [`Order`].
#[derive(Clone, Debug)]
pub struct PlaceOrder {
    /// ID of the [`User`] placing the [`Order`].
    ///
    /// [`User`]: crate::domain::User
    pub user_id: user::Id,

    /// [`LineItem`]s of the cart.
    pub items: Vec<LineItem>,
}

impl<Db> Command<PlaceOrder> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Order>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Order;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: PlaceOrder) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let PlaceOrder { user_id, items } = cmd;

        if items.is_empty() {
            return Err(tracerr::new!(E::EmptyCart));
        }
        let summary = self
            .config()
            .pricing
            .compute(&items)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let order = Order {
            id: order::Id::new(),
            user_id,
            items,
            summary,
            status: order::Status::Placed,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(order.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            order.id = %order.id,
            user.id = %order.user_id,
            total = %order.summary.total,
            "order placed",
        );
        Ok(order)
    }
}

/// Error of [`PlaceOrder`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// No [`LineItem`]s are provided.
    #[display("Cart is empty")]
    EmptyCart,

    /// [`LineItem`]s cannot be priced.
    #[display("Cannot price the cart: {_0}")]
    Pricing(pricing::Error),
}
