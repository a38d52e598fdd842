//! [`Command`] for updating a [`order::Status`] of an [`Order`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{order, user, Order, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for moving an [`Order`] through its fulfillment.
///
/// Only [`order::Status::Placed`] orders can change their status.
#[derive(Clone, Copy, Debug)]
pub struct UpdateOrderStatus {
    /// ID of the [`User`] updating the [`Order`].
    ///
    /// Must be an administrator.
    pub initiator: user::Id,

    /// ID of the [`Order`] to update.
    pub id: order::Id,

    /// New [`order::Status`].
    pub status: order::Status,
}

impl<Db> Command<UpdateOrderStatus> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Order>, order::Id>>,
            Ok = Option<Order>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Order, order::Id>>,
            Err = Traced<database::Error>,
        > + Database<Update<Order>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Order;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateOrderStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use order::Status as S;
        use ExecutionError as E;

        let UpdateOrderStatus {
            initiator,
            id,
            status,
        } = cmd;

        if !super::is_admin(self.database(), initiator)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        {
            return Err(tracerr::new!(E::NotAdmin(initiator)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent updates of the same `Order`.
        tx.execute(Lock(By::<Order, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut order = tx
            .execute(Select(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::NotExists(id))
            .map_err(tracerr::wrap!())?;
        if order.status == status {
            return Ok(order);
        }
        if order.status != S::Placed {
            return Err(tracerr::new!(E::WrongTransition {
                from: order.status,
                to: status,
            }));
        }
        order.status = status;

        tx.execute(Update(order.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(order)
    }
}

/// Error of [`UpdateOrderStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`User`] is not an administrator.
    #[display("`User(id: {_0})` is not an administrator")]
    #[from(ignore)]
    NotAdmin(#[error(not(source))] user::Id),

    /// [`Order`] does not exist.
    #[display("`Order(id: {_0})` does not exist")]
    #[from(ignore)]
    NotExists(#[error(not(source))] order::Id),

    /// [`Order`] cannot change its status this way.
    #[display("`Order` cannot go from `{from}` to `{to}`")]
    #[from(ignore)]
    WrongTransition {
        /// Current [`order::Status`].
        from: order::Status,

        /// Requested [`order::Status`].
        to: order::Status,
    },
}

#[cfg(test)]
mod spec {
    use common::{Currency, Money};

    use crate::{
        command::{create_product, Command as _, PlaceOrder},
        domain::{
            order::{self, LineItem},
            product, Price,
        },
    };

    use super::{ExecutionError, UpdateOrderStatus};

    #[tokio::test]
    async fn ships_placed_order_only_once() {
        let (svc, admin, customer) =
            create_product::spec::service_with_users().await;
        let placed = svc
            .execute(PlaceOrder {
                user_id: customer.id,
                items: vec![LineItem {
                    product_id: product::Id::new(),
                    price: Price::Flat {
                        price: Money::new("7.50".parse().unwrap(), Currency::Usd),
                    },
                    quantity: 1,
                }],
            })
            .await
            .unwrap();

        let shipped = svc
            .execute(UpdateOrderStatus {
                initiator: admin.id,
                id: placed.id,
                status: order::Status::Shipped,
            })
            .await
            .unwrap();
        assert_eq!(shipped.status, order::Status::Shipped);
        assert_eq!(shipped.summary, placed.summary);

        let err = svc
            .execute(UpdateOrderStatus {
                initiator: admin.id,
                id: placed.id,
                status: order::Status::Cancelled,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::WrongTransition { .. },
        ));

        let err = svc
            .execute(UpdateOrderStatus {
                initiator: customer.id,
                id: placed.id,
                status: order::Status::Cancelled,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotAdmin(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn serializes_concurrent_updates() {
        let (svc, admin, customer) =
            create_product::spec::service_with_users().await;
        let placed = svc
            .execute(PlaceOrder {
                user_id: customer.id,
                items: vec![LineItem {
                    product_id: product::Id::new(),
                    price: Price::Flat {
                        price: Money::new("3.00".parse().unwrap(), Currency::Usd),
                    },
                    quantity: 2,
                }],
            })
            .await
            .unwrap();
        let update = |status| UpdateOrderStatus {
            initiator: admin.id,
            id: placed.id,
            status,
        };

        let (ship, cancel) = tokio::join!(
            svc.execute(update(order::Status::Shipped)),
            svc.execute(update(order::Status::Cancelled)),
        );

        let failed = match (ship, cancel) {
            (Ok(_), Err(e)) | (Err(e), Ok(_)) => e,
            _ => panic!("exactly one of the updates must succeed"),
        };
        assert!(matches!(
            failed.as_ref(),
            ExecutionError::WrongTransition { .. },
        ));
    }
}
