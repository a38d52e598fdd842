//! In-memory [`Database`] implementation.
//!
//! Writes are applied immediately, so [`Transact`] and [`Commit`] only exist
//! to satisfy the same bounds as a real [`Database`] does.

use std::{collections::HashMap, sync::Arc};

use common::operations::{
    By, Commit, Delete, Insert, Lock, Select, Transact, Update,
};
use derive_more::{Display, Error as StdError};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracerr::Traced;
use uuid::Uuid;

use crate::{
    domain::{order, product, user, Order, Product, User},
    infra::{database, Database},
    read,
};

/// In-memory [`Database`] client.
///
/// Clones share the same storage and the same transaction.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Shared storage of this [`Memory`] client.
    state: Arc<RwLock<State>>,

    /// Row locks, keyed by the table name and the row ID.
    locks: Arc<Mutex<HashMap<(&'static str, Uuid), Arc<Mutex<()>>>>>,

    /// Row locks held by the current transaction.
    ///
    /// Released on [`Commit`] or once the transaction is dropped.
    held: Arc<Mutex<Vec<OwnedMutexGuard<()>>>>,
}

impl Memory {
    /// Locks the row with the provided `id` in the `table` until the current
    /// transaction ends.
    async fn lock_row(&self, table: &'static str, id: Uuid) {
        let row = Arc::clone(
            self.locks.lock().await.entry((table, id)).or_default(),
        );
        let guard = row.lock_owned().await;
        self.held.lock().await.push(guard);
    }
}

/// Storage of a [`Memory`] client.
#[derive(Debug, Default)]
struct State {
    /// Stored [`User`]s.
    users: HashMap<user::Id, User>,

    /// Stored [`Product`]s.
    products: HashMap<product::Id, Product>,

    /// Stored [`Order`]s.
    orders: HashMap<order::Id, Order>,
}

/// In-memory database [`Error`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, StdError)]
pub enum Error {
    /// Unique constraint is violated.
    #[display("Unique constraint `{constraint}` is violated")]
    UniqueViolation {
        /// Name of the violated constraint.
        constraint: &'static str,
    },
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: &str) -> bool {
        match self {
            Self::UniqueViolation { constraint: c } => *c == constraint,
        }
    }
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Self {
            state: Arc::clone(&self.state),
            locks: Arc::clone(&self.locks),
            held: Arc::default(),
        })
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        self.held.lock().await.clear();
        Ok(())
    }
}

impl Database<Select<By<Option<User>, user::Id>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state.read().await.users.get(by.inner()).cloned())
    }
}

impl<'e> Database<Select<By<Option<User>, &'e user::Email>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'e user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .find(|u| &u.email == email)
            .cloned())
    }
}

impl Database<Insert<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(tracerr::new!(database::Error::from(
                Error::UniqueViolation {
                    constraint: user::Email::UNIQUE_CONSTRAINT,
                }
            )));
        }
        drop(state.users.insert(user.id, user));
        Ok(())
    }
}

impl Database<Select<By<Option<Product>, product::Id>>> for Memory {
    type Ok = Option<Product>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Product>, product::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state.read().await.products.get(by.inner()).cloned())
    }
}

impl Database<Select<By<Vec<Product>, read::product::list::Filter>>>
    for Memory
{
    type Ok = Vec<Product>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Product>, read::product::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        let mut products = self
            .state
            .read()
            .await
            .products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect::<Vec<_>>();
        products.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| Uuid::from(a.id).cmp(&Uuid::from(b.id)))
        });
        Ok(products)
    }
}

impl Database<Insert<Product>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(product): Insert<Product>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(product)).await.map_err(tracerr::wrap!())
    }
}

impl Database<Update<Product>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(product): Update<Product>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(self.state.write().await.products.insert(product.id, product));
        Ok(())
    }
}

impl Database<Lock<By<Product, product::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Product, product::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.lock_row("products", by.into_inner().into()).await;
        Ok(())
    }
}

impl Database<Delete<By<Product, product::Id>>> for Memory {
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Product, product::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .state
            .write()
            .await
            .products
            .remove(by.inner())
            .is_some())
    }
}

impl Database<Select<By<Option<Order>, order::Id>>> for Memory {
    type Ok = Option<Order>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Order>, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state.read().await.orders.get(by.inner()).cloned())
    }
}

impl Database<Lock<By<Order, order::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Order, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.lock_row("orders", by.into_inner().into()).await;
        Ok(())
    }
}

impl Database<Select<By<Vec<Order>, read::order::list::Filter>>> for Memory {
    type Ok = Vec<Order>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Order>, read::order::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        let mut orders = self
            .state
            .read()
            .await
            .orders
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect::<Vec<_>>();
        orders.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| Uuid::from(a.id).cmp(&Uuid::from(b.id)))
        });
        Ok(orders)
    }
}

impl Database<Insert<Order>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(order): Insert<Order>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(order)).await.map_err(tracerr::wrap!())
    }
}

impl Database<Update<Order>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(order): Update<Order>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(self.state.write().await.orders.insert(order.id, order));
        Ok(())
    }
}
