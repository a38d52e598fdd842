//! [`Command`] for deleting a [`Product`].

use common::operations::{By, Commit, Delete, Select, Transact, Transacted};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{product, user, Product, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for removing a [`Product`] from the catalog.
///
/// Already placed orders keep their copy of the [`Product`]'s price.
#[derive(Clone, Copy, Debug)]
pub struct DeleteProduct {
    /// ID of the [`User`] deleting the [`Product`].
    ///
    /// Must be an administrator.
    pub initiator: user::Id,

    /// ID of the [`Product`] to delete.
    pub id: product::Id,
}

impl<Db> Command<DeleteProduct> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Delete<By<Product, product::Id>>,
            Ok = bool,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteProduct) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteProduct { initiator, id } = cmd;

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
        let existed = tx
            .execute(Delete(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !existed {
            return Err(tracerr::new!(E::NotExists(id)));
        }
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)
    }
}

/// Error of [`DeleteProduct`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`User`] is not an administrator.
    #[display("`User(id: {_0})` is not an administrator")]
    #[from(ignore)]
    NotAdmin(#[error(not(source))] user::Id),

    /// [`Product`] does not exist.
    #[display("`Product(id: {_0})` does not exist")]
    #[from(ignore)]
    NotExists(#[error(not(source))] product::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{create_product, Command as _},
        query::{self, Query as _},
    };

    use super::{DeleteProduct, ExecutionError};

    #[tokio::test]
    async fn removes_product_once() {
        let (svc, admin, _) = create_product::spec::service_with_users().await;
        let created = svc
            .execute(create_product::spec::comic(admin.id, "Saga #1"))
            .await
            .unwrap();
        let cmd = DeleteProduct {
            initiator: admin.id,
            id: created.id,
        };

        svc.execute(cmd).await.unwrap();
        let err = svc.execute(cmd).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotExists(_)));
        assert!(svc
            .execute(query::product::ById::by(created.id))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn customer_cannot_delete_product() {
        let (svc, admin, customer) =
            create_product::spec::service_with_users().await;
        let created = svc
            .execute(create_product::spec::comic(admin.id, "Saga #1"))
            .await
            .unwrap();

        let err = svc
            .execute(DeleteProduct {
                initiator: customer.id,
                id: created.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotAdmin(_)));
    }
}
