//! [`Command`] for updating an existing [`Product`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{product, user, Price, Product, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] replacing the editable fields of an existing [`Product`].
#[derive(Clone, Debug)]
pub struct UpdateProduct {
    /// ID of the [`User`] updating the [`Product`].
    ///
    /// Must be an administrator.
    pub initiator: user::Id,

    /// ID of the [`Product`] to update.
    pub id: product::Id,

    /// New [`product::Title`].
    pub title: product::Title,

    /// New [`product::Description`].
    pub description: Option<product::Description>,

    /// New [`product::Category`].
    pub category: product::Category,

    /// New [`product::Tag`].
    pub tag: Option<product::Tag>,

    /// New [`Price`].
    pub price: Price,

    /// New number of units in stock.
    pub stock: u32,
}

impl<Db> Command<UpdateProduct> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Product>, product::Id>>,
            Ok = Option<Product>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Product, product::Id>>,
            Err = Traced<database::Error>,
        > + Database<Update<Product>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Product;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateProduct) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateProduct {
            initiator,
            id,
            title,
            description,
            category,
            tag,
            price,
            stock,
        } = cmd;

        if !super::is_admin(self.database(), initiator)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        {
            return Err(tracerr::new!(E::NotAdmin(initiator)));
        }
        if !price.is_valid() {
            return Err(tracerr::new!(E::InvalidPrice));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent updates of the same `Product`.
        tx.execute(Lock(By::<Product, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut product = tx
            .execute(Select(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::NotExists(id))
            .map_err(tracerr::wrap!())?;
        product.title = title;
        product.description = description;
        product.category = category;
        product.tag = tag;
        product.price = price;
        product.stock = stock;

        tx.execute(Update(product.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(product)
    }
}

/// Error of [`UpdateProduct`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Price`] is negative or inconsistent.
    #[display("`Price` is invalid")]
    InvalidPrice,

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
    use common::{Currency, Money};

    use crate::{
        command::{create_product, Command as _},
        domain::{product, Price},
    };

    use super::{ExecutionError, UpdateProduct};

    fn update(
        initiator: crate::domain::user::Id,
        id: product::Id,
    ) -> UpdateProduct {
        UpdateProduct {
            initiator,
            id,
            title: product::Title::new("Saga #1 (Variant)").unwrap(),
            description: product::Description::new("Foil cover"),
            category: product::Category::Collectible,
            tag: None,
            price: Price::discounted(
                Money::new("10.00".parse().unwrap(), Currency::Usd),
                "20".parse().unwrap(),
            )
            .unwrap(),
            stock: 3,
        }
    }

    #[tokio::test]
    async fn replaces_fields_and_keeps_identity() {
        let (svc, admin, _) = create_product::spec::service_with_users().await;
        let created = svc
            .execute(create_product::spec::comic(admin.id, "Saga #1"))
            .await
            .unwrap();

        let updated = svc.execute(update(admin.id, created.id)).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.category, product::Category::Collectible);
        assert_eq!(
            updated.price.effective(),
            Money::new("8.00".parse().unwrap(), Currency::Usd),
        );
        assert_eq!(updated.stock, 3);
    }

    #[tokio::test]
    async fn fails_on_missing_product() {
        let (svc, admin, _) = create_product::spec::service_with_users().await;

        let err = svc
            .execute(update(admin.id, product::Id::new()))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotExists(_)));
    }

    #[tokio::test]
    async fn customer_cannot_update_product() {
        let (svc, admin, customer) =
            create_product::spec::service_with_users().await;
        let created = svc
            .execute(create_product::spec::comic(admin.id, "Saga #1"))
            .await
            .unwrap();

        let err = svc
            .execute(update(customer.id, created.id))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotAdmin(_)));
    }
}
