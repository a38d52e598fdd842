//! [`Command`] for creating a new [`Product`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::product::{Category, Description, Tag, Title};
use crate::{
    domain::{product, user, Price, Product, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Product`] in the catalog.
#[derive(Clone, Debug)]
pub struct CreateProduct {
    /// ID of the [`User`] creating the [`Product`].
    ///
    /// Must be an administrator.
    pub initiator: user::Id,

    /// [`Title`] of a new [`Product`].
    pub title: product::Title,

    /// [`Description`] of a new [`Product`].
    pub description: Option<product::Description>,

    /// [`Category`] of a new [`Product`].
    pub category: product::Category,

    /// [`Tag`] of a new [`Product`].
    pub tag: Option<product::Tag>,

    /// [`Price`] of a new [`Product`].
    pub price: Price,

    /// Number of units in stock.
    pub stock: u32,
}

impl<Db> Command<CreateProduct> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Product>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Product;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateProduct) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateProduct {
            initiator,
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

        let product = Product {
            id: product::Id::new(),
            title,
            description,
            category,
            tag,
            price,
            stock,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(product.clone()))
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

/// Error of [`CreateProduct`] [`Command`] execution.
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
}

#[cfg(test)]
pub(crate) mod spec {
    use common::{Currency, Money};
    use secrecy::SecretBox;

    use crate::{
        command::{Command as _, CreateUser},
        domain::{product, user, Price, User},
        infra::Memory,
        query::{self, Query as _},
        Config, Service,
    };

    use super::{CreateProduct, ExecutionError};

    /// Creates a new [`Service`] with one administrator and one customer.
    pub(crate) async fn service_with_users() -> (Service<Memory>, User, User)
    {
        let svc = Service::new(
            Config {
                admin_emails: vec![
                    user::Email::new("admin@example.com").unwrap(),
                ],
                ..Config::with_secret(b"secret")
            },
            Memory::default(),
        );
        let register = |email: &str| CreateUser {
            name: user::Name::new("Someone").unwrap(),
            email: user::Email::new(email).unwrap(),
            password: SecretBox::new(Box::new(
                user::Password::new("password1").unwrap(),
            )),
            phone: None,
        };
        let admin = svc.execute(register("admin@example.com")).await.unwrap();
        let customer = svc.execute(register("fan@example.com")).await.unwrap();
        (svc, admin, customer)
    }

    pub(crate) fn comic(initiator: user::Id, title: &str) -> CreateProduct {
        CreateProduct {
            initiator,
            title: product::Title::new(title).unwrap(),
            description: None,
            category: product::Category::Comic,
            tag: product::Tag::new("new"),
            price: Price::Flat {
                price: Money::new("4.99".parse().unwrap(), Currency::Usd),
            },
            stock: 10,
        }
    }

    #[tokio::test]
    async fn admin_creates_product() {
        let (svc, admin, _) = service_with_users().await;

        let created = svc.execute(comic(admin.id, "Saga #1")).await.unwrap();

        let found = svc
            .execute(query::product::ById::by(created.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.title, created.title);
        assert_eq!(found.price, created.price);
    }

    #[tokio::test]
    async fn customer_cannot_create_product() {
        let (svc, _, customer) = service_with_users().await;

        let err = svc
            .execute(comic(customer.id, "Saga #1"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotAdmin(_)));
    }
}
