//! [`Query`] collection related to the multiple [`Order`]s.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{user, Order, User},
    infra::{database, Database},
    read, Service,
};

use super::Query;

/// Queries the [`Order`]s visible to the initiating [`User`], from the
/// newest to the oldest.
///
/// Administrators see the [`Order`]s of all [`User`]s, others see only their
/// own ones.
#[derive(Clone, Copy, Debug)]
pub struct List {
    /// ID of the [`User`] listing the [`Order`]s.
    pub initiator: user::Id,
}

impl<Db> Query<List> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Order>, read::order::list::Filter>>,
            Ok = Vec<Order>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Vec<Order>;
    type Err = Traced<database::Error>;

    async fn execute(&self, query: List) -> Result<Self::Ok, Self::Err> {
        let List { initiator } = query;

        let is_admin = self
            .database()
            .execute(Select(By::new(initiator)))
            .await
            .map_err(tracerr::wrap!())?
            .is_some_and(|u| u.is_admin);

        let filter = read::order::list::Filter {
            user_id: (!is_admin).then_some(initiator),
        };
        self.database()
            .execute(Select(By::new(filter)))
            .await
            .map_err(tracerr::wrap!())
    }
}

#[cfg(test)]
mod spec {
    use common::{Currency, Money};

    use crate::{
        command::{create_product, Command as _, PlaceOrder},
        domain::{order::LineItem, product, user, Price},
        query::Query as _,
    };

    use super::List;

    fn cart() -> Vec<LineItem> {
        vec![LineItem {
            product_id: product::Id::new(),
            price: Price::Flat {
                price: Money::new("3.00".parse().unwrap(), Currency::Usd),
            },
            quantity: 2,
        }]
    }

    #[tokio::test]
    async fn customers_see_own_orders_and_admins_see_all() {
        let (svc, admin, customer) =
            create_product::spec::service_with_users().await;
        let other = user::Id::new();
        let own = svc
            .execute(PlaceOrder {
                user_id: customer.id,
                items: cart(),
            })
            .await
            .unwrap();
        drop(
            svc.execute(PlaceOrder {
                user_id: other,
                items: cart(),
            })
            .await
            .unwrap(),
        );

        let mine = svc
            .execute(List {
                initiator: customer.id,
            })
            .await
            .unwrap();
        assert_eq!(mine.iter().map(|o| o.id).collect::<Vec<_>>(), [own.id]);

        let all = svc.execute(List { initiator: admin.id }).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
