//! [`Query`] collection related to the multiple [`Product`]s.

use common::operations::By;

#[cfg(doc)]
use crate::Query;
use crate::{domain::Product, read};

use super::DatabaseQuery;

/// Queries a list of [`Product`]s matching a [`Filter`], from the newest to
/// the oldest.
pub type List = DatabaseQuery<By<Vec<Product>, Filter>>;

pub use read::product::list::Filter;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{Currency, Money};

    use crate::{
        command::{create_product, Command as _, CreateProduct},
        domain::{product, Price},
        query::Query as _,
    };

    use super::{Filter, List};

    #[tokio::test]
    async fn filters_by_category_and_tag() {
        let (svc, admin, _) = create_product::spec::service_with_users().await;
        let comic = svc
            .execute(create_product::spec::comic(admin.id, "Saga #1"))
            .await
            .unwrap();
        std::thread::sleep(Duration::from_millis(2));
        let manga = svc
            .execute(CreateProduct {
                initiator: admin.id,
                title: product::Title::new("Akira Vol. 1").unwrap(),
                description: None,
                category: product::Category::Manga,
                tag: product::Tag::new("bestseller"),
                price: Price::Flat {
                    price: Money::new("24.99".parse().unwrap(), Currency::Usd),
                },
                stock: 2,
            })
            .await
            .unwrap();

        let all = svc.execute(List::by(Filter::default())).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, manga.id, "newest first");

        let comics = svc
            .execute(List::by(Filter {
                category: Some(product::Category::Comic),
                tag: None,
            }))
            .await
            .unwrap();
        assert_eq!(comics.iter().map(|p| p.id).collect::<Vec<_>>(), [comic.id]);

        let bestsellers = svc
            .execute(List::by(Filter {
                category: None,
                tag: product::Tag::new("BESTSELLER"),
            }))
            .await
            .unwrap();
        assert_eq!(
            bestsellers.iter().map(|p| p.id).collect::<Vec<_>>(),
            [manga.id],
        );
    }
}
