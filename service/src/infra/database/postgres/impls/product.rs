//! [`Product`]-related [`Database`] implementations.

use common::{
    operations::{By, Delete, Insert, Lock, Select, Update},
    Currency, Money, Percent,
};
use rust_decimal::Decimal;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{product, Price, Product},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `products` table, in the order [`from_row()`] expects.
const COLUMNS: &str = "\
    id, title, description, category, tag, \
    currency, price, original_price, discount, \
    stock, created_at";

/// Builds a [`Product`] out of the provided [`Row`] of [`COLUMNS`].
fn from_row(row: &Row) -> Product {
    let currency: Currency = row.get("currency");
    let price = Money::new(row.get("price"), currency);
    let price = match (
        row.get::<_, Option<Decimal>>("original_price"),
        row.get::<_, Option<Percent>>("discount"),
    ) {
        (Some(original), Some(discount)) => Price::Discounted {
            price,
            original_price: Money::new(original, currency),
            discount,
        },
        _ => Price::Flat { price },
    };

    Product {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        category: row.get("category"),
        tag: row.get("tag"),
        price,
        stock: u32::try_from(row.get::<_, i64>("stock"))
            .expect("`stock` overflow"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Product>, product::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Product>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Product>, product::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM products \
             WHERE id = $1::UUID"
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Product>, read::product::list::Filter>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Product>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Product>, read::product::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::product::list::Filter { category, tag } = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM products \
             WHERE ($1::product_category IS NULL OR category = $1) \
               AND ($2::VARCHAR IS NULL OR tag = $2) \
             ORDER BY created_at DESC, id"
        );
        Ok(self
            .query(&sql, &[&category, &tag])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Product>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Product>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(product): Insert<Product>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(product)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Product>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(product): Update<Product>,
    ) -> Result<Self::Ok, Self::Err> {
        let Product {
            id,
            title,
            description,
            category,
            tag,
            price,
            stock,
            created_at,
        } = product;
        let currency = price.effective().currency;
        let amount = price.effective().amount;
        let original_price = price.discount().map(|_| price.original().amount);
        let discount = price.discount();
        let stock = i64::from(stock);

        const SQL: &str = "\
            INSERT INTO products (\
                id, title, description, category, tag, \
                currency, price, original_price, discount, \
                stock, created_at\
            ) \
            VALUES (\
                $1::UUID, \
                $2::VARCHAR, $3::TEXT, \
                $4::product_category, $5::VARCHAR, \
                $6::INT2, $7::NUMERIC, $8::NUMERIC, $9::NUMERIC, \
                $10::INT8, \
                $11::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET title = EXCLUDED.title, \
                description = EXCLUDED.description, \
                category = EXCLUDED.category, \
                tag = EXCLUDED.tag, \
                currency = EXCLUDED.currency, \
                price = EXCLUDED.price, \
                original_price = EXCLUDED.original_price, \
                discount = EXCLUDED.discount, \
                stock = EXCLUDED.stock";
        self.exec(
            SQL,
            &[
                &id,
                &title,
                &description,
                &category,
                &tag,
                &currency,
                &amount,
                &original_price,
                &discount,
                &stock,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Product, product::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Product, product::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM products \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Delete<By<Product, product::Id>>> for Postgres<C>
where
    C: Connection,
{
    /// Indicator whether the [`Product`] existed.
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Product, product::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM products \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(|deleted| deleted > 0)
    }
}
