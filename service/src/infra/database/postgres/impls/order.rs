//! [`Order`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select, Update};
use postgres_types::Json;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{order, Order},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `orders` table, in the order [`from_row()`] expects.
const COLUMNS: &str = "id, user_id, items, summary, status, created_at";

/// Builds an [`Order`] out of the provided [`Row`] of [`COLUMNS`].
fn from_row(row: &Row) -> Order {
    let Json(items) = row.get("items");
    let Json(summary) = row.get("summary");
    Order {
        id: row.get("id"),
        user_id: row.get("user_id"),
        items,
        summary,
        status: row.get("status"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Order>, order::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Order>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Order>, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM orders \
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

impl<C> Database<Lock<By<Order, order::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Order, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM orders \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<Vec<Order>, read::order::list::Filter>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Order>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Order>, read::order::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::order::list::Filter { user_id } = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM orders \
             WHERE ($1::UUID IS NULL OR user_id = $1) \
             ORDER BY created_at DESC, id"
        );
        Ok(self
            .query(&sql, &[&user_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Order>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Order>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(order): Insert<Order>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(order)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Order>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(order): Update<Order>,
    ) -> Result<Self::Ok, Self::Err> {
        let Order {
            id,
            user_id,
            items,
            summary,
            status,
            created_at,
        } = order;
        let (items, summary) = (Json(items), Json(summary));

        // Items and summary are frozen at placement, so only the status is
        // ever updated.
        const SQL: &str = "\
            INSERT INTO orders (\
                id, user_id, items, summary, status, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, \
                $3::JSONB, $4::JSONB, \
                $5::order_status, \
                $6::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET status = EXCLUDED.status";
        self.exec(
            SQL,
            &[&id, &user_id, &items, &summary, &status, &created_at],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
