//! [`Command`] definition.

pub mod authorize_user_session;
pub mod create_product;
pub mod create_user;
pub mod create_user_session;
pub mod delete_product;
pub mod place_order;
pub mod update_order_status;
pub mod update_product;

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{database, Database},
};

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_user_session::AuthorizeUserSession,
    create_product::CreateProduct, create_user::CreateUser,
    create_user_session::CreateUserSession, delete_product::DeleteProduct,
    place_order::PlaceOrder, update_order_status::UpdateOrderStatus,
    update_product::UpdateProduct,
};

/// Checks whether the [`User`] with the provided ID exists and is an
/// administrator.
async fn is_admin<Db>(
    db: &Db,
    user_id: user::Id,
) -> Result<bool, Traced<database::Error>>
where
    Db: Database<
        Select<By<Option<User>, user::Id>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
{
    db.execute(Select(By::new(user_id)))
        .await
        .map_err(tracerr::wrap!())
        .map(|u| u.is_some_and(|u| u.is_admin))
}
