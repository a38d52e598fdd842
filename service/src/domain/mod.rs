//! Domain definitions.

pub mod order;
pub mod price;
pub mod product;
pub mod user;

pub use self::{order::Order, price::Price, product::Product, user::User};
