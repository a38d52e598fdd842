//! Catalog [`Product`] endpoints.

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use common::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service::{
    command::{
        self, create_product, delete_product, update_product, Command as _,
    },
    domain::{self, product, Price},
    query::{self, products::Filter},
    Query as _,
};

use crate::{context::AuthError, define_error, AsError, Context, Error};

use super::Amount;

/// [`domain::Product`] as exposed over the API.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// ID of this [`Product`].
    pub id: product::Id,

    /// Title of this [`Product`].
    pub title: String,

    /// Description of this [`Product`], if any.
    pub description: Option<String>,

    /// Category of this [`Product`].
    pub category: product::Category,

    /// Marketing tag of this [`Product`], if any.
    pub tag: Option<String>,

    /// Price to pay per unit.
    pub price: Amount,

    /// Price before the discount, if discounted.
    pub original_price: Option<Amount>,

    /// Discount in percents, if discounted.
    pub discount_percent: Option<Decimal>,

    /// [`Currency`] of the prices.
    pub currency: Currency,

    /// Number of units in stock.
    pub stock: u32,

    /// RFC 3339 [`DateTime`] when this [`Product`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: String,
}

impl From<domain::Product> for Product {
    fn from(p: domain::Product) -> Self {
        let (price, original_price, discount_percent) =
            super::price_fields(&p.price);
        Self {
            id: p.id,
            title: p.title.to_string(),
            description: p.description.as_ref().map(ToString::to_string),
            category: p.category,
            tag: p.tag.as_ref().map(ToString::to_string),
            price,
            original_price,
            discount_percent,
            currency: p.price.effective().currency,
            stock: p.stock,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

/// Request body for creating or replacing a [`Product`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    /// Title of the [`Product`].
    pub title: String,

    /// Optional description of the [`Product`].
    #[serde(default)]
    pub description: Option<String>,

    /// Category of the [`Product`], case-insensitive.
    pub category: String,

    /// Optional marketing tag of the [`Product`].
    #[serde(default)]
    pub tag: Option<String>,

    /// Price to pay per unit.
    pub price: Amount,

    /// Price before the discount.
    #[serde(default)]
    pub original_price: Option<Amount>,

    /// Advertised discount in percents.
    #[serde(default)]
    pub discount_percent: Option<Decimal>,

    /// Number of units in stock.
    #[serde(default)]
    pub stock: u32,
}

/// Validated [`Input`].
struct Fields {
    title: product::Title,
    description: Option<product::Description>,
    category: product::Category,
    tag: Option<product::Tag>,
    price: Price,
    stock: u32,
}

impl Input {
    /// Validates this [`Input`] pricing it in the provided [`Currency`].
    fn validate(self, currency: Currency) -> Result<Fields, ProductError> {
        let Self {
            title,
            description,
            category,
            tag,
            price,
            original_price,
            discount_percent,
            stock,
        } = self;

        Ok(Fields {
            title: product::Title::new(title)
                .ok_or(ProductError::InvalidTitle)?,
            description: description
                .filter(|d| !d.trim().is_empty())
                .map(|d| {
                    product::Description::new(d)
                        .ok_or(ProductError::InvalidDescription)
                })
                .transpose()?,
            category: parse_category(&category)?,
            tag: tag.as_deref().map(parse_tag).transpose()?,
            price: super::price(
                price,
                original_price,
                discount_percent,
                currency,
            )
            .ok_or(ProductError::InvalidPrice)?,
            stock,
        })
    }
}

/// Query parameters of the [`list()`] endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Category to filter by.
    pub category: Option<String>,

    /// Tag to filter by.
    pub tag: Option<String>,
}

/// Lists [`Product`]s from the newest to the oldest.
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_CATEGORY`, `INVALID_TAG` if a filter is malformed.
#[tracing::instrument(
    skip_all,
    fields(category = ?params.category, tag = ?params.tag),
)]
pub async fn list(
    ctx: Context,
    WithRejection(Query(params), _): WithRejection<Query<ListParams>, Error>,
) -> Result<Json<Vec<Product>>, Error> {
    let filter = Filter {
        category: params.category.as_deref().map(parse_category).transpose()?,
        tag: params.tag.as_deref().map(parse_tag).transpose()?,
    };

    let products = ctx
        .service()
        .execute(query::products::List::by(filter))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// Returns the [`Product`] with the provided ID.
///
/// # Errors
///
/// Possible error codes:
/// - `PRODUCT_NOT_EXISTS` if there is no such [`Product`].
#[tracing::instrument(skip_all, fields(product.id = %id))]
pub async fn get(
    ctx: Context,
    WithRejection(Path(id), _): WithRejection<Path<product::Id>, Error>,
) -> Result<Json<Product>, Error> {
    let product = ctx
        .service()
        .execute(query::product::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .ok_or(ProductError::NotExists)?;

    Ok(Json(product.into()))
}

/// Adds a new [`Product`] to the catalog.
///
/// # Errors
///
/// Possible error codes:
/// - `AUTHORIZATION_REQUIRED` if the request is not authenticated;
/// - `NOT_ADMIN` if the authenticated user is not an administrator;
/// - `INVALID_TITLE`, `INVALID_DESCRIPTION`, `INVALID_CATEGORY`,
///   `INVALID_TAG`, `INVALID_PRICE` if the corresponding field is malformed.
#[tracing::instrument(skip_all, fields(product.title = %input.title))]
pub async fn create(
    ctx: Context,
    WithRejection(Json(input), _): WithRejection<Json<Input>, Error>,
) -> Result<(StatusCode, Json<Product>), Error> {
    let session = ctx.admin_session().await?;
    let Fields {
        title,
        description,
        category,
        tag,
        price,
        stock,
    } = input.validate(currency(&ctx))?;

    let product = ctx
        .service()
        .execute(command::CreateProduct {
            initiator: session.user_id,
            title,
            description,
            category,
            tag,
            price,
            stock,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok((StatusCode::CREATED, Json(product.into())))
}

/// Replaces the [`Product`] with the provided ID.
///
/// # Errors
///
/// Same as the [`create()`] endpoint, plus:
/// - `PRODUCT_NOT_EXISTS` if there is no such [`Product`].
#[tracing::instrument(skip_all, fields(product.id = %id))]
pub async fn update(
    ctx: Context,
    WithRejection(Path(id), _): WithRejection<Path<product::Id>, Error>,
    WithRejection(Json(input), _): WithRejection<Json<Input>, Error>,
) -> Result<Json<Product>, Error> {
    let session = ctx.admin_session().await?;
    let Fields {
        title,
        description,
        category,
        tag,
        price,
        stock,
    } = input.validate(currency(&ctx))?;

    let product = ctx
        .service()
        .execute(command::UpdateProduct {
            initiator: session.user_id,
            id,
            title,
            description,
            category,
            tag,
            price,
            stock,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(product.into()))
}

/// Removes the [`Product`] with the provided ID from the catalog.
///
/// # Errors
///
/// Possible error codes:
/// - `AUTHORIZATION_REQUIRED` if the request is not authenticated;
/// - `NOT_ADMIN` if the authenticated user is not an administrator;
/// - `PRODUCT_NOT_EXISTS` if there is no such [`Product`].
#[tracing::instrument(skip_all, fields(product.id = %id))]
pub async fn delete(
    ctx: Context,
    WithRejection(Path(id), _): WithRejection<Path<product::Id>, Error>,
) -> Result<StatusCode, Error> {
    let session = ctx.admin_session().await?;

    ctx.service()
        .execute(command::DeleteProduct {
            initiator: session.user_id,
            id,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Returns the [`Currency`] the catalog is priced in.
fn currency(ctx: &Context) -> Currency {
    ctx.service().config().pricing.currency()
}

/// Parses a case-insensitive [`product::Category`].
fn parse_category(s: &str) -> Result<product::Category, ProductError> {
    s.parse().map_err(|_| ProductError::InvalidCategory)
}

/// Parses a [`product::Tag`].
fn parse_tag(s: &str) -> Result<product::Tag, ProductError> {
    product::Tag::new(s).ok_or(ProductError::InvalidTag)
}

impl AsError for create_product::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidPrice => Some(ProductError::InvalidPrice.into()),
            Self::NotAdmin(_) => Some(AuthError::NotAdmin.into()),
        }
    }
}

impl AsError for update_product::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidPrice => Some(ProductError::InvalidPrice.into()),
            Self::NotAdmin(_) => Some(AuthError::NotAdmin.into()),
            Self::NotExists(_) => Some(ProductError::NotExists.into()),
        }
    }
}

impl AsError for delete_product::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotAdmin(_) => Some(AuthError::NotAdmin.into()),
            Self::NotExists(_) => Some(ProductError::NotExists.into()),
        }
    }
}

define_error! {
    enum ProductError {
        #[code = "INVALID_TITLE"]
        #[status = BAD_REQUEST]
        #[message = "Title must be non-empty and up to 256 bytes"]
        InvalidTitle,

        #[code = "INVALID_DESCRIPTION"]
        #[status = BAD_REQUEST]
        #[message = "Description must be up to 4096 bytes"]
        InvalidDescription,

        #[code = "INVALID_CATEGORY"]
        #[status = BAD_REQUEST]
        #[message = "Unknown product category"]
        InvalidCategory,

        #[code = "INVALID_TAG"]
        #[status = BAD_REQUEST]
        #[message = "Tag must be a single word of letters, digits and dashes"]
        InvalidTag,

        #[code = "INVALID_PRICE"]
        #[status = BAD_REQUEST]
        #[message = "Price is negative or inconsistent"]
        InvalidPrice,

        #[code = "PRODUCT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "Product does not exist"]
        NotExists,
    }
}

#[cfg(test)]
mod spec {
    use common::Currency;
    use rust_decimal::Decimal;
    use service::domain::{product, Price};

    use crate::api::Amount;

    use super::{Input, ProductError};

    fn input() -> Input {
        serde_json::from_value(serde_json::json!({
            "title": "Saga #1",
            "category": "comic",
            "tag": "New",
            "price": "7.50",
            "originalPrice": 10,
        }))
        .unwrap()
    }

    #[test]
    fn validates_input() {
        let fields = input().validate(Currency::Usd).unwrap();

        assert_eq!(fields.category, product::Category::Comic);
        assert_eq!(fields.tag, product::Tag::new("new"));
        assert_eq!(fields.stock, 0);
        assert!(fields.description.is_none());
        assert_eq!(
            fields.price.discount().map(Decimal::from),
            Some(Decimal::from(25)),
        );
        assert!(matches!(fields.price, Price::Discounted { .. }));
    }

    #[test]
    fn reports_malformed_fields() {
        let err = |i: Input| i.validate(Currency::Usd).map(drop).unwrap_err();

        assert!(matches!(
            err(Input {
                title: " ".into(),
                ..input()
            }),
            ProductError::InvalidTitle,
        ));
        assert!(matches!(
            err(Input {
                category: "poster".into(),
                ..input()
            }),
            ProductError::InvalidCategory,
        ));
        assert!(matches!(
            err(Input {
                tag: Some("two words".into()),
                ..input()
            }),
            ProductError::InvalidTag,
        ));
        assert!(matches!(
            err(Input {
                price: Amount("12.00".parse().unwrap()),
                ..input()
            }),
            ProductError::InvalidPrice,
        ));
    }
}
