//! [`Product`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use super::price::Price;

/// Catalog item available in the storefront.
#[derive(Clone, Debug)]
pub struct Product {
    /// ID of this [`Product`].
    pub id: Id,

    /// [`Title`] of this [`Product`].
    pub title: Title,

    /// [`Description`] of this [`Product`].
    pub description: Option<Description>,

    /// [`Category`] of this [`Product`].
    pub category: Category,

    /// Marketing [`Tag`] of this [`Product`].
    pub tag: Option<Tag>,

    /// [`Price`] of this [`Product`].
    pub price: Price,

    /// Number of units in stock.
    ///
    /// Informational only, orders don't reserve stock.
    pub stock: u32,

    /// [`DateTime`] when this [`Product`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`Product`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Title of a [`Product`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Title(String);

impl Title {
    /// Creates a new [`Title`] if the given `title` is valid.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Option<Self> {
        let title = title.into();
        let valid =
            title.trim() == title && !title.is_empty() && title.len() <= 256;
        valid.then_some(Self(title))
    }
}

impl FromStr for Title {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Title`")
    }
}

/// Description of a [`Product`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Description(String);

impl Description {
    /// Creates a new [`Description`] if the given `text` is not blank and not
    /// too long.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        (!text.trim().is_empty() && text.len() <= 4096).then_some(Self(text))
    }
}

/// Marketing tag of a [`Product`] (`new`, `bestseller`, `limited-edition`).
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Tag(String);

impl Tag {
    /// Creates a new lower-cased [`Tag`] if the given `tag` is a single word
    /// of up to 32 alphanumeric characters or dashes.
    #[must_use]
    pub fn new(tag: impl AsRef<str>) -> Option<Self> {
        let tag = tag.as_ref().to_lowercase();
        let valid = (1..=32).contains(&tag.len())
            && !tag.starts_with('-')
            && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        valid.then_some(Self(tag))
    }
}

impl FromStr for Tag {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Tag`")
    }
}

/// Category of a [`Product`].
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    Hash,
    PartialEq,
    Serialize,
)]
#[cfg_attr(
    feature = "postgres",
    derive(FromSql, ToSql),
    postgres(name = "product_category", rename_all = "snake_case")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Single comic book issue.
    #[display("COMIC")]
    Comic,

    /// Japanese comic.
    #[display("MANGA")]
    Manga,

    /// Collected edition or standalone long-form story.
    #[display("GRAPHIC_NOVEL")]
    GraphicNovel,

    /// Figures, posters and other merchandise.
    #[display("COLLECTIBLE")]
    Collectible,
}

impl FromStr for Category {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "COMIC" => Ok(Self::Comic),
            "MANGA" => Ok(Self::Manga),
            "GRAPHIC_NOVEL" => Ok(Self::GraphicNovel),
            "COLLECTIBLE" => Ok(Self::Collectible),
            _ => Err("invalid `Category`"),
        }
    }
}

/// [`DateTime`] when a [`Product`] was created.
pub type CreationDateTime = DateTimeOf<(Product, unit::Creation)>;

#[cfg(test)]
mod spec {
    use super::{Category, Tag, Title};

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!(
            "graphic_novel".parse::<Category>(),
            Ok(Category::GraphicNovel),
        );
        assert_eq!("COMIC".parse::<Category>(), Ok(Category::Comic));
        assert!("poster".parse::<Category>().is_err());
        assert_eq!(Category::GraphicNovel.to_string(), "GRAPHIC_NOVEL");
    }

    #[test]
    fn tag_is_normalized() {
        let tag = Tag::new("Limited-Edition").unwrap();
        let tag: &str = tag.as_ref();

        assert_eq!(tag, "limited-edition");
        assert!(Tag::new("").is_none());
        assert!(Tag::new("two words").is_none());
        assert!(Tag::new("-dash").is_none());
    }

    #[test]
    fn title_rejects_blank() {
        assert!(Title::new("Watchmen").is_some());
        assert!(Title::new("   ").is_none());
        assert!(Title::new("").is_none());
    }
}
