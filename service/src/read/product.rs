//! [`Product`]-related read definitions.

#[cfg(doc)]
use crate::domain::Product;

pub mod list {
    //! [`Product`] list definitions.

    use crate::domain::product;
    #[cfg(doc)]
    use crate::domain::Product;

    /// Filter of a [`Product`] list.
    ///
    /// Unset fields match any [`Product`].
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// [`product::Category`] to match.
        pub category: Option<product::Category>,

        /// [`product::Tag`] to match.
        pub tag: Option<product::Tag>,
    }

    impl Filter {
        /// Checks whether the provided [`Product`] matches this [`Filter`].
        #[must_use]
        pub fn matches(&self, product: &product::Product) -> bool {
            self.category.is_none_or(|c| c == product.category)
                && self
                    .tag
                    .as_ref()
                    .is_none_or(|t| product.tag.as_ref() == Some(t))
        }
    }
}
