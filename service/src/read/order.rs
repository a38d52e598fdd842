//! [`Order`]-related read definitions.

#[cfg(doc)]
use crate::domain::Order;

pub mod list {
    //! [`Order`] list definitions.

    use crate::domain::{order, user};
    #[cfg(doc)]
    use crate::domain::{Order, User};

    /// Filter of an [`Order`] list.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// ID of the [`User`] whose [`Order`]s to match.
        ///
        /// [`None`] matches [`Order`]s of all [`User`]s.
        pub user_id: Option<user::Id>,
    }

    impl Filter {
        /// Checks whether the provided [`Order`] matches this [`Filter`].
        #[must_use]
        pub fn matches(&self, order: &order::Order) -> bool {
            self.user_id.is_none_or(|id| id == order.user_id)
        }
    }
}
