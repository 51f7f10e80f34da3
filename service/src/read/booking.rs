//! [`Booking`]-related read definitions.
//!
//! [`Booking`]: crate::domain::Booking

/// Per-[`booking::Status`] counts of all [`Booking`]s.
///
/// [`Booking`]: crate::domain::Booking
/// [`booking::Status`]: crate::domain::booking::Status
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Stats {
    /// Number of pending [`Booking`]s.
    ///
    /// [`Booking`]: crate::domain::Booking
    pub pending: list::TotalCount,

    /// Number of confirmed [`Booking`]s.
    ///
    /// [`Booking`]: crate::domain::Booking
    pub confirmed: list::TotalCount,

    /// Number of cancelled [`Booking`]s.
    ///
    /// [`Booking`]: crate::domain::Booking
    pub cancelled: list::TotalCount,
}

pub mod list {
    //! [`Booking`] list definitions.

    use common::define_pagination;
    use derive_more::{From, Into};

    use crate::domain::{booking, stay};
    #[cfg(doc)]
    use crate::domain::{Booking, Stay};

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = booking::Id;

    /// Cursor pointing to a specific [`Booking`] in a list.
    pub type Cursor = booking::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// [`booking::Status`] to list [`Booking`]s in.
        pub status: Option<booking::Status>,

        /// [`Stay`] to list [`Booking`]s of.
        pub stay: Option<stay::Id>,

        /// Guest [`booking::Name`] (or its part) to fuzzy search for.
        pub guest_name: Option<booking::Name>,
    }

    /// Total count of [`Booking`] list items.
    #[derive(
        Clone, Copy, Debug, Default, Eq, From, Hash, Into, PartialEq,
    )]
    pub struct TotalCount(i32);
}
