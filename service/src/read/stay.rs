//! [`Stay`]-related read definitions.

use derive_more::{From, Into};

#[cfg(doc)]
use crate::domain::{booking, Booking, Stay};
use crate::domain::stay;

/// Sum of rooms reserved by non-cancelled [`Booking`]s of a [`Stay`]
/// overlapping some [`booking::Period`].
#[derive(Clone, Copy, Debug, Default, Eq, From, Hash, Into, PartialEq)]
pub struct RoomsBooked(i64);

/// Room occupancy of a [`Stay`] over some [`booking::Period`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Availability {
    /// Number of physical rooms of the [`Stay`].
    pub total_rooms: stay::TotalRooms,

    /// [`RoomsBooked`] over the queried [`booking::Period`].
    pub rooms_booked: RoomsBooked,
}

impl Availability {
    /// Returns the number of rooms still free.
    ///
    /// A booked sum exceeding [`total_rooms`] means the stored data is
    /// inconsistent: the result is clamped to zero and a warning is emitted.
    ///
    /// [`total_rooms`]: Availability::total_rooms
    #[must_use]
    pub fn free_rooms(&self) -> u16 {
        let booked = i64::from(self.rooms_booked);
        let free = i64::from(self.total_rooms) - booked;
        if free < 0 {
            tracing::warn!(
                total_rooms = self.total_rooms,
                rooms_booked = booked,
                "booked rooms exceed total rooms",
            );
        }
        u16::try_from(free.max(0)).unwrap_or(0)
    }
}

pub mod list {
    //! [`Stay`] list definitions.

    use common::define_pagination;
    use derive_more::{From, Into};

    use crate::domain::stay;
    #[cfg(doc)]
    use crate::domain::Stay;

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = stay::Id;

    /// Cursor pointing to a specific [`Stay`] in a list.
    pub type Cursor = stay::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// Indicator whether only featured [`Stay`]s should be listed.
        pub featured: Option<bool>,

        /// [`stay::Name`] (or its part) to fuzzy search for.
        pub name: Option<stay::Name>,
    }

    /// Total count of [`Stay`] list items.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);
}

#[cfg(test)]
mod spec {
    use super::Availability;

    #[test]
    fn free_rooms() {
        let availability = Availability {
            total_rooms: 3,
            rooms_booked: 2.into(),
        };
        assert_eq!(availability.free_rooms(), 1);

        let vacant = Availability {
            total_rooms: 3,
            rooms_booked: 0.into(),
        };
        assert_eq!(vacant.free_rooms(), 3);

        let full = Availability {
            total_rooms: 3,
            rooms_booked: 3.into(),
        };
        assert_eq!(full.free_rooms(), 0);
    }

    #[test]
    fn free_rooms_clamps_inconsistent_data() {
        let availability = Availability {
            total_rooms: 2,
            rooms_booked: 5.into(),
        };
        assert_eq!(availability.free_rooms(), 0);
    }
}
