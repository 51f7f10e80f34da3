//! [`Command`] for creating a new [`Booking`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{booking, stay, Booking, Stay},
    infra::{database, Database},
    read,
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Booking`].
///
/// The created [`Booking`] starts in the [`booking::Status::Pending`] status
/// and already reserves rooms.
#[derive(Clone, Debug)]
pub struct CreateBooking {
    /// ID of the [`Stay`] to book.
    pub stay_id: stay::Id,

    /// [`booking::Period`] to book the [`Stay`] for.
    pub period: booking::Period,

    /// Number of adults in the party.
    pub adults: booking::Adults,

    /// Number of children in the party.
    pub children: booking::Children,

    /// Number of rooms to book.
    pub rooms: booking::Rooms,

    /// [`booking::Guest`] making the [`Booking`].
    pub guest: booking::Guest,
}

impl<Db> Command<CreateBooking> for Service<Db>
where
    Db: Database<
            Select<By<Option<Stay>, stay::Id>>,
            Ok = Option<Stay>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Lock<By<Stay, stay::Id>>, Err = Traced<database::Error>>
        + Database<
            Select<By<read::stay::RoomsBooked, (stay::Id, booking::Period)>>,
            Ok = read::stay::RoomsBooked,
            Err = Traced<database::Error>,
        > + Database<Insert<Booking>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Booking;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateBooking) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateBooking {
            stay_id,
            period,
            adults,
            children,
            rooms,
            guest,
        } = cmd;

        if adults == 0 {
            return Err(tracerr::new!(E::NoAdults));
        }
        if rooms == 0 {
            return Err(tracerr::new!(E::NoRooms));
        }

        let stay = self
            .database()
            .execute(Select(By::<Option<Stay>, _>::new(stay_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::StayNotExists(stay_id))
            .map_err(tracerr::wrap!())?;

        if !stay.fits(adults, children, rooms) {
            return Err(tracerr::new!(E::PartyExceedsCapacity {
                stay_id,
                adults,
                children,
                rooms,
            }));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent bookings of the same `Stay`.
        tx.execute(Lock(By::new(stay.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        // Re-read under the lock, so the sum cannot be raced by another
        // `CreateBooking` of the same `Stay`.
        let rooms_booked = tx
            .execute(Select(By::<read::stay::RoomsBooked, _>::new((
                stay.id, period,
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let availability = read::Availability {
            total_rooms: stay.total_rooms,
            rooms_booked,
        };
        let free = availability.free_rooms();
        if free < rooms {
            return Err(tracerr::new!(E::RoomsUnavailable {
                stay_id,
                requested: rooms,
                free,
            }));
        }

        let booking = Booking {
            id: booking::Id::new(),
            stay_id: stay.id,
            period,
            adults,
            children,
            rooms,
            guest,
            status: booking::Status::Pending,
            created_at: DateTime::now().coerce(),
        };
        tx.execute(Insert(booking.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(booking)
    }
}

/// Error of [`CreateBooking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Party has no adults.
    #[display("`Booking` party must have at least one adult")]
    NoAdults,

    /// No rooms requested.
    #[display("`Booking` must reserve at least one room")]
    NoRooms,

    /// Party doesn't fit into the requested number of rooms.
    #[display(
        "Party of {adults} adults and {children} children doesn't fit into \
         {rooms} room(s) of `Stay(id: {stay_id})`"
    )]
    PartyExceedsCapacity {
        /// ID of the [`Stay`] being booked.
        stay_id: stay::Id,

        /// Number of adults in the party.
        adults: booking::Adults,

        /// Number of children in the party.
        children: booking::Children,

        /// Number of rooms requested.
        rooms: booking::Rooms,
    },

    /// Not enough free rooms over the requested [`booking::Period`].
    #[display(
        "`Stay(id: {stay_id})` has only {free} free room(s), {requested} \
         requested"
    )]
    RoomsUnavailable {
        /// ID of the [`Stay`] being booked.
        stay_id: stay::Id,

        /// Number of rooms requested.
        requested: booking::Rooms,

        /// Number of rooms free.
        free: booking::Rooms,
    },

    /// [`Stay`] with the provided ID does not exist.
    #[display("`Stay(id: {_0})` does not exist")]
    StayNotExists(#[error(not(source))] stay::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{
            testing::{self, MockDb, State},
            DecideBooking,
        },
        domain::{booking, stay},
        Command as _,
    };

    use super::{CreateBooking, ExecutionError};

    fn cmd(
        stay_id: stay::Id,
        period: booking::Period,
        rooms: u16,
    ) -> CreateBooking {
        CreateBooking {
            stay_id,
            period,
            adults: 2,
            children: 0,
            rooms,
            guest: testing::guest(),
        }
    }

    #[tokio::test]
    async fn creates_pending_booking() {
        let stay = testing::stay(3);
        let stay_id = stay.id;
        let db = MockDb::with_stays(vec![stay]);
        let svc = testing::service(db.clone());

        let booking = svc
            .execute(cmd(
                stay_id,
                testing::period((2025, 7, 1), (2025, 7, 5)),
                1,
            ))
            .await
            .unwrap();

        assert_eq!(booking.status, booking::Status::Pending);
        assert_eq!(booking.stay_id, stay_id);
        assert_eq!(db.state.lock().await.bookings.len(), 1);
    }

    #[tokio::test]
    async fn rejects_unknown_stay() {
        let svc = testing::service(MockDb::with_stays(vec![]));

        let err = svc
            .execute(cmd(
                stay::Id::new(),
                testing::period((2025, 7, 1), (2025, 7, 5)),
                1,
            ))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::StayNotExists(_)));
    }

    #[tokio::test]
    async fn rejects_party_without_adults() {
        let stay = testing::stay(3);
        let stay_id = stay.id;
        let svc = testing::service(MockDb::with_stays(vec![stay]));

        let err = svc
            .execute(CreateBooking {
                adults: 0,
                children: 2,
                ..cmd(stay_id, testing::period((2025, 7, 1), (2025, 7, 5)), 1)
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NoAdults));
    }

    #[tokio::test]
    async fn rejects_party_exceeding_room_capacity() {
        // 2 adults + 1 child per room.
        let stay = testing::stay(2);
        let stay_id = stay.id;
        let svc = testing::service(MockDb::with_stays(vec![stay]));

        let err = svc
            .execute(CreateBooking {
                adults: 3,
                ..cmd(stay_id, testing::period((2025, 7, 1), (2025, 7, 5)), 1)
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::PartyExceedsCapacity { .. }
        ));

        // The same party fits into two rooms.
        let booking = svc
            .execute(CreateBooking {
                adults: 3,
                ..cmd(stay_id, testing::period((2025, 7, 1), (2025, 7, 5)), 2)
            })
            .await
            .unwrap();
        assert_eq!(booking.rooms, 2);
    }

    #[tokio::test]
    async fn rejects_overbooking() {
        let stay = testing::stay(3);
        let stay_id = stay.id;
        let svc = testing::service(MockDb::with_stays(vec![stay]));

        let july = testing::period((2025, 7, 1), (2025, 7, 5));
        svc.execute(cmd(stay_id, july, 2)).await.unwrap();
        svc.execute(cmd(stay_id, july, 1)).await.unwrap();

        // All 3 rooms are taken over the overlapping period.
        let err = svc.execute(cmd(stay_id, july, 1)).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::RoomsUnavailable { free: 0, .. }
        ));

        // A non-overlapping period is unaffected.
        let august = testing::period((2025, 8, 1), (2025, 8, 5));
        let booking = svc.execute(cmd(stay_id, august, 3)).await.unwrap();
        assert_eq!(booking.rooms, 3);
    }

    #[tokio::test]
    async fn back_to_back_periods_dont_compete() {
        let stay = testing::stay(1);
        let stay_id = stay.id;
        let svc = testing::service(MockDb::with_stays(vec![stay]));

        svc.execute(cmd(
            stay_id,
            testing::period((2025, 7, 1), (2025, 7, 5)),
            1,
        ))
        .await
        .unwrap();
        svc.execute(cmd(
            stay_id,
            testing::period((2025, 7, 5), (2025, 7, 8)),
            1,
        ))
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn cancellation_frees_rooms() {
        let stay = testing::stay(1);
        let stay_id = stay.id;
        let operator = testing::operator();
        let operator_id = operator.id;
        let svc = testing::service(MockDb::new(State {
            stays: vec![stay],
            users: vec![operator],
            ..State::default()
        }));

        let july = testing::period((2025, 7, 1), (2025, 7, 5));
        let booking = svc.execute(cmd(stay_id, july, 1)).await.unwrap();

        let err = svc.execute(cmd(stay_id, july, 1)).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::RoomsUnavailable { .. }
        ));

        svc.execute(DecideBooking {
            booking_id: booking.id,
            decision: booking::Status::Cancelled,
            initiator_id: operator_id,
        })
        .await
        .unwrap();

        svc.execute(cmd(stay_id, july, 1)).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_bookings_dont_oversell() {
        let stay = testing::stay(1);
        let stay_id = stay.id;
        let db = MockDb::with_stays(vec![stay]);

        let july = testing::period((2025, 7, 1), (2025, 7, 5));
        let first = {
            let svc = testing::service(db.clone());
            tokio::spawn(
                async move { svc.execute(cmd(stay_id, july, 1)).await },
            )
        };
        let second = {
            let svc = testing::service(db.clone());
            tokio::spawn(
                async move { svc.execute(cmd(stay_id, july, 1)).await },
            )
        };

        let (first, second) = (first.await.unwrap(), second.await.unwrap());

        let succeeded =
            [&first, &second].into_iter().filter(|r| r.is_ok()).count();
        assert_eq!(succeeded, 1);

        let lost = if first.is_ok() { second } else { first };
        assert!(matches!(
            lost.unwrap_err().as_ref(),
            ExecutionError::RoomsUnavailable { .. }
        ));

        assert_eq!(db.state.lock().await.bookings.len(), 1);
    }

    // The lock must serialize bookings of a `Stay` that has been booked
    // before, not only the very first pair.
    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_bookings_of_booked_stay_dont_oversell() {
        let stay = testing::stay(2);
        let stay_id = stay.id;
        let db = MockDb::with_stays(vec![stay]);

        let july = testing::period((2025, 7, 1), (2025, 7, 5));
        {
            let svc = testing::service(db.clone());
            svc.execute(cmd(stay_id, july, 1)).await.unwrap();
        }

        // 1 of 2 rooms is left; both contenders want it.
        let first = {
            let svc = testing::service(db.clone());
            tokio::spawn(
                async move { svc.execute(cmd(stay_id, july, 1)).await },
            )
        };
        let second = {
            let svc = testing::service(db.clone());
            tokio::spawn(
                async move { svc.execute(cmd(stay_id, july, 1)).await },
            )
        };

        let (first, second) = (first.await.unwrap(), second.await.unwrap());

        let succeeded =
            [&first, &second].into_iter().filter(|r| r.is_ok()).count();
        assert_eq!(succeeded, 1);

        let lost = if first.is_ok() { second } else { first };
        assert!(matches!(
            lost.unwrap_err().as_ref(),
            ExecutionError::RoomsUnavailable { free: 0, .. }
        ));

        assert_eq!(db.state.lock().await.bookings.len(), 2);
    }
}
