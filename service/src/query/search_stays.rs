//! [`SearchStays`] definition.

use common::{
    operations::{By, Select},
    Date, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::Booking;
use crate::{
    domain::{booking, Stay},
    infra::{database, Database},
    read, Query, Service,
};

/// [`Query`] searching for [`Stay`]s bookable by a party over a period.
///
/// Running the same search twice without intervening [`Booking`]s yields the
/// same result.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SearchStays {
    /// Day the party arrives.
    pub check_in: Date,

    /// Day the party leaves.
    pub check_out: Date,

    /// Number of adults in the party.
    pub adults: booking::Adults,

    /// Number of children in the party.
    pub children: booking::Children,

    /// Number of rooms the party wants.
    pub rooms: booking::Rooms,
}

/// Single [`Stay`] matched by a [`SearchStays`] [`Query`].
#[derive(Clone, Debug)]
pub struct Match {
    /// Matched [`Stay`].
    pub stay: Stay,

    /// Number of rooms of the [`Stay`] still free over the searched period.
    pub free_rooms: u16,

    /// Price of the searched rooms over the whole searched period.
    pub total_price: Money,
}

impl<Db> Query<SearchStays> for Service<Db>
where
    Db: Database<
        Select<By<Vec<(Stay, read::stay::RoomsBooked)>, booking::Period>>,
        Ok = Vec<(Stay, read::stay::RoomsBooked)>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<Match>;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, query: SearchStays) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SearchStays {
            check_in,
            check_out,
            adults,
            children,
            rooms,
        } = query;

        if adults == 0 {
            return Err(tracerr::new!(E::NoAdults));
        }
        if rooms == 0 {
            return Err(tracerr::new!(E::NoRooms));
        }
        let period = booking::Period::new(check_in, check_out)
            .ok_or(E::InvalidPeriod {
                check_in,
                check_out,
            })
            .map_err(tracerr::wrap!())?;

        let occupancy = self
            .database()
            .execute(Select(By::<Vec<(Stay, read::stay::RoomsBooked)>, _>::new(
                period,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut matches = occupancy
            .into_iter()
            .filter_map(|(stay, rooms_booked)| {
                let free_rooms = read::Availability {
                    total_rooms: stay.total_rooms,
                    rooms_booked,
                }
                .free_rooms();

                (free_rooms >= rooms && stay.fits(adults, children, rooms))
                    .then(|| Match {
                        total_price: stay
                            .price_per_night
                            .total(rooms, period.nights()),
                        stay,
                        free_rooms,
                    })
            })
            .collect::<Vec<_>>();
        // Stable presentation order, with the ID as a tie-breaker.
        matches.sort_unstable_by(|a, b| {
            AsRef::<str>::as_ref(&a.stay.name)
                .cmp(b.stay.name.as_ref())
                .then_with(|| {
                    Uuid::from(a.stay.id).cmp(&Uuid::from(b.stay.id))
                })
        });

        Ok(matches)
    }
}

/// Error of [`SearchStays`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Searched period is not at least one night long.
    #[display("`{check_in}..{check_out}` is not a valid period")]
    InvalidPeriod {
        /// Day the party arrives.
        check_in: Date,

        /// Day the party leaves.
        check_out: Date,
    },

    /// Party has no adults.
    #[display("Party must have at least one adult")]
    NoAdults,

    /// No rooms requested.
    #[display("At least one room must be searched for")]
    NoRooms,
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{testing, CreateBooking},
        Command as _, Query as _,
    };

    use super::{ExecutionError, SearchStays};

    fn query() -> SearchStays {
        SearchStays {
            check_in: testing::period((2025, 7, 1), (2025, 7, 5)).check_in(),
            check_out: testing::period((2025, 7, 1), (2025, 7, 5)).check_out(),
            adults: 2,
            children: 0,
            rooms: 1,
        }
    }

    #[tokio::test]
    async fn finds_free_stays() {
        let stay = testing::stay(2);
        let svc =
            testing::service(testing::MockDb::with_stays(vec![stay.clone()]));

        let matches = svc.execute(query()).await.unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].stay.id, stay.id);
        assert_eq!(matches[0].free_rooms, 2);
    }

    #[tokio::test]
    async fn accounts_for_existing_bookings() {
        let stay = testing::stay(1);
        let stay_id = stay.id;
        let svc = testing::service(testing::MockDb::with_stays(vec![stay]));

        svc.execute(CreateBooking {
            stay_id,
            period: testing::period((2025, 7, 1), (2025, 7, 5)),
            adults: 2,
            children: 0,
            rooms: 1,
            guest: testing::guest(),
        })
        .await
        .unwrap();

        let matches = svc.execute(query()).await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn skips_stays_party_doesnt_fit() {
        // 2 adults + 1 child per room.
        let svc =
            testing::service(testing::MockDb::with_stays(vec![testing::stay(
                2,
            )]));

        let matches = svc
            .execute(SearchStays {
                adults: 4,
                ..query()
            })
            .await
            .unwrap();
        assert!(matches.is_empty());

        let matches = svc
            .execute(SearchStays {
                adults: 4,
                rooms: 2,
                ..query()
            })
            .await
            .unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[tokio::test]
    async fn repeating_a_search_yields_the_same_result() {
        let svc = testing::service(testing::MockDb::with_stays(vec![
            testing::stay(3),
        ]));

        let first = svc.execute(query()).await.unwrap();
        let second = svc.execute(query()).await.unwrap();

        assert_eq!(first.len(), second.len());
        assert!(first
            .iter()
            .zip(&second)
            .all(|(a, b)| a.stay.id == b.stay.id
                && a.free_rooms == b.free_rooms));
    }

    #[tokio::test]
    async fn rejects_zero_night_period() {
        let svc = testing::service(testing::MockDb::with_stays(vec![]));

        let err = svc
            .execute(SearchStays {
                check_out: query().check_in,
                ..query()
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::InvalidPeriod { .. }));
    }

    #[tokio::test]
    async fn rejects_party_without_adults() {
        let svc = testing::service(testing::MockDb::with_stays(vec![]));

        let err = svc
            .execute(SearchStays {
                adults: 0,
                ..query()
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NoAdults));
    }
}
