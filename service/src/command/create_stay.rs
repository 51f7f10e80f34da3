//! [`Command`] for creating a new [`Stay`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::stay::{
    Amenity, ImageUrl, LongDescription, Name, Price, ShortDescription, Slug,
};
use crate::{
    domain::{stay, Stay},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Stay`].
#[derive(Clone, Debug)]
pub struct CreateStay {
    /// [`Slug`] of a new [`Stay`].
    pub slug: stay::Slug,

    /// [`Name`] of a new [`Stay`].
    pub name: stay::Name,

    /// [`ShortDescription`] of a new [`Stay`].
    pub short_description: stay::ShortDescription,

    /// [`LongDescription`] of a new [`Stay`].
    pub long_description: stay::LongDescription,

    /// Per-night [`Price`] of a new [`Stay`].
    pub price_per_night: stay::Price,

    /// Number of adults a single room sleeps.
    pub max_adults: stay::MaxAdults,

    /// Number of children a single room sleeps.
    pub max_children: stay::MaxChildren,

    /// Number of physical rooms.
    pub total_rooms: stay::TotalRooms,

    /// [`Amenity`]s of a new [`Stay`].
    pub amenities: Vec<stay::Amenity>,

    /// Ordered [`ImageUrl`]s of a new [`Stay`].
    pub images: Vec<stay::ImageUrl>,

    /// Indicator whether a new [`Stay`] is featured on the home page.
    pub is_featured: bool,
}

impl<Db> Command<CreateStay> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: for<'s> Database<
            Select<By<Option<Stay>, &'s stay::Slug>>,
            Ok = Option<Stay>,
            Err = Traced<database::Error>,
        > + Database<Insert<Stay>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Stay;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateStay) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateStay {
            slug,
            name,
            short_description,
            long_description,
            price_per_night,
            max_adults,
            max_children,
            total_rooms,
            amenities,
            images,
            is_featured,
        } = cmd;

        if max_adults == 0 {
            return Err(tracerr::new!(E::NoAdultCapacity));
        }
        if total_rooms == 0 {
            return Err(tracerr::new!(E::NoRooms));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let existing = tx
            .execute(Select(By::new(&slug)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::SlugOccupied(slug)));
        }

        let stay = Stay {
            id: stay::Id::new(),
            slug,
            name,
            short_description,
            long_description,
            price_per_night,
            max_adults,
            max_children,
            total_rooms,
            amenities,
            images,
            is_featured,
            created_at: DateTime::now().coerce(),
        };

        tx.execute(Insert(stay.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(stay)
    }
}

/// Error of [`CreateStay`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// A room must sleep at least one adult.
    #[display("`Stay` room must sleep at least one adult")]
    NoAdultCapacity,

    /// A [`Stay`] must have at least one room.
    #[display("`Stay` must have at least one room")]
    NoRooms,

    /// [`stay::Slug`] is already occupied.
    #[display("`{_0}` slug is occupied")]
    SlugOccupied(#[error(not(source))] stay::Slug),
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use crate::{
        command::testing::{self, MockDb},
        domain::stay,
        Command as _,
    };

    use super::{CreateStay, ExecutionError};

    fn cmd(slug: &str) -> CreateStay {
        CreateStay {
            slug: stay::Slug::new(slug).unwrap(),
            name: stay::Name::new("River Cabin").unwrap(),
            short_description: stay::ShortDescription::new(
                "A cabin by the river.",
            )
            .unwrap(),
            long_description: stay::LongDescription::new(
                "A cozy cabin right on the riverbank.",
            )
            .unwrap(),
            price_per_night: stay::Price::from_str("95USD").unwrap(),
            max_adults: 2,
            max_children: 2,
            total_rooms: 4,
            amenities: vec![stay::Amenity::Kitchenette],
            images: vec![],
            is_featured: true,
        }
    }

    #[tokio::test]
    async fn creates_stay() {
        let db = MockDb::with_stays(vec![]);
        let svc = testing::service(db.clone());

        let stay = svc.execute(cmd("river-cabin")).await.unwrap();

        assert_eq!(stay.slug, stay::Slug::new("river-cabin").unwrap());
        assert_eq!(db.state.lock().await.stays.len(), 1);
    }

    #[tokio::test]
    async fn rejects_occupied_slug() {
        let svc = testing::service(MockDb::with_stays(vec![testing::stay(2)]));

        let err = svc.execute(cmd("forest-dome")).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::SlugOccupied(_)));
    }

    #[tokio::test]
    async fn rejects_stay_without_rooms() {
        let svc = testing::service(MockDb::with_stays(vec![]));

        let err = svc
            .execute(CreateStay {
                total_rooms: 0,
                ..cmd("river-cabin")
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NoRooms));
    }
}
