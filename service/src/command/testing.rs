//! In-memory database doubles and fixtures for command tests.

use std::{str::FromStr as _, sync::Arc};

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact},
    Date, DateTime,
};
use tokio::sync::{Mutex, OnceCell, OwnedMutexGuard};
use tracerr::Traced;

use crate::{
    domain::{booking, stay, user, Booking, Stay, User},
    infra::database,
    read, Config, Service,
};

/// In-memory stand-in for the storage backend.
#[derive(Clone, Debug)]
pub(crate) struct MockDb {
    /// Shared stored data.
    pub(crate) state: Arc<Mutex<State>>,

    /// Advisory lock standing in for the storage lock rows.
    lock: Arc<Mutex<()>>,
}

/// Data held by a [`MockDb`].
#[derive(Debug, Default)]
pub(crate) struct State {
    pub(crate) stays: Vec<Stay>,
    pub(crate) bookings: Vec<Booking>,
    pub(crate) users: Vec<User>,
}

impl MockDb {
    pub(crate) fn new(state: State) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub(crate) fn with_stays(stays: Vec<Stay>) -> Self {
        Self::new(State {
            stays,
            ..State::default()
        })
    }
}

/// Mock transaction serializing on the [`MockDb`] advisory lock the same way
/// the real storage serializes on its lock rows.
#[derive(Debug)]
pub(crate) struct MockTx {
    state: Arc<Mutex<State>>,
    lock: Arc<Mutex<()>>,
    held: OnceCell<OwnedMutexGuard<()>>,
}

impl MockTx {
    /// Takes the advisory lock, parking until the holding [`MockTx`] is
    /// dropped.
    async fn acquire(&self) {
        let guard = Arc::clone(&self.lock).lock_owned().await;
        drop(self.held.set(guard));
    }
}

impl database::Database<Transact> for MockDb {
    type Ok = MockTx;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<MockTx, Self::Err> {
        Ok(MockTx {
            state: Arc::clone(&self.state),
            lock: Arc::clone(&self.lock),
            held: OnceCell::new(),
        })
    }
}

impl database::Database<Select<By<Option<Stay>, stay::Id>>> for MockDb {
    type Ok = Option<Stay>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Stay>, stay::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.state.lock().await.stays.iter().find(|s| s.id == id).cloned())
    }
}

impl database::Database<Select<By<Option<Booking>, booking::Id>>> for MockDb {
    type Ok = Option<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Booking>, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .state
            .lock()
            .await
            .bookings
            .iter()
            .find(|b| b.id == id)
            .cloned())
    }
}

impl
    database::Database<
        Select<By<Vec<(Stay, read::stay::RoomsBooked)>, booking::Period>>,
    > for MockDb
{
    type Ok = Vec<(Stay, read::stay::RoomsBooked)>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<(Stay, read::stay::RoomsBooked)>, booking::Period>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let period = by.into_inner();
        let state = self.state.lock().await;
        Ok(state
            .stays
            .iter()
            .map(|s| {
                let booked = state
                    .bookings
                    .iter()
                    .filter(|b| {
                        b.stay_id == s.id
                            && b.status.reserves_rooms()
                            && b.period.overlaps(&period)
                    })
                    .map(|b| i64::from(b.rooms))
                    .sum::<i64>();
                (s.clone(), booked.into())
            })
            .collect())
    }
}

impl database::Database<Select<By<Option<User>, user::Id>>> for MockDb {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.state.lock().await.users.iter().find(|u| u.id == id).cloned())
    }
}

impl<'l> database::Database<Select<By<Option<User>, &'l user::Login>>>
    for MockDb
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Login>>,
    ) -> Result<Self::Ok, Self::Err> {
        let login = by.into_inner();
        Ok(self
            .state
            .lock()
            .await
            .users
            .iter()
            .find(|u| u.login == *login)
            .cloned())
    }
}

impl database::Database<Lock<By<Stay, stay::Id>>> for MockTx {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Stay, stay::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.acquire().await;
        Ok(())
    }
}

impl database::Database<Lock<By<Booking, booking::Id>>> for MockTx {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Booking, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.acquire().await;
        Ok(())
    }
}

impl
    database::Database<
        Select<By<read::stay::RoomsBooked, (stay::Id, booking::Period)>>,
    > for MockTx
{
    type Ok = read::stay::RoomsBooked;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::stay::RoomsBooked, (stay::Id, booking::Period)>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (stay_id, period) = by.into_inner();
        let booked = self
            .state
            .lock()
            .await
            .bookings
            .iter()
            .filter(|b| {
                b.stay_id == stay_id
                    && b.status.reserves_rooms()
                    && b.period.overlaps(&period)
            })
            .map(|b| i64::from(b.rooms))
            .sum::<i64>();
        Ok(booked.into())
    }
}

impl<'s> database::Database<Select<By<Option<Stay>, &'s stay::Slug>>>
    for MockTx
{
    type Ok = Option<Stay>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Stay>, &'s stay::Slug>>,
    ) -> Result<Self::Ok, Self::Err> {
        let slug = by.into_inner();
        Ok(self
            .state
            .lock()
            .await
            .stays
            .iter()
            .find(|s| s.slug == *slug)
            .cloned())
    }
}

impl database::Database<Insert<Stay>> for MockTx {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(stay): Insert<Stay>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state.lock().await;
        if let Some(s) = state.stays.iter_mut().find(|s| s.id == stay.id) {
            *s = stay;
        } else {
            state.stays.push(stay);
        }
        Ok(())
    }
}

impl database::Database<Select<By<Option<Booking>, booking::Id>>> for MockTx {
    type Ok = Option<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Booking>, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .state
            .lock()
            .await
            .bookings
            .iter()
            .find(|b| b.id == id)
            .cloned())
    }
}

impl database::Database<Insert<Booking>> for MockTx {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(booking): Insert<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state.lock().await;
        if let Some(b) = state.bookings.iter_mut().find(|b| b.id == booking.id)
        {
            *b = booking;
        } else {
            state.bookings.push(booking);
        }
        Ok(())
    }
}

impl database::Database<Commit> for MockTx {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

pub(crate) fn service(db: MockDb) -> Service<MockDb> {
    Service::new(
        Config {
            jwt_encoding_key: jsonwebtoken::EncodingKey::from_secret(b"test"),
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(b"test"),
        },
        db,
    )
}

/// Stay sleeping 2 adults and 1 child per room.
pub(crate) fn stay(total_rooms: u16) -> Stay {
    Stay {
        id: stay::Id::new(),
        slug: stay::Slug::new("forest-dome").unwrap(),
        name: stay::Name::new("Forest Dome").unwrap(),
        short_description: stay::ShortDescription::new("A dome in the woods.")
            .unwrap(),
        long_description: stay::LongDescription::new(
            "A geodesic dome deep in the woods.",
        )
        .unwrap(),
        price_per_night: stay::Price::from_str("120USD").unwrap(),
        max_adults: 2,
        max_children: 1,
        total_rooms,
        amenities: vec![stay::Amenity::Wifi, stay::Amenity::Fireplace],
        images: vec![],
        is_featured: false,
        created_at: DateTime::now().coerce(),
    }
}

pub(crate) fn operator() -> User {
    User {
        id: user::Id::new(),
        name: user::Name::new("Admin").unwrap(),
        login: user::Login::new("admin").unwrap(),
        password_hash: user::PasswordHash::new(
            &user::Password::new("secret").unwrap(),
        ),
        created_at: DateTime::now().coerce(),
    }
}

pub(crate) fn guest() -> booking::Guest {
    booking::Guest {
        name: booking::Name::new("Jamie Doe").unwrap(),
        email: booking::Email::new("jamie@example.com").unwrap(),
        phone: None,
        special_requests: None,
    }
}

pub(crate) fn period(
    from: (i32, u8, u8),
    to: (i32, u8, u8),
) -> booking::Period {
    booking::Period::new(
        Date::from_calendar(from.0, from.1, from.2).unwrap(),
        Date::from_calendar(to.0, to.1, to.2).unwrap(),
    )
    .unwrap()
}
