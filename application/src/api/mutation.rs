//! GraphQL [`Mutation`]s definitions.

use common::Date;
use juniper::graphql_object;
use service::{command, domain::booking, query, Command as _};

use crate::{api, define_error, AsError, Context, Error, Session};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Creates a new `User` with the provided credentials.
    ///
    /// The very first `User` is created openly to bootstrap the site;
    /// afterwards only an authenticated `User` may add more.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - a `User` already exists and the request
    ///                              is not authenticated;
    /// - `LOGIN_OCCUPIED` - provided `UserLogin` is occupied by another
    ///                      `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createUser",
            login = %login,
            name = %name,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_user(
        name: api::user::Name,
        login: api::user::Login,
        password: api::user::Password,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let total: i32 = ctx
            .service()
            .execute(query::users::TotalCount::by(()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .into();
        if total > 0 {
            _ = ctx.current_session().await?;
        }

        let user = ctx
            .service()
            .execute(command::CreateUser {
                name: name.into(),
                login: login.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;
        let output = ctx
            .service()
            .execute(command::CreateUserSession::ByUserId(user.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.set_current_session(Session {
            user_id: output.user.id.into(),
            token: output.token.clone(),
            expires_at: output.expires_at.coerce(),
        })
        .await;

        Ok(output.into())
    }

    /// Creates a new `UserSession` with the provided credentials.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `WRONG_CREDENTIALS` - provided credentials does not match any `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createUserSession",
            login = %login,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_user_session(
        login: api::user::Login,
        password: api::user::Password,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let output = ctx
            .service()
            .execute(command::CreateUserSession::ByCredentials {
                login: login.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.set_current_session(Session {
            user_id: output.user.id.into(),
            token: output.token.clone(),
            expires_at: output.expires_at.coerce(),
        })
        .await;

        Ok(output.into())
    }

    /// Creates a new `Stay` with the provided details.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authenticated;
    /// - `COUNT_OUT_OF_RANGE` - a capacity or room count is negative or too
    ///                          large;
    /// - `STAY_NO_ADULT_CAPACITY` - a room must sleep at least one adult;
    /// - `STAY_NO_ROOMS` - a `Stay` must have at least one room;
    /// - `SLUG_OCCUPIED` - provided `StaySlug` is occupied by another `Stay`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createStay",
            is_featured = ?is_featured,
            max_adults = %max_adults,
            max_children = ?max_children,
            name = %name,
            otel.name = Self::SPAN_NAME,
            price_per_night = %price_per_night,
            slug = %slug,
            total_rooms = %total_rooms,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    pub async fn create_stay(
        slug: api::stay::Slug,
        name: api::stay::Name,
        short_description: api::stay::ShortDescription,
        long_description: api::stay::LongDescription,
        price_per_night: api::stay::Price,
        max_adults: i32,
        max_children: Option<i32>,
        total_rooms: i32,
        amenities: Option<Vec<api::stay::Amenity>>,
        images: Option<Vec<api::stay::ImageUrl>>,
        is_featured: Option<bool>,
        ctx: &Context,
    ) -> Result<api::Stay, Error> {
        let max_adults = api::count(max_adults).map_err(ctx.error())?;
        let max_children = max_children
            .map(api::count)
            .transpose()
            .map_err(ctx.error())?
            .unwrap_or(0);
        let total_rooms = api::count(total_rooms).map_err(ctx.error())?;

        _ = ctx.current_session().await?;

        ctx.service()
            .execute(command::CreateStay {
                slug: slug.into(),
                name: name.into(),
                short_description: short_description.into(),
                long_description: long_description.into(),
                price_per_night: price_per_night.into(),
                max_adults,
                max_children,
                total_rooms,
                amenities: amenities
                    .unwrap_or_default()
                    .into_iter()
                    .map(Into::into)
                    .collect(),
                images: images
                    .unwrap_or_default()
                    .into_iter()
                    .map(Into::into)
                    .collect(),
                is_featured: is_featured.unwrap_or_default(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Creates a new `Booking` of the specified `Stay`.
    ///
    /// The created `Booking` starts in the `PENDING` status and already
    /// reserves rooms.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `COUNT_OUT_OF_RANGE` - a guest or room count is negative or too
    ///                          large;
    /// - `INVALID_PERIOD` - `checkOut` is not strictly after `checkIn`;
    /// - `NO_ADULTS` - the party has no adults;
    /// - `NO_ROOMS` - no rooms are requested;
    /// - `PARTY_EXCEEDS_CAPACITY` - the party doesn't fit into the requested
    ///                              rooms;
    /// - `ROOMS_UNAVAILABLE` - not enough free rooms over the requested
    ///                         period;
    /// - `STAY_NOT_EXISTS` - the `Stay` with the provided ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            adults = %adults,
            check_in = %check_in,
            check_out = %check_out,
            children = ?children,
            gql.name = "createBooking",
            guest_name = %guest_name,
            otel.name = Self::SPAN_NAME,
            rooms = ?rooms,
            stay_id = %stay_id,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    pub async fn create_booking(
        stay_id: api::stay::Id,
        check_in: Date,
        check_out: Date,
        adults: i32,
        children: Option<i32>,
        rooms: Option<i32>,
        guest_name: api::booking::GuestName,
        guest_email: api::booking::GuestEmail,
        guest_phone: Option<api::booking::GuestPhone>,
        special_requests: Option<api::booking::SpecialRequests>,
        ctx: &Context,
    ) -> Result<api::Booking, Error> {
        let adults = api::count(adults).map_err(ctx.error())?;
        let children = children
            .map(api::count)
            .transpose()
            .map_err(ctx.error())?
            .unwrap_or(0);
        let rooms = rooms
            .map(api::count)
            .transpose()
            .map_err(ctx.error())?
            .unwrap_or(1);

        let period = booking::Period::new(check_in, check_out)
            .ok_or_else(|| api::PeriodError::Invalid.into())
            .map_err(ctx.error())?;

        ctx.service()
            .execute(command::CreateBooking {
                stay_id: stay_id.into(),
                period,
                adults,
                children,
                rooms,
                guest: booking::Guest {
                    name: guest_name.into(),
                    email: guest_email.into(),
                    phone: guest_phone.map(Into::into),
                    special_requests: special_requests.map(Into::into),
                },
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Confirms the pending `Booking` with the provided ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authenticated;
    /// - `BOOKING_ALREADY_DECIDED` - the `Booking` is already confirmed or
    ///                               cancelled;
    /// - `BOOKING_NOT_EXISTS` - the `Booking` with the provided ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "confirmBooking",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn confirm_booking(
        id: api::booking::Id,
        ctx: &Context,
    ) -> Result<api::Booking, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::DecideBooking {
                booking_id: id.into(),
                decision: booking::Status::Confirmed,
                initiator_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Cancels the pending `Booking` with the provided ID, releasing its
    /// rooms.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authenticated;
    /// - `BOOKING_ALREADY_DECIDED` - the `Booking` is already confirmed or
    ///                               cancelled;
    /// - `BOOKING_NOT_EXISTS` - the `Booking` with the provided ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "cancelBooking",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn cancel_booking(
        id: api::booking::Id,
        ctx: &Context,
    ) -> Result<api::Booking, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::DecideBooking {
                booking_id: id.into(),
                decision: booking::Status::Cancelled,
                initiator_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "LOGIN_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "`UserLogin` is occupied by another `User`"]
                LoginOccupied,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LoginOccupied(_) => Some(Error::LoginOccupied.into()),
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "WRONG_CREDENTIALS"]
                #[status = FORBIDDEN]
                #[message = "Provided credentials does not match any `User`"]
                WrongCredentials,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenEncodeError(_) => None,
            Self::UserNotExists(_) | Self::WrongCredentials => {
                Some(Error::WrongCredentials.into())
            }
        }
    }
}

impl AsError for command::create_stay::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "STAY_NO_ADULT_CAPACITY"]
                #[status = BAD_REQUEST]
                #[message = "`Stay` room must sleep at least one adult"]
                NoAdultCapacity,

                #[code = "STAY_NO_ROOMS"]
                #[status = BAD_REQUEST]
                #[message = "`Stay` must have at least one room"]
                NoRooms,

                #[code = "SLUG_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "`StaySlug` is occupied by another `Stay`"]
                SlugOccupied,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::NoAdultCapacity => Error::NoAdultCapacity.into(),
            Self::NoRooms => Error::NoRooms.into(),
            Self::SlugOccupied(_) => Error::SlugOccupied.into(),
        })
    }
}

impl AsError for command::create_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "NO_ADULTS"]
                #[status = BAD_REQUEST]
                #[message = "`Booking` party must have at least one adult"]
                NoAdults,

                #[code = "NO_ROOMS"]
                #[status = BAD_REQUEST]
                #[message = "`Booking` must reserve at least one room"]
                NoRooms,

                #[code = "PARTY_EXCEEDS_CAPACITY"]
                #[status = BAD_REQUEST]
                #[message = "Party doesn't fit into the requested number of \
                             rooms"]
                PartyExceedsCapacity,

                #[code = "ROOMS_UNAVAILABLE"]
                #[status = CONFLICT]
                #[message = "Not enough free rooms over the requested period"]
                RoomsUnavailable,

                #[code = "STAY_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Stay` with the provided ID does not exist"]
                StayNotExists,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::NoAdults => Error::NoAdults.into(),
            Self::NoRooms => Error::NoRooms.into(),
            Self::PartyExceedsCapacity { .. } => {
                Error::PartyExceedsCapacity.into()
            }
            Self::RoomsUnavailable { .. } => Error::RoomsUnavailable.into(),
            Self::StayNotExists(_) => Error::StayNotExists.into(),
        })
    }
}

impl AsError for command::decide_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "BOOKING_ALREADY_DECIDED"]
                #[status = CONFLICT]
                #[message = "`Booking` is already confirmed or cancelled"]
                AlreadyDecided,

                #[code = "BOOKING_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Booking` with the provided ID does not exist"]
                BookingNotExists,
            }
        }

        Some(match self {
            Self::AlreadyDecided { .. } => Error::AlreadyDecided.into(),
            Self::BookingNotExists(_) => Error::BookingNotExists.into(),
            Self::Db(e) => return e.try_as_error(),
            Self::NotADecision | Self::UserNotExists(_) => return None,
        })
    }
}
