//! GraphQL [`Query`]s definitions.

use common::Date;
use itertools::Itertools as _;
use juniper::graphql_object;
use service::{query, read, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the currently authenticated `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "myUser",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_user(ctx: &Context) -> Result<api::User, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(query::user::ById::by(my_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| UserError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Stay` with the specified slug.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `STAY_NOT_EXISTS` - the `Stay` with the specified slug does not
    ///                       exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "stay",
            otel.name = Self::SPAN_NAME,
            slug = %slug,
        ),
    )]
    pub async fn stay(
        slug: api::stay::Slug,
        ctx: &Context,
    ) -> Result<api::Stay, Error> {
        ctx.service()
            .execute(query::stay::BySlug::by(slug.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| StayError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Fetches the page of `Stay`s.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AMBIGUOUS_PAGINATION_ARGUMENTS` - the pagination arguments are
    ///                                      ambiguous.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            before = ?before,
            featured = ?featured,
            first = ?first,
            gql.name = "stays",
            last = ?last,
            name = ?name.as_ref().map(ToString::to_string),
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn stays(
        first: Option<i32>,
        after: Option<api::stay::list::Cursor>,
        last: Option<i32>,
        before: Option<api::stay::list::Cursor>,
        featured: Option<bool>,
        name: Option<api::stay::Name>,
        ctx: &Context,
    ) -> Result<api::stay::list::Connection, Error> {
        const DEFAULT_PAGE_SIZE: i32 = 10;

        ctx.service()
            .execute(query::stays::List::by(read::stay::list::Selector {
                arguments: read::stay::list::Arguments::new(
                    first,
                    after.map(Into::into),
                    last,
                    before.map(Into::into),
                    DEFAULT_PAGE_SIZE,
                )
                .ok_or_else(|| api::PaginationError::Ambiguous.into())
                .map_err(ctx.error())?,
                filter: read::stay::list::Filter {
                    featured,
                    name: name.map(Into::into),
                },
            }))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Searches for `Stay`s bookable by the specified party over the
    /// specified period.
    ///
    /// Only `Stay`s with enough free rooms that also fit the whole party are
    /// returned, ordered by name.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `COUNT_OUT_OF_RANGE` - a guest or room count is negative or too
    ///                          large;
    /// - `INVALID_PERIOD` - `checkOut` is not strictly after `checkIn`;
    /// - `NO_ADULTS` - the party has no adults;
    /// - `NO_ROOMS` - no rooms are searched for.
    #[tracing::instrument(
        skip_all,
        fields(
            adults = %adults,
            check_in = %check_in,
            check_out = %check_out,
            children = ?children,
            gql.name = "searchStays",
            otel.name = Self::SPAN_NAME,
            rooms = ?rooms,
        ),
    )]
    pub async fn search_stays(
        check_in: Date,
        check_out: Date,
        adults: i32,
        children: Option<i32>,
        rooms: Option<i32>,
        ctx: &Context,
    ) -> Result<Vec<api::stay::Match>, Error> {
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

        ctx.service()
            .execute(query::SearchStays {
                check_in,
                check_out,
                adults,
                children,
                rooms,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|matches| matches.into_iter().map(Into::into).collect())
    }

    /// Returns the `Booking` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `BOOKING_NOT_EXISTS` - the `Booking` with the specified ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "booking",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn booking(
        id: api::booking::Id,
        ctx: &Context,
    ) -> Result<api::booking::list::Edge, Error> {
        Self::bookings(
            None,
            Some(id.into()),
            None,
            Some(id.into()),
            None,
            None,
            None,
            ctx,
        )
        .await?
        .edges()
        .into_iter()
        .exactly_one()
        .map_err(|_| BookingError::NotExists.into())
        .map_err(ctx.error())
    }

    /// Fetches the page of `Booking`s.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AMBIGUOUS_PAGINATION_ARGUMENTS` - the pagination arguments are
    ///                                      ambiguous;
    /// - `AUTHORIZATION_REQUIRED` - the request is not authenticated.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            before = ?before,
            first = ?first,
            gql.name = "bookings",
            guest_name = ?guest_name.as_ref().map(ToString::to_string),
            last = ?last,
            otel.name = Self::SPAN_NAME,
            status = ?status,
            stay_id = ?stay_id.as_ref().map(ToString::to_string),
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    pub async fn bookings(
        first: Option<i32>,
        after: Option<api::booking::list::Cursor>,
        last: Option<i32>,
        before: Option<api::booking::list::Cursor>,
        status: Option<api::booking::Status>,
        stay_id: Option<api::stay::Id>,
        guest_name: Option<api::booking::GuestName>,
        ctx: &Context,
    ) -> Result<api::booking::list::Connection, Error> {
        const DEFAULT_PAGE_SIZE: i32 = 10;

        _ = ctx.current_session().await?;

        ctx.service()
            .execute(query::bookings::List::by(
                read::booking::list::Selector {
                    arguments: read::booking::list::Arguments::new(
                        first,
                        after.map(Into::into),
                        last,
                        before.map(Into::into),
                        DEFAULT_PAGE_SIZE,
                    )
                    .ok_or_else(|| api::PaginationError::Ambiguous.into())
                    .map_err(ctx.error())?,
                    filter: read::booking::list::Filter {
                        status: status.map(Into::into),
                        stay: stay_id.map(Into::into),
                        guest_name: guest_name.map(Into::into),
                    },
                },
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns per-status counts of all `Booking`s.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authenticated.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "bookingStats",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn booking_stats(
        ctx: &Context,
    ) -> Result<api::booking::Stats, Error> {
        _ = ctx.current_session().await?;

        ctx.service()
            .execute(query::bookings::Stats::by(()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

impl AsError for query::search_stays::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "NO_ADULTS"]
                #[status = BAD_REQUEST]
                #[message = "Party must have at least one adult"]
                NoAdults,

                #[code = "NO_ROOMS"]
                #[status = BAD_REQUEST]
                #[message = "At least one room must be searched for"]
                NoRooms,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::InvalidPeriod { .. } => api::PeriodError::Invalid.into(),
            Self::NoAdults => Error::NoAdults.into(),
            Self::NoRooms => Error::NoRooms.into(),
        })
    }
}

define_error! {
    enum BookingError {
        #[code = "BOOKING_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Booking` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum StayError {
        #[code = "STAY_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "The specified `Stay` does not exist"]
        NotExists,
    }
}

define_error! {
    enum UserError {
        #[code = "USER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`User` with the specified ID does not exist"]
        NotExists,
    }
}
