//! [`Booking`]-related definitions.

use std::future;

use common::{Date, DateTime, Handler as _};
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLEnum, GraphQLObject, GraphQLScalar};
use service::{domain, query, read};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{api, api::scalar, AsError, Context, Error};

/// A booking.
#[derive(Clone, Debug, From)]
pub struct Booking {
    /// ID of this [`Booking`].
    id: Id,

    /// Underlying [`domain::Booking`].
    booking: OnceCell<domain::Booking>,
}

impl From<domain::Booking> for Booking {
    fn from(booking: domain::Booking) -> Self {
        Self {
            id: booking.id.into(),
            booking: OnceCell::new_with(Some(booking)),
        }
    }
}

impl Booking {
    /// Creates a new [`Booking`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Booking`] with the provided ID exists,
    /// otherwise accessing this [`Booking`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            booking: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Booking`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Booking`] doesn't exist.
    async fn booking(&self, ctx: &Context) -> Result<&domain::Booking, Error> {
        let id = self.id.into();
        self.booking
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::booking::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|b| {
                        future::ready(b.ok_or_else(|| {
                            api::query::BookingError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// A booking.
#[graphql_object(context = Context)]
impl Booking {
    /// Unique identifier of this `Booking`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// `Stay` this `Booking` reserves rooms of.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.stay",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn stay(&self, ctx: &Context) -> Result<api::Stay, Error> {
        let stay_id = self.booking(ctx).await?.stay_id;
        #[expect(
            unsafe_code,
            reason = "`Booking` loaded from repository guarantees `Stay` \
                      existence"
        )]
        Ok(unsafe { api::Stay::new_unchecked(stay_id) })
    }

    /// Check-in `Date` of this `Booking` (inclusive).
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.checkIn",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn check_in(&self, ctx: &Context) -> Result<Date, Error> {
        Ok(self.booking(ctx).await?.period.check_in())
    }

    /// Check-out `Date` of this `Booking` (exclusive).
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.checkOut",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn check_out(&self, ctx: &Context) -> Result<Date, Error> {
        Ok(self.booking(ctx).await?.period.check_out())
    }

    /// Number of nights this `Booking` spans.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.nights",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn nights(&self, ctx: &Context) -> Result<i32, Error> {
        i32::try_from(self.booking(ctx).await?.period.nights())
            .map_err(AsError::into_error)
    }

    /// Number of adults in the party.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.adults",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn adults(&self, ctx: &Context) -> Result<i32, Error> {
        Ok(self.booking(ctx).await?.adults.into())
    }

    /// Number of children in the party.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.children",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn children(&self, ctx: &Context) -> Result<i32, Error> {
        Ok(self.booking(ctx).await?.children.into())
    }

    /// Number of rooms this `Booking` reserves.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.rooms",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn rooms(&self, ctx: &Context) -> Result<i32, Error> {
        Ok(self.booking(ctx).await?.rooms.into())
    }

    /// Name of the guest who made this `Booking`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.guestName",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn guest_name(&self, ctx: &Context) -> Result<GuestName, Error> {
        Ok(self.booking(ctx).await?.guest.name.clone().into())
    }

    /// Email of the guest who made this `Booking`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.guestEmail",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn guest_email(
        &self,
        ctx: &Context,
    ) -> Result<GuestEmail, Error> {
        Ok(self.booking(ctx).await?.guest.email.clone().into())
    }

    /// Phone of the guest who made this `Booking`, if provided.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.guestPhone",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn guest_phone(
        &self,
        ctx: &Context,
    ) -> Result<Option<GuestPhone>, Error> {
        Ok(self.booking(ctx).await?.guest.phone.clone().map(Into::into))
    }

    /// Special requests of the guest, if any.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.specialRequests",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn special_requests(
        &self,
        ctx: &Context,
    ) -> Result<Option<SpecialRequests>, Error> {
        Ok(self
            .booking(ctx)
            .await?
            .guest
            .special_requests
            .clone()
            .map(Into::into))
    }

    /// Status of this `Booking`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn status(&self, ctx: &Context) -> Result<Status, Error> {
        Ok(self.booking(ctx).await?.status.into())
    }

    /// `DateTime` when this `Booking` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.booking(ctx).await?.created_at.coerce())
    }
}

/// Unique identifier of a `Booking`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::booking::Id)]
#[into(domain::booking::Id)]
#[graphql(name = "BookingId", transparent)]
pub struct Id(Uuid);

/// Name of the guest who made a `Booking`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "BookingGuestName",
    with = scalar::Via::<domain::booking::Name>,
)]
pub struct GuestName(domain::booking::Name);

/// Email of the guest who made a `Booking`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "BookingGuestEmail",
    with = scalar::Via::<domain::booking::Email>,
)]
pub struct GuestEmail(domain::booking::Email);

/// Phone of the guest who made a `Booking`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "BookingGuestPhone",
    with = scalar::Via::<domain::booking::Phone>,
)]
pub struct GuestPhone(domain::booking::Phone);

/// Free-form special requests of a `Booking` guest.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "BookingSpecialRequests",
    with = scalar::Via::<domain::booking::SpecialRequests>,
)]
pub struct SpecialRequests(domain::booking::SpecialRequests);

/// Status of a `Booking`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "BookingStatus")]
pub enum Status {
    /// Awaiting an operator's decision. Reserves rooms.
    Pending,

    /// Confirmed by an operator. Reserves rooms. Terminal.
    Confirmed,

    /// Cancelled by an operator. Releases rooms. Terminal.
    Cancelled,
}

impl From<domain::booking::Status> for Status {
    fn from(status: domain::booking::Status) -> Self {
        use domain::booking::Status as S;
        match status {
            S::Pending => Self::Pending,
            S::Confirmed => Self::Confirmed,
            S::Cancelled => Self::Cancelled,
        }
    }
}

impl From<Status> for domain::booking::Status {
    fn from(status: Status) -> Self {
        use Status as S;
        match status {
            S::Pending => Self::Pending,
            S::Confirmed => Self::Confirmed,
            S::Cancelled => Self::Cancelled,
        }
    }
}

/// Per-status counts of all `Booking`s.
#[derive(Clone, Copy, Debug, GraphQLObject)]
#[graphql(name = "BookingStats")]
pub struct Stats {
    /// Number of pending `Booking`s.
    pub pending: i32,

    /// Number of confirmed `Booking`s.
    pub confirmed: i32,

    /// Number of cancelled `Booking`s.
    pub cancelled: i32,
}

impl From<read::booking::Stats> for Stats {
    fn from(stats: read::booking::Stats) -> Self {
        let read::booking::Stats {
            pending,
            confirmed,
            cancelled,
        } = stats;
        Self {
            pending: pending.into(),
            confirmed: confirmed.into(),
            cancelled: cancelled.into(),
        }
    }
}

pub mod list {
    //! Definitions related to the [`Booking`] list.

    use derive_more::{AsRef, From, Into};
    use juniper::{graphql_object, GraphQLScalar};
    use service::{query, read, Query as _};

    use super::{Booking, Id};
    use crate::{api::scalar, AsError, Context, Error};

    /// Cursor for the `Booking` list.
    #[derive(AsRef, Clone, Copy, Debug, From, GraphQLScalar, Into)]
    #[from(Id, read::booking::list::Cursor)]
    #[graphql(
        name = "BookingListCursor",
        with = scalar::Via::<read::booking::list::Cursor>,
    )]
    pub struct Cursor(pub read::booking::list::Cursor);

    /// Edge in the [`Booking`] list.
    #[derive(Clone, Copy, Debug, From, Into)]
    pub struct Edge(read::booking::list::Edge);

    /// Edge in the `Booking` list.
    #[graphql_object(name = "BookingListEdge", context = Context)]
    impl Edge {
        /// Cursor of this `BookingListEdge`.
        #[must_use]
        pub fn cursor(&self) -> Cursor {
            self.0.cursor.into()
        }

        /// Node of this `BookingListEdge`.
        #[must_use]
        pub fn node(&self) -> Booking {
            #[expect(
                unsafe_code,
                reason = "`Edge` loaded from repository guarantees `Booking` \
                          existence"
            )]
            unsafe {
                Booking::new_unchecked(self.0.node)
            }
        }
    }

    /// Connection of the [`Booking`] list.
    #[derive(Clone, Debug, From, Into)]
    pub struct Connection(read::booking::list::Connection);

    /// Connection of the `Booking` list.
    #[graphql_object(name = "BookingListConnection", context = Context)]
    impl Connection {
        /// Edges of this `BookingListConnection`.
        #[must_use]
        pub fn edges(&self) -> Vec<Edge> {
            self.0.edges.iter().copied().map(Into::into).collect()
        }

        /// Information about the page.
        #[must_use]
        pub fn page_info(&self) -> PageInfo {
            PageInfo {
                info: self.0.page_info(),
                start_cursor: self.0.edges.first().map(|e| e.cursor.into()),
                end_cursor: self.0.edges.last().map(|e| e.cursor.into()),
            }
        }
    }

    /// Information about a [`Connection`] page.
    #[derive(Clone, Copy, Debug)]
    pub struct PageInfo {
        /// Underlying [`read::booking::list::PageInfo`].
        info: read::booking::list::PageInfo,

        /// Start cursor of the page.
        start_cursor: Option<Cursor>,

        /// End cursor of the page.
        end_cursor: Option<Cursor>,
    }

    /// Information about a `BookingListConnection` page.
    #[graphql_object(name = "BookingListPageInfo", context = Context)]
    impl PageInfo {
        /// Indicator whether there is a next page.
        #[must_use]
        pub fn has_next_page(&self) -> bool {
            self.info.has_next_page
        }

        /// Indicator whether there is a previous page.
        #[must_use]
        pub fn has_previous_page(&self) -> bool {
            self.info.has_previous_page
        }

        /// Start cursor of the page.
        #[must_use]
        pub fn start_cursor(&self) -> &Option<Cursor> {
            &self.start_cursor
        }

        /// End cursor of the page.
        #[must_use]
        pub fn end_cursor(&self) -> &Option<Cursor> {
            &self.end_cursor
        }

        /// Total `Booking` count.
        pub async fn total_count(&self, ctx: &Context) -> Result<i32, Error> {
            ctx.service()
                .execute(query::bookings::TotalCount::by(()))
                .await
                .map_err(AsError::into_error)
                .map_err(ctx.error())
                .map(Into::into)
        }
    }
}
