//! [`Stay`]-related definitions.

use std::future;

use common::{Date, DateTime, Handler as _, Money};
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{domain, domain::booking, query, read};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{api, api::scalar, AsError, Context, Error};

/// A stay.
#[derive(Clone, Debug, From)]
pub struct Stay {
    /// ID of this [`Stay`].
    id: Id,

    /// Underlying [`domain::Stay`].
    stay: OnceCell<domain::Stay>,
}

impl From<domain::Stay> for Stay {
    fn from(stay: domain::Stay) -> Self {
        Self {
            id: stay.id.into(),
            stay: OnceCell::new_with(Some(stay)),
        }
    }
}

impl Stay {
    /// Creates a new [`Stay`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Stay`] with the provided ID exists,
    /// otherwise accessing this [`Stay`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            stay: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Stay`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Stay`] doesn't exist.
    async fn stay(&self, ctx: &Context) -> Result<&domain::Stay, Error> {
        let id = self.id.into();
        self.stay
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::stay::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|s| {
                        future::ready(s.ok_or_else(|| {
                            api::query::StayError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// A stay.
#[graphql_object(context = Context)]
impl Stay {
    /// Unique identifier of this `Stay`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Stay.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// URL-safe unique identifier of this `Stay`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Stay.slug",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn slug(&self, ctx: &Context) -> Result<Slug, Error> {
        Ok(self.stay(ctx).await?.slug.clone().into())
    }

    /// Name of this `Stay`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Stay.name",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn name(&self, ctx: &Context) -> Result<Name, Error> {
        Ok(self.stay(ctx).await?.name.clone().into())
    }

    /// Short description of this `Stay` shown on listing cards.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Stay.shortDescription",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn short_description(
        &self,
        ctx: &Context,
    ) -> Result<ShortDescription, Error> {
        Ok(self.stay(ctx).await?.short_description.clone().into())
    }

    /// Full description of this `Stay` shown on its page.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Stay.longDescription",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn long_description(
        &self,
        ctx: &Context,
    ) -> Result<LongDescription, Error> {
        Ok(self.stay(ctx).await?.long_description.clone().into())
    }

    /// Price of one room of this `Stay` per night.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Stay.pricePerNight",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn price_per_night(&self, ctx: &Context) -> Result<Price, Error> {
        Ok(self.stay(ctx).await?.price_per_night.into())
    }

    /// Number of adults a single room of this `Stay` sleeps.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Stay.maxAdults",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn max_adults(&self, ctx: &Context) -> Result<i32, Error> {
        Ok(self.stay(ctx).await?.max_adults.into())
    }

    /// Number of children a single room of this `Stay` sleeps.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Stay.maxChildren",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn max_children(&self, ctx: &Context) -> Result<i32, Error> {
        Ok(self.stay(ctx).await?.max_children.into())
    }

    /// Number of physical rooms of this `Stay`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Stay.totalRooms",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn total_rooms(&self, ctx: &Context) -> Result<i32, Error> {
        Ok(self.stay(ctx).await?.total_rooms.into())
    }

    /// Amenities of this `Stay`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Stay.amenities",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn amenities(&self, ctx: &Context) -> Result<Vec<Amenity>, Error> {
        Ok(self
            .stay(ctx)
            .await?
            .amenities
            .iter()
            .copied()
            .map(Into::into)
            .collect())
    }

    /// Ordered image URLs of this `Stay`, the first one being the cover.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Stay.images",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn images(&self, ctx: &Context) -> Result<Vec<ImageUrl>, Error> {
        Ok(self
            .stay(ctx)
            .await?
            .images
            .iter()
            .cloned()
            .map(Into::into)
            .collect())
    }

    /// Indicator whether this `Stay` is featured on the home page.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Stay.isFeatured",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn is_featured(&self, ctx: &Context) -> Result<bool, Error> {
        Ok(self.stay(ctx).await?.is_featured)
    }

    /// Number of rooms of this `Stay` still free over the provided period.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_PERIOD` - `checkOut` is not strictly after `checkIn`.
    #[tracing::instrument(
        skip_all,
        fields(
            check_in = %check_in,
            check_out = %check_out,
            gql.name = "Stay.freeRooms",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn free_rooms(
        &self,
        check_in: Date,
        check_out: Date,
        ctx: &Context,
    ) -> Result<i32, Error> {
        let period = booking::Period::new(check_in, check_out)
            .ok_or_else(|| api::PeriodError::Invalid.into())
            .map_err(ctx.error())?;

        let stay = self.stay(ctx).await?;
        let rooms_booked = ctx
            .service()
            .execute(query::stay::RoomsBooked::by((stay.id, period)))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        Ok(read::Availability {
            total_rooms: stay.total_rooms,
            rooms_booked,
        }
        .free_rooms()
        .into())
    }

    /// `DateTime` when this `Stay` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Stay.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.stay(ctx).await?.created_at.coerce())
    }
}

/// Unique identifier of a `Stay`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::stay::Id)]
#[into(domain::stay::Id)]
#[graphql(name = "StayId", transparent)]
pub struct Id(Uuid);

/// URL-safe unique identifier of a `Stay`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "StaySlug",
    with = scalar::Via::<domain::stay::Slug>,
)]
pub struct Slug(domain::stay::Slug);

/// Name of a `Stay`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "StayName",
    with = scalar::Via::<domain::stay::Name>,
)]
pub struct Name(domain::stay::Name);

/// Short card-length description of a `Stay`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "StayShortDescription",
    with = scalar::Via::<domain::stay::ShortDescription>,
)]
pub struct ShortDescription(domain::stay::ShortDescription);

/// Full page description of a `Stay`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "StayLongDescription",
    with = scalar::Via::<domain::stay::LongDescription>,
)]
pub struct LongDescription(domain::stay::LongDescription);

/// Per-night price of a single room of a `Stay`.
#[derive(AsRef, Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "StayPrice",
    with = scalar::Via::<domain::stay::Price>,
)]
pub struct Price(domain::stay::Price);

/// URL of a `Stay` image.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "StayImageUrl",
    with = scalar::Via::<domain::stay::ImageUrl>,
)]
pub struct ImageUrl(domain::stay::ImageUrl);

/// Amenity of a `Stay`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "StayAmenity")]
pub enum Amenity {
    /// Wireless internet access.
    Wifi,

    /// Private jacuzzi or hot tub.
    Jacuzzi,

    /// Pets are welcome.
    PetFriendly,

    /// Kitchenette with basic appliances.
    Kitchenette,

    /// Indoor or outdoor fireplace.
    Fireplace,

    /// Air conditioning.
    AirConditioning,
}

impl From<domain::stay::Amenity> for Amenity {
    fn from(amenity: domain::stay::Amenity) -> Self {
        use domain::stay::Amenity as A;
        match amenity {
            A::Wifi => Self::Wifi,
            A::Jacuzzi => Self::Jacuzzi,
            A::PetFriendly => Self::PetFriendly,
            A::Kitchenette => Self::Kitchenette,
            A::Fireplace => Self::Fireplace,
            A::AirConditioning => Self::AirConditioning,
        }
    }
}

impl From<Amenity> for domain::stay::Amenity {
    fn from(amenity: Amenity) -> Self {
        use Amenity as A;
        match amenity {
            A::Wifi => Self::Wifi,
            A::Jacuzzi => Self::Jacuzzi,
            A::PetFriendly => Self::PetFriendly,
            A::Kitchenette => Self::Kitchenette,
            A::Fireplace => Self::Fireplace,
            A::AirConditioning => Self::AirConditioning,
        }
    }
}

/// Single `Stay` matched by a search.
#[derive(Clone, Debug)]
pub struct Match {
    /// Matched [`Stay`].
    stay: Stay,

    /// Number of free rooms over the searched period.
    free_rooms: i32,

    /// Price of the searched rooms over the whole searched period.
    total_price: Money,
}

impl From<query::search_stays::Match> for Match {
    fn from(m: query::search_stays::Match) -> Self {
        let query::search_stays::Match {
            stay,
            free_rooms,
            total_price,
        } = m;
        Self {
            stay: stay.into(),
            free_rooms: free_rooms.into(),
            total_price,
        }
    }
}

/// Single `Stay` matched by a search.
#[graphql_object(name = "StayMatch", context = Context)]
impl Match {
    /// Matched `Stay`.
    #[must_use]
    pub fn stay(&self) -> Stay {
        self.stay.clone()
    }

    /// Number of rooms of the `Stay` still free over the searched period.
    #[must_use]
    pub fn free_rooms(&self) -> i32 {
        self.free_rooms
    }

    /// Price of the searched rooms over the whole searched period.
    #[must_use]
    pub fn total_price(&self) -> Money {
        self.total_price
    }
}

pub mod list {
    //! Definitions related to the [`Stay`] list.

    use derive_more::{AsRef, From, Into};
    use juniper::{graphql_object, GraphQLScalar};
    use service::{query, read, Query as _};

    use super::{Id, Stay};
    use crate::{api::scalar, AsError, Context, Error};

    /// Cursor for the `Stay` list.
    #[derive(AsRef, Clone, Copy, Debug, From, GraphQLScalar, Into)]
    #[from(Id, read::stay::list::Cursor)]
    #[graphql(
        name = "StayListCursor",
        with = scalar::Via::<read::stay::list::Cursor>,
    )]
    pub struct Cursor(pub read::stay::list::Cursor);

    /// Edge in the [`Stay`] list.
    #[derive(Clone, Copy, Debug, From, Into)]
    pub struct Edge(read::stay::list::Edge);

    /// Edge in the `Stay` list.
    #[graphql_object(name = "StayListEdge", context = Context)]
    impl Edge {
        /// Cursor of this `StayListEdge`.
        #[must_use]
        pub fn cursor(&self) -> Cursor {
            self.0.cursor.into()
        }

        /// Node of this `StayListEdge`.
        #[must_use]
        pub fn node(&self) -> Stay {
            #[expect(
                unsafe_code,
                reason = "`Edge` loaded from repository guarantees `Stay` \
                          existence"
            )]
            unsafe {
                Stay::new_unchecked(self.0.node)
            }
        }
    }

    /// Connection of the [`Stay`] list.
    #[derive(Clone, Debug, From, Into)]
    pub struct Connection(read::stay::list::Connection);

    /// Connection of the `Stay` list.
    #[graphql_object(name = "StayListConnection", context = Context)]
    impl Connection {
        /// Edges of this `StayListConnection`.
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
        /// Underlying [`read::stay::list::PageInfo`].
        info: read::stay::list::PageInfo,

        /// Start cursor of the page.
        start_cursor: Option<Cursor>,

        /// End cursor of the page.
        end_cursor: Option<Cursor>,
    }

    /// Information about a `StayListConnection` page.
    #[graphql_object(name = "StayListPageInfo", context = Context)]
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

        /// Total `Stay` count.
        pub async fn total_count(&self, ctx: &Context) -> Result<i32, Error> {
            ctx.service()
                .execute(query::stays::TotalCount::by(()))
                .await
                .map_err(AsError::into_error)
                .map_err(ctx.error())
                .map(Into::into)
        }
    }
}
