//! [`Stay`] definitions.

use std::sync::LazyLock;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bookable accommodation type offered by the site.
///
/// A [`Stay`] describes one kind of unit (a cabin, a dome, a treehouse) of
/// which [`total_rooms`] physical instances exist.
///
/// [`total_rooms`]: Stay::total_rooms
#[derive(Clone, Debug)]
pub struct Stay {
    /// ID of this [`Stay`].
    pub id: Id,

    /// [`Slug`] of this [`Stay`] used for public lookup.
    pub slug: Slug,

    /// [`Name`] of this [`Stay`].
    pub name: Name,

    /// [`ShortDescription`] of this [`Stay`] shown on listing cards.
    pub short_description: ShortDescription,

    /// [`LongDescription`] of this [`Stay`] shown on its page.
    pub long_description: LongDescription,

    /// [`Price`] of one room of this [`Stay`] per night.
    pub price_per_night: Price,

    /// Number of adults a single room of this [`Stay`] sleeps.
    pub max_adults: MaxAdults,

    /// Number of children a single room of this [`Stay`] sleeps.
    pub max_children: MaxChildren,

    /// Number of physical rooms of this [`Stay`].
    pub total_rooms: TotalRooms,

    /// [`Amenity`]s of this [`Stay`].
    pub amenities: Vec<Amenity>,

    /// Ordered image URLs of this [`Stay`], the first one being the cover.
    pub images: Vec<ImageUrl>,

    /// Indicator whether this [`Stay`] is featured on the home page.
    pub is_featured: bool,

    /// [`DateTime`] when this [`Stay`] was created.
    pub created_at: CreationDateTime,
}

impl Stay {
    /// Returns the number of guests a single room of this [`Stay`] sleeps.
    #[must_use]
    pub fn guests_per_room(&self) -> u32 {
        u32::from(self.max_adults) + u32::from(self.max_children)
    }

    /// Checks whether a party of the given `adults` and `children` fits into
    /// the given number of `rooms` of this [`Stay`].
    #[must_use]
    pub fn fits(&self, adults: u16, children: u16, rooms: u16) -> bool {
        u32::from(adults) + u32::from(children)
            <= u32::from(rooms) * self.guests_per_room()
    }
}

/// ID of a [`Stay`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// URL-safe unique identifier of a [`Stay`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Slug(String);

impl Slug {
    /// Creates a new [`Slug`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `slug` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    /// Creates a new [`Slug`] if the given `slug` is valid.
    #[must_use]
    pub fn new(slug: impl Into<String>) -> Option<Self> {
        let slug = slug.into();
        Self::check(&slug).then_some(Self(slug))
    }

    /// Checks whether the given `slug` is a valid [`Slug`].
    fn check(slug: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Slug`] invariants:
        /// - Lowercase ASCII letters, digits and hyphens only;
        /// - Must not start/end with a hyphen;
        /// - Must not contain consecutive hyphens;
        /// - Must be between 1 and 64 characters long.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid regex")
        });

        let slug = slug.as_ref();
        slug.len() <= 64 && REGEX.is_match(slug)
    }
}

impl FromStr for Slug {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Slug`")
    }
}

/// Name of a [`Stay`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `name` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 128
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// Short card-length description of a [`Stay`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct ShortDescription(String);

impl ShortDescription {
    /// Creates a new [`ShortDescription`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `text` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Creates a new [`ShortDescription`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        Self::check(&text).then_some(Self(text))
    }

    /// Checks whether the given `text` is a valid [`ShortDescription`].
    fn check(text: impl AsRef<str>) -> bool {
        let text = text.as_ref();
        text.trim() == text && !text.is_empty() && text.len() <= 256
    }
}

impl FromStr for ShortDescription {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `ShortDescription`")
    }
}

/// Full page description of a [`Stay`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct LongDescription(String);

impl LongDescription {
    /// Creates a new [`LongDescription`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `text` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Creates a new [`LongDescription`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        Self::check(&text).then_some(Self(text))
    }

    /// Checks whether the given `text` is a valid [`LongDescription`].
    fn check(text: impl AsRef<str>) -> bool {
        let text = text.as_ref();
        text.trim() == text && !text.is_empty() && text.len() <= 16384
    }
}

impl FromStr for LongDescription {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `LongDescription`")
    }
}

/// Per-night price of a single room of a [`Stay`].
///
/// Always strictly positive.
#[derive(Clone, Copy, Debug, Display, Eq, Into, PartialEq)]
pub struct Price(Money);

impl Price {
    /// Creates a new [`Price`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `money` amount is strictly
    /// positive.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(money: Money) -> Self {
        Self(money)
    }

    /// Creates a new [`Price`] if the given `money` amount is strictly
    /// positive.
    #[must_use]
    pub fn new(money: Money) -> Option<Self> {
        Self::check(&money).then_some(Self(money))
    }

    /// Returns the [`Money`] amount of this [`Price`].
    #[must_use]
    pub const fn money(&self) -> Money {
        self.0
    }

    /// Total [`Money`] amount for the given number of `rooms` over the given
    /// number of `nights`.
    #[must_use]
    pub fn total(&self, rooms: u16, nights: u32) -> Money {
        Money {
            amount: self.0.amount
                * Decimal::from(rooms)
                * Decimal::from(nights),
            currency: self.0.currency,
        }
    }

    /// Checks whether the given `money` is a valid [`Price`].
    fn check(money: &Money) -> bool {
        money.amount.is_sign_positive() && !money.amount.is_zero()
    }
}

impl FromStr for Price {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let money = Money::from_str(s).map_err(|_| "invalid `Price`")?;
        Self::new(money).ok_or("invalid `Price`")
    }
}

/// URL of a [`Stay`] image.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct ImageUrl(String);

impl ImageUrl {
    /// Creates a new [`ImageUrl`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `url` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Creates a new [`ImageUrl`] if the given `url` is valid.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Option<Self> {
        let url = url.into();
        Self::check(&url).then_some(Self(url))
    }

    /// Checks whether the given `url` is a valid [`ImageUrl`].
    fn check(url: impl AsRef<str>) -> bool {
        let url = url.as_ref();
        url.trim() == url && !url.is_empty() && url.len() <= 2048
    }
}

impl FromStr for ImageUrl {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `ImageUrl`")
    }
}

/// Number of adults a single room of a [`Stay`] sleeps.
pub type MaxAdults = u16;

/// Number of children a single room of a [`Stay`] sleeps.
pub type MaxChildren = u16;

/// Number of physical rooms of a [`Stay`].
pub type TotalRooms = u16;

define_kind! {
    #[doc = "Amenity of a [`Stay`]."]
    enum Amenity {
        #[doc = "Wireless internet access."]
        Wifi = 1,

        #[doc = "Private jacuzzi or hot tub."]
        Jacuzzi = 2,

        #[doc = "Pets are welcome."]
        PetFriendly = 3,

        #[doc = "Kitchenette with basic appliances."]
        Kitchenette = 4,

        #[doc = "Indoor or outdoor fireplace."]
        Fireplace = 5,

        #[doc = "Air conditioning."]
        AirConditioning = 6,
    }
}

/// [`DateTime`] when a [`Stay`] was created.
pub type CreationDateTime = DateTimeOf<(Stay, unit::Creation)>;

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use super::{Price, Slug};

    #[test]
    fn slug_format() {
        assert!(Slug::new("forest-dream").is_some());
        assert!(Slug::new("dome2").is_some());
        assert!(Slug::new("a").is_some());

        assert!(Slug::new("").is_none());
        assert!(Slug::new("-forest").is_none());
        assert!(Slug::new("forest-").is_none());
        assert!(Slug::new("forest--dream").is_none());
        assert!(Slug::new("Forest-Dream").is_none());
        assert!(Slug::new("forest dream").is_none());
        assert!(Slug::new("a".repeat(65)).is_none());
    }

    #[test]
    fn price_is_strictly_positive() {
        assert!(Price::from_str("120USD").is_ok());
        assert!(Price::from_str("0USD").is_err());
        assert!(Price::from_str("-10USD").is_err());
    }
}
