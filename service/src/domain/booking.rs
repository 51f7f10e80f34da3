//! [`Booking`] definitions.

use std::sync::LazyLock;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, Date, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::stay;
#[cfg(doc)]
use crate::domain::Stay;

/// Reservation of one or more rooms of a single [`Stay`].
///
/// A [`Booking`] is never deleted: a withdrawn one is kept with the
/// [`Status::Cancelled`] status.
#[derive(Clone, Debug)]
pub struct Booking {
    /// ID of this [`Booking`].
    pub id: Id,

    /// ID of the [`Stay`] this [`Booking`] reserves rooms of.
    pub stay_id: stay::Id,

    /// [`Period`] of this [`Booking`].
    pub period: Period,

    /// Number of adults in the party.
    pub adults: Adults,

    /// Number of children in the party.
    pub children: Children,

    /// Number of rooms this [`Booking`] reserves.
    pub rooms: Rooms,

    /// [`Guest`] who made this [`Booking`].
    pub guest: Guest,

    /// [`Status`] of this [`Booking`].
    pub status: Status,

    /// [`DateTime`] when this [`Booking`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`Booking`].
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

/// Half-open period `[check_in, check_out)` of a [`Booking`].
///
/// The check-out [`Date`] is always strictly after the check-in one, so a
/// zero-night [`Period`] is unrepresentable.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Period {
    /// Check-in [`Date`] (inclusive).
    check_in: Date,

    /// Check-out [`Date`] (exclusive).
    check_out: Date,
}

impl Period {
    /// Creates a new [`Period`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that `check_out` is strictly after `check_in`.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(check_in: Date, check_out: Date) -> Self {
        Self {
            check_in,
            check_out,
        }
    }

    /// Creates a new [`Period`] if `check_out` is strictly after `check_in`.
    #[must_use]
    pub fn new(check_in: Date, check_out: Date) -> Option<Self> {
        (check_out > check_in).then_some(Self {
            check_in,
            check_out,
        })
    }

    /// Returns the check-in [`Date`] of this [`Period`] (inclusive).
    #[must_use]
    pub const fn check_in(&self) -> Date {
        self.check_in
    }

    /// Returns the check-out [`Date`] of this [`Period`] (exclusive).
    #[must_use]
    pub const fn check_out(&self) -> Date {
        self.check_out
    }

    /// Checks whether this [`Period`] overlaps with the `other` one.
    ///
    /// Both periods are half-open, so back-to-back ones sharing a turnover
    /// [`Date`] don't overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }

    /// Returns the number of nights this [`Period`] spans.
    #[expect(
        clippy::missing_panics_doc,
        reason = "`check_out` is after `check_in`"
    )]
    #[must_use]
    pub fn nights(&self) -> u32 {
        u32::try_from(self.check_in.days_until(self.check_out))
            .expect("positive")
    }
}

/// Number of adults in a [`Booking`] party.
pub type Adults = u16;

/// Number of children in a [`Booking`] party.
pub type Children = u16;

/// Number of rooms a [`Booking`] reserves.
pub type Rooms = u16;

/// Contact details of the [`Guest`] who made a [`Booking`].
#[derive(Clone, Debug)]
pub struct Guest {
    /// [`Name`] of this [`Guest`].
    pub name: Name,

    /// [`Email`] of this [`Guest`].
    pub email: Email,

    /// [`Phone`] of this [`Guest`], if provided.
    pub phone: Option<Phone>,

    /// [`SpecialRequests`] of this [`Guest`], if any.
    pub special_requests: Option<SpecialRequests>,
}

/// Name of a [`Guest`].
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
        name.trim() == name && !name.is_empty() && name.len() <= 512
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// Email address of a [`Guest`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Email(String);

impl Email {
    /// Creates a new [`Email`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `address` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Creates a new [`Email`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`Email`].
    fn check(address: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Email`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(
                "^([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                     \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                  |\\x22([^\\x0d\\x22\\x5c\\x80-\\xff]\
                  |\\x5c[\\x00-\\x7f])*\\x22)\
                  (\\x2e([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                           \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                        |\\x22([^\\x0d\\x22\\x5c\\x80-\\xff]\
                        |\\x5c[\\x00-\\x7f])*\\x22))*\\x40\
                  ([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                     \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                  |\\x5b([^\\x0d\\x5b-\\x5d\\x80-\\xff]\
                        |\\x5c[\\x00-\\x7f])*\\x5d)\
                  (\\x2e([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                           \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                        |\\x5b([^\\x0d\\x5b-\\x5d\\x80-\\xff]\
                        |\\x5c[\\x00-\\x7f])*\\x5d))*$",
            )
            .expect("valid regex")
        });

        REGEX.is_match(address.as_ref())
    }
}

impl FromStr for Email {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Email`")
    }
}

/// Phone number of a [`Guest`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Phone(String);

impl Phone {
    /// Creates a new [`Phone`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `number` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// Creates a new [`Phone`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Option<Self> {
        let number = number.into();
        Self::check(&number).then_some(Self(number))
    }

    /// Checks whether the given `number` is a valid [`Phone`].
    fn check(number: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Phone`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^([+]?\d{1,2}[-\s]?|)\d{3}[-\s]?\d{3}[-\s]?\d{4}$")
                .expect("valid regex")
        });

        REGEX.is_match(number.as_ref())
    }
}

impl FromStr for Phone {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Phone`")
    }
}

/// Free-form special requests of a [`Guest`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct SpecialRequests(String);

impl SpecialRequests {
    /// Creates a new [`SpecialRequests`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `text` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Creates a new [`SpecialRequests`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        Self::check(&text).then_some(Self(text))
    }

    /// Checks whether the given `text` is a valid [`SpecialRequests`].
    fn check(text: impl AsRef<str>) -> bool {
        let text = text.as_ref();
        !text.trim().is_empty() && text.len() <= 2048
    }
}

impl FromStr for SpecialRequests {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `SpecialRequests`")
    }
}

define_kind! {
    #[doc = "Status of a [`Booking`]."]
    enum Status {
        #[doc = "Awaiting an operator's decision. Reserves rooms."]
        Pending = 1,

        #[doc = "Confirmed by an operator. Reserves rooms. Terminal."]
        Confirmed = 2,

        #[doc = "Cancelled by an operator. Releases rooms. Terminal."]
        Cancelled = 3,
    }
}

impl Status {
    /// Indicates whether a [`Booking`] in this [`Status`] reserves rooms.
    ///
    /// Both [`Pending`] and [`Confirmed`] [`Booking`]s count against a
    /// [`Stay`]'s capacity.
    ///
    /// [`Confirmed`]: Status::Confirmed
    /// [`Pending`]: Status::Pending
    #[must_use]
    pub const fn reserves_rooms(self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

/// [`DateTime`] when a [`Booking`] was created.
pub type CreationDateTime = DateTimeOf<(Booking, unit::Creation)>;

#[cfg(test)]
mod spec {
    use common::Date;

    use super::{Period, Status};

    fn date(y: i32, m: u8, d: u8) -> Date {
        Date::from_calendar(y, m, d).unwrap()
    }

    fn period(from: (i32, u8, u8), to: (i32, u8, u8)) -> Period {
        Period::new(date(from.0, from.1, from.2), date(to.0, to.1, to.2))
            .unwrap()
    }

    #[test]
    fn zero_night_period_is_unrepresentable() {
        let d = date(2025, 1, 5);
        assert!(Period::new(d, d).is_none());
        assert!(Period::new(date(2025, 1, 5), date(2025, 1, 4)).is_none());
    }

    #[test]
    fn back_to_back_periods_dont_overlap() {
        let a = period((2025, 1, 1), (2025, 1, 5));
        let b = period((2025, 1, 5), (2025, 1, 8));

        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn overlapping_periods_overlap_symmetrically() {
        let a = period((2025, 1, 1), (2025, 1, 5));
        let b = period((2025, 1, 4), (2025, 1, 8));

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn contained_period_overlaps() {
        let outer = period((2025, 1, 1), (2025, 1, 31));
        let inner = period((2025, 1, 10), (2025, 1, 12));

        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
        assert!(outer.overlaps(&outer));
    }

    #[test]
    fn disjoint_periods_dont_overlap() {
        let a = period((2025, 1, 1), (2025, 1, 3));
        let b = period((2025, 2, 1), (2025, 2, 3));

        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn nights() {
        assert_eq!(period((2025, 1, 1), (2025, 1, 2)).nights(), 1);
        assert_eq!(period((2025, 1, 1), (2025, 1, 5)).nights(), 4);
        assert_eq!(period((2025, 1, 28), (2025, 2, 3)).nights(), 6);
    }

    #[test]
    fn only_cancelled_releases_rooms() {
        assert!(Status::Pending.reserves_rooms());
        assert!(Status::Confirmed.reserves_rooms());
        assert!(!Status::Cancelled.reserves_rooms());
    }
}
