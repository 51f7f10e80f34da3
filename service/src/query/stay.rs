//! [`Query`] collection related to a single [`Stay`].

use common::operations::By;

use crate::{
    domain::{booking, stay, Stay},
    read,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Stay`] by its [`stay::Id`].
pub type ById = DatabaseQuery<By<Option<Stay>, stay::Id>>;

/// Queries a [`Stay`] by its [`stay::Slug`].
pub type BySlug = DatabaseQuery<By<Option<Stay>, stay::Slug>>;

/// Queries [`read::stay::RoomsBooked`] of a [`Stay`] over a
/// [`booking::Period`].
pub type RoomsBooked =
    DatabaseQuery<By<read::stay::RoomsBooked, (stay::Id, booking::Period)>>;
