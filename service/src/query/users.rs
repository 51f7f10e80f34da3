//! [`Query`] collection related to the multiple [`User`]s.

use common::operations::By;

use crate::read;
#[cfg(doc)]
use crate::{domain::User, Query};

use super::DatabaseQuery;

/// Queries total count of [`User`]s.
pub type TotalCount = DatabaseQuery<By<read::user::list::TotalCount, ()>>;
