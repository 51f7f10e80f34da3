//! [`Query`] collection related to the multiple [`Stay`]s.

use common::operations::By;

use crate::read;
#[cfg(doc)]
use crate::{domain::Stay, Query};

use super::DatabaseQuery;

/// Queries a list of [`Stay`]s.
pub type List =
    DatabaseQuery<By<read::stay::list::Page, read::stay::list::Selector>>;

/// Queries total count of [`Stay`] list items.
pub type TotalCount = DatabaseQuery<By<read::stay::list::TotalCount, ()>>;
