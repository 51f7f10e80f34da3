//! GraphQL API definitions.

pub mod booking;
mod mutation;
mod query;
pub mod scalar;
pub mod stay;
pub mod user;

use crate::{define_error, Context, Error};

pub use self::{
    booking::Booking, mutation::Mutation, query::Query, stay::Stay, user::User,
};

/// Converts a GraphQL `Int` argument counting guests or rooms.
///
/// # Errors
///
/// Errors if the provided number doesn't fit the counted range, negatives
/// included.
pub(crate) fn count(num: i32) -> Result<u16, Error> {
    num.try_into().map_err(|_| CountError::OutOfRange.into())
}

/// GraphQL schema.
pub type Schema = juniper::RootNode<
    'static,
    Query,
    Mutation,
    juniper::EmptySubscription<Context>,
>;

define_error! {
    enum PaginationError {
        #[code = "AMBIGUOUS_PAGINATION_ARGUMENTS"]
        #[status = BAD_REQUEST]
        #[message = "Ambiguous pagination arguments"]
        Ambiguous,
    }
}

define_error! {
    enum PeriodError {
        #[code = "INVALID_PERIOD"]
        #[status = BAD_REQUEST]
        #[message = "`check_out` must be strictly after `check_in`"]
        Invalid,
    }
}

define_error! {
    enum CountError {
        #[code = "COUNT_OUT_OF_RANGE"]
        #[status = BAD_REQUEST]
        #[message = "Count must be a non-negative 16-bit number"]
        OutOfRange,
    }
}

#[cfg(test)]
mod spec {
    use super::count;

    #[test]
    fn count_accepts_non_negatives() {
        assert_eq!(count(0).unwrap(), 0);
        assert_eq!(count(3).unwrap(), 3);
    }

    #[test]
    fn count_rejects_negatives() {
        let err = count(-1).unwrap_err();
        assert_eq!(err.code, "COUNT_OUT_OF_RANGE");
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn count_rejects_overflow() {
        assert_eq!(count(70_000).unwrap_err().code, "COUNT_OUT_OF_RANGE");
    }
}
