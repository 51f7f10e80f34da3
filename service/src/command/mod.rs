//! [`Command`] definition.

pub mod authorize_user_session;
pub mod create_booking;
pub mod create_stay;
pub mod create_user;
pub mod create_user_session;
pub mod decide_booking;
#[cfg(test)]
pub(crate) mod testing;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_user_session::AuthorizeUserSession,
    create_booking::CreateBooking, create_stay::CreateStay,
    create_user::CreateUser, create_user_session::CreateUserSession,
    decide_booking::DecideBooking,
};
