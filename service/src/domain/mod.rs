//! Domain definitions.

pub mod booking;
pub mod stay;
pub mod user;

pub use self::{booking::Booking, stay::Stay, user::User};
