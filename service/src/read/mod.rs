//! Read entities definitions.

pub mod booking;
pub mod stay;
pub mod user;

pub use self::stay::Availability;
