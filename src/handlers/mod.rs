pub mod admin;
pub mod auth;
pub mod bookings;
pub mod flights;
pub mod passengers;
pub mod payments;
pub mod reference;
pub mod users;
