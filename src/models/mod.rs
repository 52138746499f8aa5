pub mod account;
pub mod bookings;
pub mod catalog;
pub mod facebook_auth;
pub mod google_auth;
pub mod package;
pub mod profile;
pub mod rating;
pub mod target;
