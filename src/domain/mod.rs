pub mod auth;
pub mod media;
pub mod shared;
pub mod user;
