//! Trusted authentication route handlers
//!
//! - Trusted login: turns an identity asserted upstream into trusted credentials
//! - Logout: revokes the credentials the client holds
//! - Me: reports who the middleware authenticated

pub mod login;
pub mod logout;
pub mod me;
