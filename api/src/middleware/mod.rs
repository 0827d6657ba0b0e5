pub mod trusted_auth;

pub use trusted_auth::*;
