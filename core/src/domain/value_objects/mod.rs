//! Value objects representing immutable domain concepts.

pub mod credentials;
pub mod trusted_user;

// Re-export commonly used types
pub use credentials::{PresentedCookie, PresentedCredentials};
pub use trusted_user::{
    Authentication, CredentialSource, IssuedToken, LoginOutcome, Revocation, TrustedUser,
};
