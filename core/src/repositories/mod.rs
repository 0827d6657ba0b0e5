pub mod account;
pub mod cluster_key;
pub mod session;

pub use account::{AcceptAllAccounts, AccountValidator, InMemoryAccountValidator};
pub use cluster_key::{ClusterKeyStore, InMemoryClusterKeyStore};
pub use session::{InMemorySessionStore, SessionStore};
