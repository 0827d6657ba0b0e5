//! Cluster key store module.

mod r#trait;
pub use r#trait::ClusterKeyStore;

mod memory;
pub use memory::InMemoryClusterKeyStore;
