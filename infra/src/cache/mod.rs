//! Cache module for Redis-based storage
//!
//! This module provides the Redis client (multiplexed connection, retry with
//! exponential backoff) and the Redis-backed implementations of the cluster
//! key store and the session store.

pub mod cluster_key_cache;
pub mod redis_client;
pub mod session_store;


pub use cluster_key_cache::RedisClusterKeyStore;
pub use redis_client::{RedisClient, RetryPolicy};
pub use session_store::RedisSessionStore;

// Re-export commonly used types
pub use ta_shared::config::CacheConfig;
