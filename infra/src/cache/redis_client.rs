//! Redis client shared by the cluster key store and the session store
//!
//! One multiplexed connection serves the whole process; clones share it.
//! Connecting and every command are retried on transient failures with a
//! doubling delay capped by [`RetryPolicy::max_delay_ms`]. A single command
//! attempt never outlives [`RetryPolicy::command_timeout_ms`].

use std::future::Future;
use std::time::Duration;

use redis::{
    aio::MultiplexedConnection, AsyncCommands, Client, IntoConnectionInfo, RedisError,
    RedisResult,
};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::cache::CacheConfig;
use crate::InfrastructureError;

/// How often and how patiently to retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts in total, including the first
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Upper bound for a single command attempt; a timeout counts as retriable
    pub command_timeout_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 5000,
            command_timeout_ms: 2000,
        }
    }
}

impl RetryPolicy {
    /// Pause after the `attempt`-th failure (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u64
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u64::MAX);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms))
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms.max(1))
    }
}

/// Redis client with retry
#[derive(Clone)]
pub struct RedisClient {
    connection: MultiplexedConnection,
    config: CacheConfig,
    retry: RetryPolicy,
}

impl RedisClient {
    /// Connect with the default retry policy
    ///
    /// # Example
    /// ```no_run
    /// use ta_infra::cache::{CacheConfig, RedisClient};
    ///
    /// async fn connect() -> Result<RedisClient, Box<dyn std::error::Error>> {
    ///     let config = CacheConfig::new("redis://localhost:6379").with_prefix("cluster-a");
    ///     Ok(RedisClient::new(config).await?)
    /// }
    /// ```
    pub async fn new(config: CacheConfig) -> Result<Self, InfrastructureError> {
        Self::with_retry_policy(config, RetryPolicy::default()).await
    }

    pub async fn with_retry_policy(
        config: CacheConfig,
        retry: RetryPolicy,
    ) -> Result<Self, InfrastructureError> {
        info!(
            url = %mask_url(&config.url),
            database = config.database,
            "Connecting to Redis"
        );

        let mut connection_info = config
            .url
            .as_str()
            .into_connection_info()
            .map_err(|e| InfrastructureError::Config(format!("Invalid Redis URL: {}", e)))?;
        if config.database != 0 {
            connection_info.redis.db = i64::from(config.database);
        }
        let client = Client::open(connection_info)
            .map_err(|e| InfrastructureError::Config(format!("Invalid Redis URL: {}", e)))?;

        let connect_timeout = Duration::from_secs(config.connection_timeout.max(1));
        let mut attempt = 0;
        let connection = loop {
            attempt += 1;
            let attempt_result =
                timeout(connect_timeout, client.get_multiplexed_async_connection()).await;
            let result = match attempt_result {
                Ok(result) => result,
                Err(_) => Err(timed_out("connection timed out")),
            };

            match result {
                Ok(connection) => break connection,
                Err(e) if attempt < retry.max_attempts => {
                    let delay = retry.delay_after(attempt);
                    warn!(
                        attempt,
                        max_attempts = retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Redis connection failed, retrying"
                    );
                    sleep(delay).await;
                }
                Err(e) => {
                    error!(attempt, error = %e, "Giving up connecting to Redis");
                    return Err(InfrastructureError::Cache(e));
                }
            }
        };

        info!(attempt, "Connected to Redis");
        Ok(Self {
            connection,
            config,
            retry,
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Apply the configured namespace to a key
    pub fn key(&self, key: &str) -> String {
        self.config.make_key(key)
    }

    pub async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        expiry_seconds: u64,
    ) -> Result<(), InfrastructureError> {
        debug!(key, expiry_seconds, "SETEX");
        self.run("SETEX", key, |mut conn| {
            let (key, value) = (key.to_owned(), value.to_owned());
            async move { conn.set_ex::<_, _, ()>(key, value, expiry_seconds).await }
        })
        .await
    }

    /// `None` if absent or expired
    pub async fn get(&self, key: &str) -> Result<Option<String>, InfrastructureError> {
        self.run("GET", key, |mut conn| {
            let key = key.to_owned();
            async move { conn.get::<_, Option<String>>(key).await }
        })
        .await
    }

    /// `true` if something was removed
    pub async fn delete(&self, key: &str) -> Result<bool, InfrastructureError> {
        let removed = self
            .run("DEL", key, |mut conn| {
                let key = key.to_owned();
                async move { conn.del::<_, u32>(key).await }
            })
            .await?;
        Ok(removed > 0)
    }

    /// Remaining lifetime in seconds; `None` if absent or persistent
    pub async fn ttl(&self, key: &str) -> Result<Option<i64>, InfrastructureError> {
        let ttl = self
            .run("TTL", key, |mut conn| {
                let key = key.to_owned();
                async move { conn.ttl::<_, i64>(key).await }
            })
            .await?;
        Ok((ttl >= 0).then_some(ttl))
    }

    pub async fn health_check(&self) -> Result<bool, InfrastructureError> {
        let reply = self
            .run("PING", "", |mut conn| async move {
                redis::cmd("PING").query_async::<_, String>(&mut conn).await
            })
            .await?;
        if reply != "PONG" {
            warn!(reply = %reply, "Unexpected PING reply");
        }
        Ok(reply == "PONG")
    }

    async fn run<T, F, Fut>(
        &self,
        command: &'static str,
        key: &str,
        operation: F,
    ) -> Result<T, InfrastructureError>
    where
        F: Fn(MultiplexedConnection) -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let attempt_result =
                timeout(self.retry.command_timeout(), operation(self.connection.clone())).await;
            let result = match attempt_result {
                Ok(result) => result,
                Err(_) => Err(timed_out("command timed out")),
            };
            match result {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.retry.max_attempts && is_retriable_error(&e) => {
                    let delay = self.retry.delay_after(attempt);
                    warn!(
                        command,
                        key,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Redis command failed, retrying"
                    );
                    sleep(delay).await;
                }
                Err(e) => {
                    error!(command, key, attempt, error = %e, "Redis command failed");
                    return Err(InfrastructureError::Cache(e));
                }
            }
        }
    }
}

pub(crate) fn timed_out(message: &'static str) -> RedisError {
    RedisError::from(std::io::Error::new(std::io::ErrorKind::TimedOut, message))
}

/// Transient failures worth another attempt
pub(crate) fn is_retriable_error(error: &RedisError) -> bool {
    matches!(
        error.kind(),
        redis::ErrorKind::IoError
            | redis::ErrorKind::ClientError
            | redis::ErrorKind::BusyLoadingError
            | redis::ErrorKind::TryAgain
    )
}

/// Replace the credentials of a Redis URL before it is logged
pub(crate) fn mask_url(url: &str) -> String {
    let (Some(scheme_end), Some(at)) = (url.find("://"), url.rfind('@')) else {
        return url.to_string();
    };
    if at < scheme_end {
        return url.to_string();
    }
    format!("{}****{}", &url[..scheme_end + 3], &url[at..])
}
