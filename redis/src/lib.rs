//! # Boxoffice Redis
//!
//! Production [`EphemeralStore`] implementation backed by Redis.
//!
//! Locks map to `SET NX EX`, hold records to `SET EX`, and the bulk hold
//! read to `MGET`. Every key the engine writes carries a TTL, so the
//! keyspace is self-expiring and nothing here needs a background sweeper.
//!
//! A [`ConnectionManager`] multiplexes all commands over one connection
//! and reconnects on failure, so [`RedisStore`] is cheap to clone and safe
//! to share across the concurrent request tasks that invoke the engine.

use boxoffice_core::error::StoreError;
use boxoffice_core::store::EphemeralStore;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::env;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: String,
    /// Connection timeout in seconds
    pub connect_timeout: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: 30,
        }
    }
}

impl RedisConfig {
    /// Load configuration from environment variables (`REDIS_URL`,
    /// `REDIS_CONNECT_TIMEOUT`), falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: env::var("REDIS_URL").unwrap_or(defaults.url),
            connect_timeout: env::var("REDIS_CONNECT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.connect_timeout),
        }
    }
}

/// Redis-backed ephemeral store.
#[derive(Clone)]
pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis and build the store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if the URL is invalid or the
    /// initial connection cannot be established within the configured
    /// timeout.
    pub async fn connect(config: &RedisConfig) -> Result<Self, StoreError> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| StoreError::Connection(format!("invalid Redis URL: {e}")))?;

        let manager = tokio::time::timeout(
            Duration::from_secs(config.connect_timeout),
            ConnectionManager::new(client),
        )
        .await
        .map_err(|_| {
            StoreError::Connection(format!(
                "Redis connection timed out after {}s",
                config.connect_timeout
            ))
        })?
        .map_err(connection_error)?;

        tracing::debug!(url = %config.url, "Connected to Redis");
        Ok(Self { manager })
    }

    /// Build a store from an already-established connection manager.
    #[must_use]
    pub fn from_manager(manager: ConnectionManager) -> Self {
        Self { manager }
    }
}

fn connection_error(error: redis::RedisError) -> StoreError {
    StoreError::Connection(error.to_string())
}

/// Redis expiries are whole seconds with a one-second minimum; a
/// sub-second TTL must round up rather than become `EX 0`, which Redis
/// rejects.
fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

impl EphemeralStore for RedisStore {
    fn set_if_absent(
        &self,
        key: String,
        value: String,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<bool, StoreError>> + Send + '_>> {
        let mut conn = self.manager.clone();
        Box::pin(async move {
            // SET NX EX replies "OK" when the key was created, Nil otherwise.
            let reply: Option<String> = redis::cmd("SET")
                .arg(&key)
                .arg(&value)
                .arg("NX")
                .arg("EX")
                .arg(ttl_seconds(ttl))
                .query_async(&mut conn)
                .await
                .map_err(connection_error)?;
            Ok(reply.is_some())
        })
    }

    fn set(
        &self,
        key: String,
        value: String,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        let mut conn = self.manager.clone();
        Box::pin(async move {
            conn.set_ex::<_, _, ()>(&key, &value, ttl_seconds(ttl))
                .await
                .map_err(connection_error)
        })
    }

    fn get(
        &self,
        key: String,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, StoreError>> + Send + '_>> {
        let mut conn = self.manager.clone();
        Box::pin(async move { conn.get(&key).await.map_err(connection_error) })
    }

    fn multi_get(
        &self,
        keys: Vec<String>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Option<String>>, StoreError>> + Send + '_>> {
        let mut conn = self.manager.clone();
        Box::pin(async move {
            if keys.is_empty() {
                return Ok(Vec::new());
            }

            // Built as an explicit MGET so the reply is always the
            // positional array form, including for a single key.
            let mut cmd = redis::cmd("MGET");
            for key in &keys {
                cmd.arg(key);
            }
            cmd.query_async(&mut conn).await.map_err(connection_error)
        })
    }

    fn delete(
        &self,
        key: String,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        let mut conn = self.manager.clone();
        Box::pin(async move { conn.del::<_, ()>(&key).await.map_err(connection_error) })
    }
}
