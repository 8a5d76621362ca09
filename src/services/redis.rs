//! Redis-backed store for the long-lived visitor counters

use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client};

use crate::{
    error::{AppError, AppResult},
    services::store::KeyValueStore,
};

/// Every key is namespaced so the counters can share a Redis instance
const KEY_PREFIX: &str = "p49:";

#[derive(Clone)]
pub struct RedisStore {
    client: Client,
}

impl RedisStore {
    /// Create a new Redis store and check the server answers
    pub async fn new(url: &str) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Storage(format!("Failed to create Redis client: {}", e)))?;

        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Storage(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { client })
    }

    async fn get_connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to get Redis connection: {}", e)))
    }

    fn namespaced(key: &str) -> String {
        format!("{}{}", KEY_PREFIX, key)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(Self::namespaced(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()> {
        let mut conn = self.get_connection().await?;
        let key = Self::namespaced(key);
        match ttl {
            // SET EX rejects 0
            Some(ttl) => {
                conn.set_ex::<_, _, ()>(&key, value, ttl.as_secs().max(1))
                    .await?
            }
            None => conn.set::<_, _, ()>(&key, value).await?,
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut conn = self.get_connection().await?;
        let _: () = conn.del(Self::namespaced(key)).await?;
        Ok(())
    }

    async fn add_unique(&self, key: &str, member: &str) -> AppResult<bool> {
        let mut conn = self.get_connection().await?;
        let added: u64 = conn.sadd(Self::namespaced(key), member).await?;
        Ok(added > 0)
    }

    async fn incr(&self, key: &str) -> AppResult<u64> {
        let mut conn = self.get_connection().await?;
        let value: u64 = conn.incr(Self::namespaced(key), 1).await?;
        Ok(value)
    }
}
