//! Key-value storage abstraction
//!
//! Every piece of visitor state (cookies, long-lived counters, per-session
//! flags) goes through [`KeyValueStore`] so the tracking and popup rules can be
//! exercised without a browser or a Redis server.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use async_trait::async_trait;

use crate::error::{AppError, AppResult};

/// Minimal get/set/delete store with optional expiry
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Store `value` under `key`; `ttl = None` means no explicit expiry
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()>;

    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Add `member` to the set at `key`; `false` when it was already present
    ///
    /// The default goes through `get`/`set` and is only safe for stores owned
    /// by a single request. Shared stores override it with an atomic version.
    async fn add_unique(&self, key: &str, member: &str) -> AppResult<bool> {
        let mut members = decode_members(key, self.get(key).await?)?;
        if members.iter().any(|m| m == member) {
            return Ok(false);
        }
        members.push(member.to_string());
        self.set(key, &encode_members(&members)?, None).await?;
        Ok(true)
    }

    /// Increment the integer at `key` and return the new value
    async fn incr(&self, key: &str) -> AppResult<u64> {
        let next = parse_counter(self.get(key).await?.as_deref()) + 1;
        self.set(key, &next.to_string(), None).await?;
        Ok(next)
    }
}

/// Set members are kept as a JSON array of strings
fn decode_members(key: &str, raw: Option<String>) -> AppResult<Vec<String>> {
    match raw {
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|e| AppError::Storage(format!("Corrupt set {}: {}", key, e))),
        None => Ok(Vec::new()),
    }
}

fn encode_members(members: &[String]) -> AppResult<String> {
    serde_json::to_string(members)
        .map_err(|e| AppError::Internal(format!("Failed to encode set: {}", e)))
}

/// Missing or unparseable counters read as zero
pub fn parse_counter(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()> {
        (**self).set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        (**self).delete(key).await
    }

    async fn add_unique(&self, key: &str, member: &str) -> AppResult<bool> {
        (**self).add_unique(key, member).await
    }

    async fn incr(&self, key: &str) -> AppResult<u64> {
        (**self).incr(key).await
    }
}

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

/// In-process store with lazy expiry
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, HashMap<String, Entry>>> {
        self.entries
            .lock()
            .map_err(|_| AppError::Storage("memory store lock poisoned".to_string()))
    }
}

/// Live value of `key`, dropping it when expired
fn live_value<'a>(entries: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a str> {
    let expired = entries
        .get(key)
        .is_some_and(|entry| entry.expires_at.is_some_and(|at| at <= Instant::now()));
    if expired {
        entries.remove(key);
    }
    entries.get(key).map(|e| e.value.as_str())
}

fn put(entries: &mut HashMap<String, Entry>, key: &str, value: String) {
    entries.insert(
        key.to_string(),
        Entry {
            value,
            expires_at: None,
        },
    );
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut entries = self.lock()?;
        Ok(live_value(&mut entries, key).map(str::to_string))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.lock()?.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    async fn add_unique(&self, key: &str, member: &str) -> AppResult<bool> {
        let mut entries = self.lock()?;
        let mut members = decode_members(key, live_value(&mut entries, key).map(str::to_string))?;
        if members.iter().any(|m| m == member) {
            return Ok(false);
        }
        members.push(member.to_string());
        put(&mut entries, key, encode_members(&members)?);
        Ok(true)
    }

    async fn incr(&self, key: &str) -> AppResult<u64> {
        let mut entries = self.lock()?;
        let next = parse_counter(live_value(&mut entries, key)) + 1;
        put(&mut entries, key, next.to_string());
        Ok(next)
    }
}

/// Short-lived flags that must not outlive the browser session
///
/// Writes never carry a TTL: on a cookie-backed store this yields session
/// cookies, which the browser drops when the session ends.
#[derive(Clone)]
pub struct SessionStore<S> {
    inner: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub async fn mark(&self, key: &str) -> AppResult<()> {
        self.inner.set(key, "true", None).await
    }

    pub async fn is_marked(&self, key: &str) -> AppResult<bool> {
        Ok(self.inner.get(key).await?.as_deref() == Some("true"))
    }

    pub async fn clear(&self, key: &str) -> AppResult<()> {
        self.inner.delete(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a").await.unwrap(), None);

        store.set("a", "1", None).await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));

        store.set("a", "2", None).await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("2"));

        store.delete("a").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_expiry() {
        let store = MemoryStore::new();
        store.set("short", "x", Some(Duration::from_millis(10))).await.unwrap();
        store.set("long", "y", Some(Duration::from_secs(3600))).await.unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(store.get("short").await.unwrap(), None);
        assert_eq!(store.get("long").await.unwrap().as_deref(), Some("y"));
    }

    #[tokio::test]
    async fn test_session_store_flags() {
        let session = SessionStore::new(MemoryStore::new());
        assert!(!session.is_marked("popup_shown_1").await.unwrap());

        session.mark("popup_shown_1").await.unwrap();
        assert!(session.is_marked("popup_shown_1").await.unwrap());

        session.clear("popup_shown_1").await.unwrap();
        assert!(!session.is_marked("popup_shown_1").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_store_sets_and_counters() {
        let store = MemoryStore::new();
        assert!(store.add_unique("ids", "a").await.unwrap());
        assert!(store.add_unique("ids", "b").await.unwrap());
        assert!(!store.add_unique("ids", "a").await.unwrap());
        assert_eq!(store.get("ids").await.unwrap().as_deref(), Some(r#"["a","b"]"#));

        assert_eq!(store.incr("n").await.unwrap(), 1);
        assert_eq!(store.incr("n").await.unwrap(), 2);
        assert_eq!(store.get("n").await.unwrap().as_deref(), Some("2"));

        store.set("bad", "not json", None).await.unwrap();
        assert!(matches!(
            store.add_unique("bad", "a").await,
            Err(AppError::Storage(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_memory_store_concurrent_inserts() {
        let store = MemoryStore::new();
        let mut handles = Vec::new();
        for i in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                // Every member is offered twice
                let first = store.add_unique("ids", &format!("m{}", i % 25)).await.unwrap();
                if first {
                    store.incr("count").await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.get("count").await.unwrap().as_deref(), Some("25"));
        let ids: Vec<String> =
            serde_json::from_str(&store.get("ids").await.unwrap().unwrap()).unwrap();
        assert_eq!(ids.len(), 25);
    }

    #[tokio::test]
    async fn test_arc_dyn_store() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store.set("k", "v", None).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
