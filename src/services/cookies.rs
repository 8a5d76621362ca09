//! Request cookie jar seen through the [`KeyValueStore`] interface

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{
    error::{AppError, AppResult},
    services::store::KeyValueStore,
};

/// Browser cookies of the current request
///
/// Reads see the request cookies plus whatever was written during the
/// request. A TTL becomes `Max-Age`; no TTL gives a session cookie.
#[derive(Clone)]
pub struct CookieStore {
    jar: Arc<Mutex<CookieJar>>,
    secure: bool,
}

impl CookieStore {
    pub fn new(jar: CookieJar, secure: bool) -> Self {
        Self {
            jar: Arc::new(Mutex::new(jar)),
            secure,
        }
    }

    /// Jar to return with the response so the browser applies the writes
    pub fn into_jar(self) -> CookieJar {
        match self.jar.lock() {
            Ok(jar) => jar.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn update(&self, f: impl FnOnce(CookieJar) -> CookieJar) -> AppResult<()> {
        let mut jar = self
            .jar
            .lock()
            .map_err(|_| AppError::Storage("cookie jar lock poisoned".to_string()))?;
        *jar = f(jar.clone());
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for CookieStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let jar = self
            .jar
            .lock()
            .map_err(|_| AppError::Storage("cookie jar lock poisoned".to_string()))?;
        Ok(jar.get(key).map(|c| c.value().to_string()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()> {
        let mut cookie = Cookie::build((key.to_string(), value.to_string()))
            .path("/")
            .same_site(SameSite::Lax)
            .secure(self.secure);
        if let Some(ttl) = ttl {
            cookie = cookie.max_age(time::Duration::seconds(ttl.as_secs() as i64));
        }
        self.update(|jar| jar.add(cookie))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let removal = Cookie::build((key.to_string(), String::new())).path("/");
        self.update(|jar| jar.remove(removal))
    }
}
