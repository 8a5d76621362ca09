//! Business logic services

pub mod consent;
pub mod cookies;
pub mod popup_display;
pub mod popups;
pub mod redis;
pub mod store;
pub mod visitor_tracking;

use std::sync::Arc;

use crate::{
    config::{AppConfig, StorageBackend},
    error::AppResult,
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub repository: Repository,
    pub popups: popups::PopupsService,
    pub popup_display: popup_display::PopupDisplayService,
    pub visitors: visitor_tracking::VisitorTracker,
}

impl Services {
    /// Create all services with the given repository and counter store
    pub fn new(repository: Repository, counters: Arc<dyn store::KeyValueStore>) -> Self {
        Self {
            popup_display: popup_display::PopupDisplayService::new(Arc::new(
                repository.popups.clone(),
            )),
            popups: popups::PopupsService::new(repository.clone()),
            visitors: visitor_tracking::VisitorTracker::new(counters),
            repository,
        }
    }

    /// Open the counter store selected in the configuration
    pub async fn counter_store(config: &AppConfig) -> AppResult<Arc<dyn store::KeyValueStore>> {
        let counters: Arc<dyn store::KeyValueStore> = match config.storage.backend {
            StorageBackend::Memory => {
                tracing::warn!("Visitor counters kept in memory; they reset on restart");
                Arc::new(store::MemoryStore::new())
            }
            StorageBackend::Redis => {
                let redis_store = redis::RedisStore::new(&config.redis.url).await?;
                tracing::info!("Connected to Redis");
                Arc::new(redis_store)
            }
        };
        Ok(counters)
    }
}
