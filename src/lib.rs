//! P49 ENA association website backend
//!
//! Serves the unique-visitor counters (cookie-consent gated) and the pop-up
//! announcements shown to visitors, plus the dashboard endpoints used by
//! administrators to manage those pop-ups.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use api::create_router;
pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
