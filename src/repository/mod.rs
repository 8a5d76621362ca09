//! Repository layer for database operations

pub mod popups;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub popups: popups::PopupsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            popups: popups::PopupsRepository::new(pool.clone()),
            pool,
        }
    }
}
