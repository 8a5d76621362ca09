//! Popups repository

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::popup::{CreatePopup, PopupRecord, PopupRow, PopupType, UpdatePopup},
    services::popup_display::PopupSource,
};

const COLUMNS: &str = "id, title, message, popup_type, target_audience, is_active, \
                       created_date, image_url, author, position";

#[derive(Clone)]
pub struct PopupsRepository {
    pool: Pool<Postgres>,
}

impl PopupsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List all popups, newest first
    pub async fn list(&self) -> AppResult<Vec<PopupRecord>> {
        let rows = sqlx::query_as::<_, PopupRow>(&format!(
            "SELECT {} FROM popups ORDER BY created_date DESC",
            COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(PopupRecord::from).collect())
    }

    /// Active popups, newest first
    pub async fn list_active(&self) -> AppResult<Vec<PopupRecord>> {
        let rows = sqlx::query_as::<_, PopupRow>(&format!(
            "SELECT {} FROM popups WHERE is_active = TRUE ORDER BY created_date DESC",
            COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(PopupRecord::from).collect())
    }

    /// Get popup by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<PopupRecord> {
        sqlx::query_as::<_, PopupRow>(&format!("SELECT {} FROM popups WHERE id = $1", COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(PopupRecord::from)
            .ok_or_else(|| AppError::NotFound(format!("Popup {} not found", id)))
    }

    /// Create a popup
    pub async fn create(&self, data: &CreatePopup, author: &str) -> AppResult<PopupRecord> {
        let row = sqlx::query_as::<_, PopupRow>(&format!(
            r#"
            INSERT INTO popups (
                id, title, message, popup_type, target_audience,
                is_active, created_date, image_url, author, position
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&data.title)
        .bind(&data.message)
        .bind(data.popup_type.unwrap_or(PopupType::Info).as_str())
        .bind(data.target_audience.as_str())
        .bind(data.is_active.unwrap_or(true))
        .bind(Utc::now())
        .bind(&data.image_url)
        .bind(author)
        .bind(data.position.map(|p| p.as_str()))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    /// Update a popup
    pub async fn update(&self, id: Uuid, data: &UpdatePopup) -> AppResult<PopupRecord> {
        let mut sets = Vec::new();
        let mut idx = 2;

        macro_rules! add_f {
            ($field:expr, $name:expr) => {
                if $field.is_some() { sets.push(format!("{} = ${}", $name, idx)); idx += 1; }
            };
        }

        add_f!(data.title, "title");
        add_f!(data.message, "message");
        add_f!(data.popup_type, "popup_type");
        add_f!(data.target_audience, "target_audience");
        add_f!(data.is_active, "is_active");
        add_f!(data.image_url, "image_url");
        add_f!(data.position, "position");

        if sets.is_empty() {
            return self.get_by_id(id).await;
        }

        let query = format!(
            "UPDATE popups SET {} WHERE id = $1 RETURNING {}",
            sets.join(", "),
            COLUMNS
        );

        let mut builder = sqlx::query_as::<_, PopupRow>(&query).bind(id);

        macro_rules! bind_f {
            ($value:expr) => {
                if let Some(val) = $value { builder = builder.bind(val); }
            };
        }

        // Nullable columns bind `Option`, so `Some(None)` writes NULL
        bind_f!(data.title.as_deref());
        bind_f!(data.message.as_ref().map(|m| m.as_deref()));
        bind_f!(data.popup_type.map(|t| t.as_str()));
        bind_f!(data.target_audience.as_ref().map(|a| a.as_str().to_string()));
        bind_f!(data.is_active);
        bind_f!(data.image_url.as_ref().map(|u| u.as_deref()));
        bind_f!(data.position.map(|p| p.map(|p| p.as_str())));

        builder
            .fetch_optional(&self.pool)
            .await?
            .map(PopupRecord::from)
            .ok_or_else(|| AppError::NotFound(format!("Popup {} not found", id)))
    }

    /// Delete a popup
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM popups WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Popup {} not found", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl PopupSource for PopupsRepository {
    async fn list_active(&self) -> AppResult<Vec<PopupRecord>> {
        PopupsRepository::list_active(self).await
    }
}
