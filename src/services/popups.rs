//! Popup administration (dashboard)

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::popup::{CreatePopup, PopupRecord, TargetAudience, UpdatePopup},
    repository::Repository,
};

#[derive(Clone)]
pub struct PopupsService {
    repository: Repository,
}

fn check_audience(audience: &TargetAudience) -> AppResult<()> {
    if audience.is_known() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Unknown target audience: {}",
            audience
        )))
    }
}

impl PopupsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<PopupRecord>> {
        self.repository.popups.list().await
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<PopupRecord> {
        self.repository.popups.get_by_id(id).await
    }

    pub async fn create(&self, data: &CreatePopup, author: &str) -> AppResult<PopupRecord> {
        data.validate()?;
        check_audience(&data.target_audience)?;
        let popup = self.repository.popups.create(data, author).await?;
        tracing::info!(popup_id = %popup.id, author = %author, "Popup created");
        Ok(popup)
    }

    pub async fn update(&self, id: Uuid, data: &UpdatePopup) -> AppResult<PopupRecord> {
        data.validate()?;
        if let Some(audience) = &data.target_audience {
            check_audience(audience)?;
        }
        let popup = self.repository.popups.update(id, data).await?;
        tracing::info!(popup_id = %id, "Popup updated");
        Ok(popup)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.repository.popups.delete(id).await?;
        tracing::info!(popup_id = %id, "Popup deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_audience() {
        assert!(check_audience(&TargetAudience::AdminsOnly).is_ok());
        assert!(matches!(
            check_audience(&TargetAudience::from("everyone")),
            Err(AppError::Validation(_))
        ));
    }
}
