//! Pop-up announcement model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Intended viewers of a popup
///
/// Values written by older dashboard versions are kept verbatim in `Other`
/// and never match anyone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TargetAudience {
    AllVisitors,
    AllUsers,
    AdminsOnly,
    EditorsOnly,
    Other(String),
}

impl TargetAudience {
    pub fn as_str(&self) -> &str {
        match self {
            TargetAudience::AllVisitors => "all_visitors",
            TargetAudience::AllUsers => "all_users",
            TargetAudience::AdminsOnly => "admins_only",
            TargetAudience::EditorsOnly => "editors_only",
            TargetAudience::Other(s) => s.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, TargetAudience::Other(_))
    }
}

impl std::fmt::Display for TargetAudience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for TargetAudience {
    fn from(s: String) -> Self {
        match s.as_str() {
            "all_visitors" => TargetAudience::AllVisitors,
            "all_users" => TargetAudience::AllUsers,
            "admins_only" => TargetAudience::AdminsOnly,
            "editors_only" => TargetAudience::EditorsOnly,
            _ => TargetAudience::Other(s),
        }
    }
}

impl From<&str> for TargetAudience {
    fn from(s: &str) -> Self {
        TargetAudience::from(s.to_string())
    }
}

impl From<TargetAudience> for String {
    fn from(audience: TargetAudience) -> Self {
        audience.as_str().to_string()
    }
}

/// Visual flavour of a popup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PopupType {
    Info,
    Announcement,
    Event,
    Warning,
}

impl PopupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PopupType::Info => "info",
            PopupType::Announcement => "announcement",
            PopupType::Event => "event",
            PopupType::Warning => "warning",
        }
    }
}

impl From<&str> for PopupType {
    fn from(s: &str) -> Self {
        match s {
            "announcement" => PopupType::Announcement,
            "event" => PopupType::Event,
            "warning" => PopupType::Warning,
            _ => PopupType::Info,
        }
    }
}

/// Screen placement hint for the front-end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PopupPosition {
    Center,
    BottomRight,
    BottomLeft,
    Top,
}

impl PopupPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            PopupPosition::Center => "center",
            PopupPosition::BottomRight => "bottom_right",
            PopupPosition::BottomLeft => "bottom_left",
            PopupPosition::Top => "top",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "center" => Some(PopupPosition::Center),
            "bottom_right" => Some(PopupPosition::BottomRight),
            "bottom_left" => Some(PopupPosition::BottomLeft),
            "top" => Some(PopupPosition::Top),
            _ => None,
        }
    }
}

/// Internal row structure for database queries (with String fields)
#[derive(Debug, Clone, FromRow)]
pub struct PopupRow {
    id: Uuid,
    title: String,
    message: Option<String>,
    popup_type: String,
    target_audience: String,
    is_active: bool,
    created_date: DateTime<Utc>,
    image_url: Option<String>,
    author: String,
    position: Option<String>,
}

impl From<PopupRow> for PopupRecord {
    fn from(row: PopupRow) -> Self {
        PopupRecord {
            id: row.id,
            title: row.title,
            message: row.message,
            popup_type: PopupType::from(row.popup_type.as_str()),
            target_audience: TargetAudience::from(row.target_audience),
            is_active: row.is_active,
            created_date: row.created_date,
            image_url: row.image_url,
            author: row.author,
            position: row.position.as_deref().and_then(PopupPosition::parse),
        }
    }
}

/// Popup record as edited in the dashboard
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PopupRecord {
    pub id: Uuid,
    pub title: String,
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub popup_type: PopupType,
    /// all_visitors, all_users, admins_only or editors_only
    #[schema(value_type = String)]
    pub target_audience: TargetAudience,
    #[serde(rename = "isActive")]
    pub is_active: bool,
    pub created_date: DateTime<Utc>,
    pub image_url: Option<String>,
    pub author: String,
    pub position: Option<PopupPosition>,
}

/// Create popup request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePopup {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub popup_type: Option<PopupType>,
    #[schema(value_type = String)]
    pub target_audience: TargetAudience,
    #[serde(rename = "isActive")]
    pub is_active: Option<bool>,
    #[validate(url)]
    pub image_url: Option<String>,
    pub position: Option<PopupPosition>,
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Update popup request
///
/// Omitted fields are left unchanged. `message`, `image_url` and `position`
/// are cleared by sending `null`.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePopup {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, nullable)]
    pub message: Option<Option<String>>,
    #[serde(rename = "type")]
    pub popup_type: Option<PopupType>,
    #[schema(value_type = Option<String>)]
    pub target_audience: Option<TargetAudience>,
    #[serde(rename = "isActive")]
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(url)]
    #[schema(value_type = Option<String>, nullable)]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<PopupPosition>, nullable)]
    pub position: Option<Option<PopupPosition>>,
}

/// What the popup-rendering component should show
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PopupDisplay {
    pub current_popup: Option<PopupRecord>,
    pub is_open: bool,
}

impl PopupDisplay {
    pub fn closed() -> Self {
        Self {
            current_popup: None,
            is_open: false,
        }
    }

    pub fn open(popup: PopupRecord) -> Self {
        Self {
            current_popup: Some(popup),
            is_open: true,
        }
    }
}
