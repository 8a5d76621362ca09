//! Data models for the P49 server

pub mod popup;
pub mod user;
pub mod visitor;

// Re-export commonly used types
pub use popup::{PopupDisplay, PopupRecord, PopupType, TargetAudience};
pub use user::{Role, UserClaims};
pub use visitor::{ConsentState, VisitorStats};
