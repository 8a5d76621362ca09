//! Visitor counter and cookie consent models

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Cookie names holding the visitor's consent choices
pub const COOKIE_CONSENT: &str = "cookie_consent";
pub const COOKIES_FUNCTIONAL: &str = "cookies_functional";
pub const COOKIES_ANALYTICS: &str = "cookies_analytics";
pub const COOKIES_MARKETING: &str = "cookies_marketing";

/// Unique-visitor counters as displayed on the site
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitorStats {
    pub monthly_visitors: u64,
    pub total_visitors: u64,
    /// Current analytics consent state
    pub is_tracking: bool,
}

/// Consent choices of a browser
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConsentState {
    /// The banner has been answered
    pub given: bool,
    pub functional: bool,
    pub analytics: bool,
    pub marketing: bool,
}

impl ConsentState {
    /// Analytics consent gates every counter write
    pub fn allows_tracking(&self) -> bool {
        self.analytics
    }
}

/// Consent banner answer
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct UpdateConsent {
    pub functional: bool,
    pub analytics: bool,
    pub marketing: bool,
}

/// Response of a consent update: new state and the stats it produced
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct ConsentResponse {
    pub consent: ConsentState,
    pub stats: VisitorStats,
}
