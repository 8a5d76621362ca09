//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{consent, health, popups, visits};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "P49 API",
        version = "0.3.0",
        description = "P49 ENA association website backend",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Visitor counters
        visits::refresh_visits,
        visits::get_visit_stats,
        // Consent
        consent::get_consent,
        consent::update_consent,
        // Popups
        popups::current_popup,
        popups::never_show_again,
        popups::close_popup,
        popups::list_popups,
        popups::get_popup,
        popups::create_popup,
        popups::update_popup,
        popups::delete_popup,
    ),
    components(
        schemas(
            // Visitors
            crate::models::visitor::VisitorStats,
            crate::models::visitor::ConsentState,
            crate::models::visitor::UpdateConsent,
            crate::models::visitor::ConsentResponse,
            // Popups
            crate::models::popup::PopupRecord,
            crate::models::popup::PopupType,
            crate::models::popup::PopupPosition,
            crate::models::popup::CreatePopup,
            crate::models::popup::UpdatePopup,
            crate::models::popup::PopupDisplay,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "visits", description = "Unique visitor counters"),
        (name = "consent", description = "Cookie consent"),
        (name = "popups", description = "Pop-up announcements")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
