//! API handlers for the P49 REST endpoints

pub mod consent;
pub mod health;
pub mod openapi;
pub mod popups;
pub mod visits;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post, put},
    Router,
};
use axum_extra::{
    extract::cookie::CookieJar,
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    error::AppError, models::user::UserClaims, services::cookies::CookieStore, AppState,
};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Authentication("Missing authorization header".to_string()))?;

        let claims = UserClaims::from_token(bearer.token(), &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Signed-in member if any; a bad token is treated as anonymous
pub struct OptionalUser(pub Option<UserClaims>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match AuthenticatedUser::from_request_parts(parts, state).await {
            Ok(AuthenticatedUser(claims)) => Ok(OptionalUser(Some(claims))),
            Err(e) => {
                if parts.headers.contains_key(axum::http::header::AUTHORIZATION) {
                    tracing::debug!("Ignoring unusable bearer token: {}", e);
                }
                Ok(OptionalUser(None))
            }
        }
    }
}

/// Cookie store over the request jar with the configured cookie flags
pub(crate) fn cookie_store(state: &AppState, jar: CookieJar) -> CookieStore {
    CookieStore::new(jar, state.config.visitors.secure_cookies)
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Visitor counters
        .route("/visits/refresh", post(visits::refresh_visits))
        .route("/visits/stats", get(visits::get_visit_stats))
        // Cookie consent
        .route("/consent", get(consent::get_consent))
        .route("/consent", put(consent::update_consent))
        // Popups shown to visitors
        .route("/popups/current", get(popups::current_popup))
        .route("/popups/:id/never-show-again", post(popups::never_show_again))
        .route("/popups/:id/close", post(popups::close_popup))
        // Popups dashboard
        .route("/popups", get(popups::list_popups).post(popups::create_popup))
        .route(
            "/popups/:id",
            get(popups::get_popup)
                .put(popups::update_popup)
                .delete(popups::delete_popup),
        )
        .with_state(state);

    let openapi = openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
