//! Visitor counter endpoints

use axum::{extract::State, Json};
use axum_extra::extract::cookie::CookieJar;
use chrono::Local;

use crate::{models::visitor::VisitorStats, services::consent};

use super::cookie_store;

/// Count this browser (if analytics consent is granted) and return the counters
#[utoipa::path(
    post,
    path = "/visits/refresh",
    tag = "visits",
    responses(
        (status = 200, description = "Current visitor counters", body = VisitorStats)
    )
)]
pub async fn refresh_visits(
    State(state): State<crate::AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<VisitorStats>) {
    let cookies = cookie_store(&state, jar);
    let consent = consent::read_consent(&cookies).await;

    let stats = state
        .services
        .visitors
        .refresh_stats(&cookies, consent, Local::now())
        .await;

    (cookies.into_jar(), Json(stats))
}

/// Read-only visitor counters
#[utoipa::path(
    get,
    path = "/visits/stats",
    tag = "visits",
    responses(
        (status = 200, description = "Current visitor counters", body = VisitorStats)
    )
)]
pub async fn get_visit_stats(
    State(state): State<crate::AppState>,
    jar: CookieJar,
) -> Json<VisitorStats> {
    let cookies = cookie_store(&state, jar);
    let consent = consent::read_consent(&cookies).await;

    Json(state.services.visitors.cached_stats(consent, Local::now()).await)
}
