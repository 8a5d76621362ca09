//! Cookie consent endpoints

use axum::{extract::State, Json};
use axum_extra::extract::cookie::CookieJar;
use chrono::Local;

use crate::{
    error::AppResult,
    models::visitor::{ConsentResponse, ConsentState, UpdateConsent},
    services::consent,
};

use super::cookie_store;

/// Current consent choices of this browser
#[utoipa::path(
    get,
    path = "/consent",
    tag = "consent",
    responses(
        (status = 200, description = "Consent state", body = ConsentState)
    )
)]
pub async fn get_consent(
    State(state): State<crate::AppState>,
    jar: CookieJar,
) -> Json<ConsentState> {
    let cookies = cookie_store(&state, jar);
    Json(consent::read_consent(&cookies).await)
}

/// Record the consent banner answer
///
/// Visitor stats are refreshed with the new consent right away.
#[utoipa::path(
    put,
    path = "/consent",
    tag = "consent",
    request_body = UpdateConsent,
    responses(
        (status = 200, description = "Consent recorded", body = ConsentResponse)
    )
)]
pub async fn update_consent(
    State(state): State<crate::AppState>,
    jar: CookieJar,
    Json(update): Json<UpdateConsent>,
) -> AppResult<(CookieJar, Json<ConsentResponse>)> {
    let cookies = cookie_store(&state, jar);
    let consent = consent::write_consent(&cookies, update).await?;

    let stats = state
        .services
        .visitors
        .refresh_stats(&cookies, consent, Local::now())
        .await;

    Ok((cookies.into_jar(), Json(ConsentResponse { consent, stats })))
}
