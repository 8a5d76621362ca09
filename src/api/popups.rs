//! Popup endpoints: visitor-facing display and dashboard administration

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::popup::{CreatePopup, PopupDisplay, PopupRecord, UpdatePopup},
    services::store::SessionStore,
};

use super::{cookie_store, AuthenticatedUser, OptionalUser};

/// Popup to show on this page load, if any
///
/// The selected popup is flagged for the browser session before it is returned.
#[utoipa::path(
    get,
    path = "/popups/current",
    tag = "popups",
    responses(
        (status = 200, description = "Popup to display", body = PopupDisplay)
    )
)]
pub async fn current_popup(
    State(state): State<crate::AppState>,
    OptionalUser(claims): OptionalUser,
    jar: CookieJar,
) -> (CookieJar, Json<PopupDisplay>) {
    let cookies = cookie_store(&state, jar);
    let session = SessionStore::new(cookies.clone());
    let principal = claims.map(|c| c.role);

    let display = state
        .services
        .popup_display
        .current_popup(&cookies, &session, principal, Utc::now())
        .await;

    (cookies.into_jar(), Json(display))
}

/// Never show this popup again in this browser
#[utoipa::path(
    post,
    path = "/popups/{id}/never-show-again",
    tag = "popups",
    params(("id" = Uuid, Path, description = "Popup ID")),
    responses(
        (status = 200, description = "Popup closed", body = PopupDisplay)
    )
)]
pub async fn never_show_again(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
    jar: CookieJar,
) -> (CookieJar, Json<PopupDisplay>) {
    let cookies = cookie_store(&state, jar);

    if let Err(e) = state.services.popup_display.never_show_again(&cookies, &id).await {
        tracing::warn!(popup_id = %id, "Failed to store popup dismissal: {}", e);
    }

    (cookies.into_jar(), Json(PopupDisplay::closed()))
}

/// Close the popup; it comes back after one or two days
#[utoipa::path(
    post,
    path = "/popups/{id}/close",
    tag = "popups",
    params(("id" = Uuid, Path, description = "Popup ID")),
    responses(
        (status = 200, description = "Popup closed", body = PopupDisplay)
    )
)]
pub async fn close_popup(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
    jar: CookieJar,
) -> (CookieJar, Json<PopupDisplay>) {
    let cookies = cookie_store(&state, jar);

    match state.services.popup_display.close(&cookies, &id, Utc::now()).await {
        Ok(until) => tracing::debug!(popup_id = %id, until = %until, "Popup postponed"),
        Err(e) => tracing::warn!(popup_id = %id, "Failed to postpone popup: {}", e),
    }

    (cookies.into_jar(), Json(PopupDisplay::closed()))
}

/// List all popups (dashboard)
#[utoipa::path(
    get,
    path = "/popups",
    tag = "popups",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Popups list", body = Vec<PopupRecord>)
    )
)]
pub async fn list_popups(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<PopupRecord>>> {
    claims.require_read_popups()?;
    let popups = state.services.popups.list().await?;
    Ok(Json(popups))
}

/// Get popup by ID
#[utoipa::path(
    get,
    path = "/popups/{id}",
    tag = "popups",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Popup ID")),
    responses(
        (status = 200, description = "Popup details", body = PopupRecord),
        (status = 404, description = "Popup not found")
    )
)]
pub async fn get_popup(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PopupRecord>> {
    claims.require_read_popups()?;
    let popup = state.services.popups.get_by_id(id).await?;
    Ok(Json(popup))
}

/// Create a popup
#[utoipa::path(
    post,
    path = "/popups",
    tag = "popups",
    security(("bearer_auth" = [])),
    request_body = CreatePopup,
    responses(
        (status = 201, description = "Popup created", body = PopupRecord),
        (status = 403, description = "Insufficient permissions")
    )
)]
pub async fn create_popup(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreatePopup>,
) -> AppResult<(StatusCode, Json<PopupRecord>)> {
    claims.require_write_popups()?;
    let author = claims.email.as_deref().unwrap_or(&claims.sub);
    let popup = state.services.popups.create(&data, author).await?;
    Ok((StatusCode::CREATED, Json(popup)))
}

/// Update a popup
#[utoipa::path(
    put,
    path = "/popups/{id}",
    tag = "popups",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Popup ID")),
    request_body = UpdatePopup,
    responses(
        (status = 200, description = "Popup updated", body = PopupRecord)
    )
)]
pub async fn update_popup(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdatePopup>,
) -> AppResult<Json<PopupRecord>> {
    claims.require_write_popups()?;
    let popup = state.services.popups.update(id, &data).await?;
    Ok(Json(popup))
}

/// Delete a popup
#[utoipa::path(
    delete,
    path = "/popups/{id}",
    tag = "popups",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Popup ID")),
    responses(
        (status = 204, description = "Popup deleted")
    )
)]
pub async fn delete_popup(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    claims.require_write_popups()?;
    state.services.popups.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
