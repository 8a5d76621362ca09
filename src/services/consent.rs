//! Cookie consent banner state

use std::time::Duration;

use crate::{
    error::AppResult,
    models::visitor::{
        ConsentState, UpdateConsent, COOKIES_ANALYTICS, COOKIES_FUNCTIONAL, COOKIES_MARKETING,
        COOKIE_CONSENT,
    },
    services::store::KeyValueStore,
};

const CONSENT_TTL: Duration = Duration::from_secs(365 * 24 * 3600);

async fn flag<C: KeyValueStore + ?Sized>(cookies: &C, key: &str) -> AppResult<bool> {
    Ok(cookies.get(key).await?.as_deref() == Some("true"))
}

/// Consent as recorded in the browser; unreadable cookies mean no consent
pub async fn read_consent<C: KeyValueStore + ?Sized>(cookies: &C) -> ConsentState {
    let read = async {
        Ok::<_, crate::error::AppError>(ConsentState {
            given: cookies.get(COOKIE_CONSENT).await?.is_some(),
            functional: flag(cookies, COOKIES_FUNCTIONAL).await?,
            analytics: flag(cookies, COOKIES_ANALYTICS).await?,
            marketing: flag(cookies, COOKIES_MARKETING).await?,
        })
    };

    match read.await {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!("Failed to read consent cookies: {}", e);
            ConsentState::default()
        }
    }
}

/// Record the banner answer as year-long cookies
pub async fn write_consent<C: KeyValueStore + ?Sized>(
    cookies: &C,
    update: UpdateConsent,
) -> AppResult<ConsentState> {
    let as_str = |b: bool| if b { "true" } else { "false" };

    cookies.set(COOKIE_CONSENT, "true", Some(CONSENT_TTL)).await?;
    cookies
        .set(COOKIES_FUNCTIONAL, as_str(update.functional), Some(CONSENT_TTL))
        .await?;
    cookies
        .set(COOKIES_ANALYTICS, as_str(update.analytics), Some(CONSENT_TTL))
        .await?;
    cookies
        .set(COOKIES_MARKETING, as_str(update.marketing), Some(CONSENT_TTL))
        .await?;

    tracing::info!(
        functional = update.functional,
        analytics = update.analytics,
        marketing = update.marketing,
        "Cookie consent recorded"
    );

    Ok(ConsentState {
        given: true,
        functional: update.functional,
        analytics: update.analytics,
        marketing: update.marketing,
    })
}
