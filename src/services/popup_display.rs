//! Pop-up eligibility: which announcement, if any, a visitor sees

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        popup::{PopupDisplay, PopupRecord, TargetAudience},
        user::Role,
    },
    services::store::{KeyValueStore, SessionStore},
};

const NEVER_SHOW_TTL: Duration = Duration::from_secs(365 * 24 * 3600);

pub fn never_show_key(id: &Uuid) -> String {
    format!("popup_never_show_{}", id)
}

pub fn postponed_until_key(id: &Uuid) -> String {
    format!("popup_postponed_until_{}", id)
}

pub fn shown_key(id: &Uuid) -> String {
    format!("popup_shown_{}", id)
}

/// Read access to the active popups, newest first
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PopupSource: Send + Sync {
    async fn list_active(&self) -> AppResult<Vec<PopupRecord>>;
}

/// Visitor-side state of one popup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopupDismissal {
    pub never_show_again: bool,
    pub postponed_until: Option<DateTime<Utc>>,
    pub shown_this_session: bool,
}

/// Everything the eligibility rules look at
#[derive(Debug, Clone)]
pub struct EligibilityContext {
    pub now: DateTime<Utc>,
    /// Role of the signed-in member, `None` for anonymous visitors
    pub principal: Option<Role>,
    pub dismissals: HashMap<Uuid, PopupDismissal>,
}

impl EligibilityContext {
    pub fn anonymous(now: DateTime<Utc>) -> Self {
        Self {
            now,
            principal: None,
            dismissals: HashMap::new(),
        }
    }
}

pub fn audience_matches(audience: &TargetAudience, principal: Option<Role>) -> bool {
    match audience {
        TargetAudience::AllVisitors => true,
        TargetAudience::AllUsers => principal.is_some(),
        TargetAudience::AdminsOnly => principal.is_some_and(|r| r.is_admin()),
        TargetAudience::EditorsOnly => principal == Some(Role::Redacteur),
        TargetAudience::Other(_) => false,
    }
}

/// Checks run in order, stopping at the first failure
pub fn is_eligible(popup: &PopupRecord, ctx: &EligibilityContext) -> bool {
    let dismissal = ctx.dismissals.get(&popup.id);

    if dismissal.is_some_and(|d| d.never_show_again) {
        return false;
    }
    if let Some(until) = dismissal.and_then(|d| d.postponed_until) {
        if ctx.now < until {
            return false;
        }
    }
    if dismissal.is_some_and(|d| d.shown_this_session) {
        return false;
    }
    audience_matches(&popup.target_audience, ctx.principal)
}

/// First eligible popup of a newest-first list
pub fn select_eligible<'a>(
    popups: &'a [PopupRecord],
    ctx: &EligibilityContext,
) -> Option<&'a PopupRecord> {
    popups.iter().find(|popup| is_eligible(popup, ctx))
}

fn parse_timestamp_millis(raw: &str) -> Option<DateTime<Utc>> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

#[derive(Clone)]
pub struct PopupDisplayService {
    source: Arc<dyn PopupSource>,
}

impl PopupDisplayService {
    pub fn new(source: Arc<dyn PopupSource>) -> Self {
        Self { source }
    }

    /// Pick the popup to show on this page load and flag it as shown for the
    /// session before returning it
    pub async fn current_popup<C, S>(
        &self,
        cookies: &C,
        session: &SessionStore<S>,
        principal: Option<Role>,
        now: DateTime<Utc>,
    ) -> PopupDisplay
    where
        C: KeyValueStore + ?Sized,
        S: KeyValueStore,
    {
        let popups = match self.source.list_active().await {
            Ok(popups) => popups,
            Err(e) => {
                tracing::error!("Failed to fetch popups: {}", e);
                return PopupDisplay::closed();
            }
        };
        let popups: Vec<PopupRecord> = popups.into_iter().filter(|p| p.is_active).collect();
        if popups.is_empty() {
            return PopupDisplay::closed();
        }

        let dismissals = match load_dismissals(&popups, cookies, session).await {
            Ok(dismissals) => dismissals,
            Err(e) => {
                tracing::warn!("Failed to read popup preferences: {}", e);
                return PopupDisplay::closed();
            }
        };
        let ctx = EligibilityContext {
            now,
            principal,
            dismissals,
        };

        let Some(popup) = select_eligible(&popups, &ctx) else {
            return PopupDisplay::closed();
        };

        if let Err(e) = session.mark(&shown_key(&popup.id)).await {
            tracing::warn!(popup_id = %popup.id, "Failed to flag popup as shown: {}", e);
        }
        tracing::debug!(popup_id = %popup.id, audience = %popup.target_audience, "Popup selected");
        PopupDisplay::open(popup.clone())
    }

    /// "Never show again": suppress the popup for a year
    pub async fn never_show_again<C: KeyValueStore + ?Sized>(
        &self,
        cookies: &C,
        id: &Uuid,
    ) -> AppResult<()> {
        cookies
            .set(&never_show_key(id), "true", Some(NEVER_SHOW_TTL))
            .await
    }

    /// "Close": postpone the popup for one or two days, picked at random
    pub async fn close<C: KeyValueStore + ?Sized>(
        &self,
        cookies: &C,
        id: &Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<DateTime<Utc>> {
        let days = rand::thread_rng().gen_range(1..=2);
        self.postpone_for(cookies, id, now, days).await
    }

    pub async fn postpone_for<C: KeyValueStore + ?Sized>(
        &self,
        cookies: &C,
        id: &Uuid,
        now: DateTime<Utc>,
        days: u32,
    ) -> AppResult<DateTime<Utc>> {
        let until = now + chrono::Duration::days(i64::from(days));
        let ttl = Duration::from_secs(u64::from(days) * 24 * 3600);
        cookies
            .set(
                &postponed_until_key(id),
                &until.timestamp_millis().to_string(),
                Some(ttl),
            )
            .await?;
        Ok(until)
    }
}

async fn load_dismissals<C, S>(
    popups: &[PopupRecord],
    cookies: &C,
    session: &SessionStore<S>,
) -> AppResult<HashMap<Uuid, PopupDismissal>>
where
    C: KeyValueStore + ?Sized,
    S: KeyValueStore,
{
    let mut dismissals = HashMap::with_capacity(popups.len());
    for popup in popups {
        let never_show_again =
            cookies.get(&never_show_key(&popup.id)).await?.as_deref() == Some("true");
        let postponed_until = cookies
            .get(&postponed_until_key(&popup.id))
            .await?
            .as_deref()
            .and_then(parse_timestamp_millis);
        let shown_this_session = session.is_marked(&shown_key(&popup.id)).await?;

        dismissals.insert(
            popup.id,
            PopupDismissal {
                never_show_again,
                postponed_until,
                shown_this_session,
            },
        );
    }
    Ok(dismissals)
}
