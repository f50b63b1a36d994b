//! Navigation interception: recognise quick-add links and send the tab to the
//! configured redirect target before Google Calendar loads.

use url::Url;

use crate::constants::{ORIGINAL_PARAM, QUICK_ADD_ACTION, QUICK_ADD_HOST_PATH};
use crate::error::QuickAddResult;
use crate::platform::{NavigationDetails, SharedSettingsStore, SharedTabs};

/// Whether a navigation target is a Google Calendar quick-add link.
pub fn is_quick_add_url(url: &str) -> bool {
    url.contains(QUICK_ADD_HOST_PATH) && url.contains(QUICK_ADD_ACTION)
}

/// Build the redirect target for a quick-add link.
///
/// Every query parameter of `source` is appended, in order and with
/// duplicates, to the query of `redirect`. If either URL fails to parse the
/// whole source is passed as a single `original` parameter instead.
pub fn rewrite_url(redirect: &str, source: &str) -> String {
    match expand_params(redirect, source) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Error parsing Google Calendar URL: {e}");
            fallback_url(redirect, source)
        }
    }
}

fn expand_params(redirect: &str, source: &str) -> Result<String, url::ParseError> {
    let source = Url::parse(source)?;
    let mut target = Url::parse(redirect)?;

    let pairs: Vec<_> = source.query_pairs().collect();
    if !pairs.is_empty() {
        let mut query = target.query_pairs_mut();
        for (key, value) in &pairs {
            query.append_pair(key, value);
        }
    }

    Ok(target.into())
}

/// `<redirect>?original=<percent-encoded source>`
pub fn fallback_url(redirect: &str, source: &str) -> String {
    format!("{redirect}?{ORIGINAL_PARAM}={}", urlencoding::encode(source))
}

/// What the interceptor did with one navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptOutcome {
    /// Not a top-level quick-add navigation.
    Ignored,
    /// A quick-add navigation, but interception is switched off.
    Disabled,
    /// The tab was sent to this URL.
    Redirected(String),
    /// Something failed; the navigation proceeds untouched.
    Failed,
}

/// Rewrites quick-add navigations onto the configured redirect target.
#[derive(Clone)]
pub struct Interceptor {
    settings: SharedSettingsStore,
    tabs: SharedTabs,
}

impl Interceptor {
    pub fn new(settings: SharedSettingsStore, tabs: SharedTabs) -> Self {
        Interceptor { settings, tabs }
    }

    /// Handle a navigation before it starts. Never fails: errors are logged and
    /// the navigation is left alone.
    pub async fn on_before_navigate(&self, details: &NavigationDetails) -> InterceptOutcome {
        match self.intercept(details).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Error in redirect handler: {e}");
                InterceptOutcome::Failed
            }
        }
    }

    async fn intercept(&self, details: &NavigationDetails) -> QuickAddResult<InterceptOutcome> {
        if details.url.is_empty() || !details.is_top_level() || !is_quick_add_url(&details.url) {
            return Ok(InterceptOutcome::Ignored);
        }

        let settings = self.settings.get().await?;
        if !settings.is_enabled() {
            tracing::debug!(tab = details.tab_id, "interception disabled, leaving navigation alone");
            return Ok(InterceptOutcome::Disabled);
        }

        let target = rewrite_url(settings.redirect_url(), &details.url);
        self.tabs.update(details.tab_id, &target).await?;
        tracing::info!(tab = details.tab_id, %target, "redirected quick-add link");

        Ok(InterceptOutcome::Redirected(target))
    }
}
