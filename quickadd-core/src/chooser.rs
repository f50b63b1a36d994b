//! Chooser page: lets the user continue with Google Calendar or with the
//! custom handler for an intercepted quick-add link.

use std::fmt;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::constants::{
    BOUNCE_PATH, HANDLER_PATH, HANDOFF_REWRITE_DELAYS, ORIGINAL_PARAM, SETTINGS_PAGE,
};
use crate::error::QuickAddResult;
use crate::handoff::{
    HandoffChannel, RecoveryPolicy, RecoverySource, original_param, with_original,
};
use crate::platform::{Page, SharedRuntime, SharedSettingsStore, SharedTabs, TabId};

/// The two places the chooser can send the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destinations {
    pub original: String,
    /// Re-intercepted on load, continuing the original provider flow.
    pub bounce: String,
    /// Opens the custom handler directly.
    pub handler: String,
}

impl Destinations {
    pub fn build(origin: &str, original: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        let encoded = urlencoding::encode(original);

        Destinations {
            original: original.to_string(),
            bounce: format!("{origin}{BOUNCE_PATH}?{ORIGINAL_PARAM}={encoded}"),
            handler: format!("{origin}{HANDLER_PATH}?{ORIGINAL_PARAM}={encoded}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChooserFailure {
    NoActiveTab,
    NotFound,
}

impl fmt::Display for ChooserFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChooserFailure::NoActiveTab => write!(f, "No active tab."),
            ChooserFailure::NotFound => write!(f, "Original URL not found."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChooserState {
    Ready(Destinations),
    /// The URL came from the handoff channel; the page is reloading with it
    /// as its `original` parameter.
    Reloading(String),
    Failed(ChooserFailure),
}

/// A bounce tab opened by [`Chooser::continue_with_original`].
pub struct BounceHandoff {
    pub tab_id: TabId,
    /// Delayed re-writes of the handoff entries.
    pub rewrites: JoinHandle<()>,
}

pub struct Chooser {
    settings: SharedSettingsStore,
    tabs: SharedTabs,
    runtime: SharedRuntime,
    handoff: HandoffChannel,
    policy: RecoveryPolicy,
    rewrite_delays: Vec<Duration>,
}

impl Chooser {
    pub fn new(
        settings: SharedSettingsStore,
        tabs: SharedTabs,
        runtime: SharedRuntime,
        handoff: HandoffChannel,
    ) -> Self {
        Chooser {
            settings,
            tabs,
            runtime,
            handoff,
            policy: RecoveryPolicy::default(),
            rewrite_delays: HANDOFF_REWRITE_DELAYS.to_vec(),
        }
    }

    pub fn with_policy(mut self, policy: RecoveryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_rewrite_delays(mut self, delays: Vec<Duration>) -> Self {
        self.rewrite_delays = delays;
        self
    }

    /// Work out what the chooser page should show.
    pub async fn load(&self, page: &dyn Page) -> QuickAddResult<ChooserState> {
        let original = match original_param(&page.location()) {
            Some(original) => original,
            None => match self.recover(page).await? {
                Ok(original) => original,
                Err(state) => return Ok(state),
            },
        };

        let settings = self.settings.get().await?;
        let destinations = Destinations::build(settings.handler_origin(), &original);
        tracing::debug!(
            original = %destinations.original,
            bounce = %destinations.bounce,
            handler = %destinations.handler,
            "chooser ready"
        );

        Ok(ChooserState::Ready(destinations))
    }

    async fn recover(&self, page: &dyn Page) -> QuickAddResult<Result<String, ChooserState>> {
        let Some(tab_id) = self.tabs.active_tab().await? else {
            return Ok(Err(ChooserState::Failed(ChooserFailure::NoActiveTab)));
        };
        tracing::debug!(tab = tab_id, "chooser loaded, recovering original URL");

        let Some(found) = self.handoff.recover(page, tab_id, &self.policy).await? else {
            tracing::error!("Original URL not found after all retries");
            return Ok(Err(ChooserState::Failed(ChooserFailure::NotFound)));
        };

        if found.source == RecoverySource::Location {
            return Ok(Ok(found.original));
        }

        self.handoff.clear_pending().await?;
        let reload = with_original(&page.location(), &found.original);
        tracing::debug!(%reload, "found original URL in storage, updating page URL");
        page.navigate(&reload);

        Ok(Err(ChooserState::Reloading(reload)))
    }

    /// Continue with the original provider: stage the handoff, open the bounce
    /// URL in a new tab, then keep the handoff entries fresh for that tab.
    pub async fn continue_with_original(
        &self,
        destinations: &Destinations,
    ) -> QuickAddResult<BounceHandoff> {
        let original = &destinations.original;

        self.handoff.stage_pending(original).await?;
        let tab_id = self.tabs.create(&destinations.bounce).await?;
        tracing::debug!(tab = tab_id, bounce = %destinations.bounce, "created bounce tab");

        self.handoff.stage_for_tab(tab_id, original).await?;
        let rewrites = self
            .handoff
            .schedule_rewrites(tab_id, original, &self.rewrite_delays);

        Ok(BounceHandoff { tab_id, rewrites })
    }

    /// Continue with the custom handler. The handler URL carries the original
    /// URL itself, so no handoff is needed.
    pub async fn continue_with_handler(&self, destinations: &Destinations) -> QuickAddResult<TabId> {
        self.tabs.create(&destinations.handler).await
    }

    pub async fn open_settings(&self) -> QuickAddResult<TabId> {
        self.tabs.create(&self.runtime.get_url(SETTINGS_PAGE)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handoff::HandoffKey;
    use crate::memory::{
        MemoryPage, MemorySessionStorage, MemorySettingsStore, MemoryTabs, StaticRuntime,
    };
    use crate::settings::Settings;
    use std::sync::Arc;

    const QUICK_ADD: &str =
        "https://calendar.google.com/calendar/render?action=TEMPLATE&text=Standup&dates=20250101/20250102";
    const CHOOSER: &str = "chrome-extension://quickadd/chooser.html";

    struct Fixture {
        chooser: Chooser,
        tabs: Arc<MemoryTabs>,
        storage: Arc<MemorySessionStorage>,
        channel: HandoffChannel,
    }

    fn fixture(settings: Settings) -> Fixture {
        let tabs = Arc::new(MemoryTabs::new());
        let storage = Arc::new(MemorySessionStorage::new());
        let channel = HandoffChannel::new(storage.clone());
        let chooser = Chooser::new(
            Arc::new(MemorySettingsStore::new(settings)),
            tabs.clone(),
            Arc::new(StaticRuntime::new("chrome-extension://quickadd")),
            channel.clone(),
        );
        Fixture {
            chooser,
            tabs,
            storage,
            channel,
        }
    }

    fn chooser_url(original: &str) -> String {
        format!("{CHOOSER}?original={}", urlencoding::encode(original))
    }

    #[test]
    fn builds_bounce_and_handler() {
        let d = Destinations::build("https://cal.example.com/", QUICK_ADD);
        let encoded = urlencoding::encode(QUICK_ADD);
        assert_eq!(
            d.bounce,
            format!("https://cal.example.com/event/add-to-bounce?original={encoded}")
        );
        assert_eq!(
            d.handler,
            format!("https://cal.example.com/event/add-to?original={encoded}")
        );
    }

    #[test]
    fn failure_messages() {
        assert_eq!(ChooserFailure::NotFound.to_string(), "Original URL not found.");
        assert_eq!(ChooserFailure::NoActiveTab.to_string(), "No active tab.");
    }

    #[tokio::test]
    async fn ready_from_query_param_uses_default_origin() {
        let f = fixture(Settings::default());
        let page = MemoryPage::new(chooser_url(QUICK_ADD));

        let ChooserState::Ready(d) = f.chooser.load(&page).await.unwrap() else {
            panic!("expected ready");
        };
        assert!(d.handler.starts_with("http://localhost:3000/event/add-to?original="));
        assert_eq!(d.original, QUICK_ADD);
    }

    #[tokio::test]
    async fn no_active_tab_fails() {
        let f = fixture(Settings::default());
        let page = MemoryPage::new(CHOOSER);

        let state = f.chooser.load(&page).await.unwrap();
        assert_eq!(state, ChooserState::Failed(ChooserFailure::NoActiveTab));
    }

    #[tokio::test]
    async fn handoff_triggers_reload_and_clears_pending() {
        let f = fixture(Settings::default());
        f.tabs.open(CHOOSER);
        f.channel.stage_pending(QUICK_ADD).await.unwrap();
        let page = MemoryPage::new(CHOOSER);

        let state = f.chooser.load(&page).await.unwrap();
        assert_eq!(state, ChooserState::Reloading(chooser_url(QUICK_ADD)));
        assert_eq!(page.navigations(), vec![chooser_url(QUICK_ADD)]);
        assert_eq!(f.channel.read(HandoffKey::Pending).await.unwrap(), None);

        // The reloaded page now resolves from its own URL.
        let state = f.chooser.load(&page).await.unwrap();
        assert!(matches!(state, ChooserState::Ready(_)));
    }

    #[tokio::test]
    async fn param_and_handoff_yield_identical_destinations() {
        let settings = Settings::new("https://cal.example.com", true);

        let direct = fixture(settings.clone());
        let page = MemoryPage::new(chooser_url(QUICK_ADD));
        let ChooserState::Ready(from_param) = direct.chooser.load(&page).await.unwrap() else {
            panic!("expected ready");
        };

        let staged = fixture(settings);
        staged.tabs.open(CHOOSER);
        staged.channel.stage_pending(QUICK_ADD).await.unwrap();
        let page = MemoryPage::new(CHOOSER);
        staged.chooser.load(&page).await.unwrap();
        let ChooserState::Ready(from_handoff) = staged.chooser.load(&page).await.unwrap() else {
            panic!("expected ready after reload");
        };

        assert_eq!(from_param, from_handoff);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_channel_reports_not_found() {
        let f = fixture(Settings::default());
        f.tabs.open(CHOOSER);
        let page = MemoryPage::new(CHOOSER);

        let state = f.chooser.load(&page).await.unwrap();
        assert_eq!(state, ChooserState::Failed(ChooserFailure::NotFound));
        assert!(page.navigations().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn continue_with_original_stages_handoff_for_new_tab() {
        let f = fixture(Settings::new("https://cal.example.com", true));
        let destinations = Destinations::build("https://cal.example.com", QUICK_ADD);

        let handoff = f.chooser.continue_with_original(&destinations).await.unwrap();

        assert_eq!(f.tabs.url(handoff.tab_id), Some(destinations.bounce.clone()));
        assert_eq!(
            f.channel.read(HandoffKey::Tab(handoff.tab_id)).await.unwrap().as_deref(),
            Some(QUICK_ADD)
        );
        assert_eq!(f.storage.write_count(), 2);

        handoff.rewrites.await.unwrap();
        assert_eq!(f.storage.write_count(), 4);
        assert_eq!(
            f.channel.read(HandoffKey::Pending).await.unwrap().as_deref(),
            Some(QUICK_ADD)
        );
    }

    #[tokio::test]
    async fn handler_and_settings_open_new_tabs() {
        let f = fixture(Settings::default());
        let destinations = Destinations::build("http://localhost:3000", QUICK_ADD);

        let handler_tab = f.chooser.continue_with_handler(&destinations).await.unwrap();
        assert_eq!(f.tabs.url(handler_tab), Some(destinations.handler.clone()));
        assert!(f.storage.is_empty());

        let settings_tab = f.chooser.open_settings().await.unwrap();
        assert_eq!(
            f.tabs.url(settings_tab).as_deref(),
            Some("chrome-extension://quickadd/settings.html")
        );
    }
}
