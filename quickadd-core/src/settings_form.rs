//! Settings page: load the form, validate and persist it, and show a
//! transient status line.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::constants::{DEFAULT_REDIRECT_URL, STATUS_CLEAR_DELAY};
use crate::error::{QuickAddError, QuickAddResult};
use crate::platform::SharedSettingsStore;
use crate::settings::{Settings, validate_redirect_origin};

/// Values shown in the settings form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsForm {
    pub redirect_origin: String,
    pub enabled: bool,
}

impl From<&Settings> for SettingsForm {
    fn from(settings: &Settings) -> Self {
        SettingsForm {
            redirect_origin: settings
                .stored_origin()
                .unwrap_or(DEFAULT_REDIRECT_URL)
                .to_string(),
            enabled: settings.is_enabled(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
}

impl StatusMessage {
    fn success(text: impl Into<String>) -> Self {
        StatusMessage {
            text: text.into(),
            kind: StatusKind::Success,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        StatusMessage {
            text: text.into(),
            kind: StatusKind::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }
}

pub struct SettingsPage {
    store: SharedSettingsStore,
}

impl SettingsPage {
    pub fn new(store: SharedSettingsStore) -> Self {
        SettingsPage { store }
    }

    pub async fn load(&self) -> QuickAddResult<SettingsForm> {
        Ok(SettingsForm::from(&self.store.get().await?))
    }

    /// Validate and save the form. Nothing is written unless validation passes.
    pub async fn submit(&self, form: &SettingsForm) -> StatusMessage {
        let redirect_origin = form.redirect_origin.trim();

        match validate_redirect_origin(redirect_origin) {
            Ok(_) => {}
            Err(QuickAddError::EmptyRedirectOrigin) => {
                return StatusMessage::error("Please enter a redirect origin URL.");
            }
            Err(e) => {
                tracing::debug!("rejected redirect origin: {e}");
                return StatusMessage::error(format!(
                    "Please enter a valid URL (e.g., {DEFAULT_REDIRECT_URL})"
                ));
            }
        }

        let settings = Settings::new(redirect_origin, form.enabled);
        match self.store.set(&settings).await {
            Ok(()) => {
                tracing::info!(redirect_origin, enabled = form.enabled, "settings saved");
                StatusMessage::success("Settings saved successfully!")
            }
            Err(e) => {
                tracing::error!("Error saving settings: {e}");
                StatusMessage::error(format!("Error saving settings: {e}"))
            }
        }
    }
}

/// Status area that hides each message after a delay, unless a newer message
/// has replaced it in the meantime.
///
/// This is the display side of the settings page: the page host feeds it the
/// [`StatusMessage`] returned by [`SettingsPage::submit`] and renders
/// [`StatusLine::current`]. One-shot callers such as the CLI print the message
/// directly instead.
#[derive(Clone)]
pub struct StatusLine {
    current: Arc<Mutex<(u64, Option<StatusMessage>)>>,
    clear_after: Duration,
}

impl Default for StatusLine {
    fn default() -> Self {
        StatusLine::new(STATUS_CLEAR_DELAY)
    }
}

impl StatusLine {
    pub fn new(clear_after: Duration) -> Self {
        StatusLine {
            current: Arc::new(Mutex::new((0, None))),
            clear_after,
        }
    }

    pub fn show(&self, message: StatusMessage) {
        let generation = {
            let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
            current.0 += 1;
            current.1 = Some(message);
            current.0
        };

        let current = self.current.clone();
        let clear_after = self.clear_after;
        tokio::spawn(async move {
            tokio::time::sleep(clear_after).await;
            let mut current = current.lock().unwrap_or_else(PoisonError::into_inner);
            if current.0 == generation {
                current.1 = None;
            }
        });
    }

    pub fn current(&self) -> Option<StatusMessage> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .1
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySettingsStore;

    fn page(settings: Settings) -> (SettingsPage, Arc<MemorySettingsStore>) {
        let store = Arc::new(MemorySettingsStore::new(settings));
        (SettingsPage::new(store.clone()), store)
    }

    fn form(redirect_origin: &str, enabled: bool) -> SettingsForm {
        SettingsForm {
            redirect_origin: redirect_origin.to_string(),
            enabled,
        }
    }

    #[tokio::test]
    async fn load_fills_defaults() {
        let (page, _) = page(Settings::default());
        let loaded = page.load().await.unwrap();
        assert_eq!(loaded, form("http://localhost:3000/event/add-to", true));
    }

    #[tokio::test]
    async fn load_reflects_stored_values() {
        let (page, _) = page(Settings::new("https://example.com/add", false));
        let loaded = page.load().await.unwrap();
        assert_eq!(loaded, form("https://example.com/add", false));
    }

    #[tokio::test]
    async fn rejects_empty_and_invalid_without_saving() {
        let (page, store) = page(Settings::default());

        let status = page.submit(&form("", true)).await;
        assert_eq!(status.text, "Please enter a redirect origin URL.");
        assert!(status.is_error());

        let status = page.submit(&form("not a url", false)).await;
        assert_eq!(
            status.text,
            "Please enter a valid URL (e.g., http://localhost:3000/event/add-to)"
        );

        assert_eq!(store.snapshot(), Settings::default());
    }

    #[tokio::test]
    async fn saves_trimmed_valid_origin() {
        let (page, store) = page(Settings::default());

        let status = page.submit(&form("  https://example.com/add  ", false)).await;
        assert_eq!(status, StatusMessage::success("Settings saved successfully!"));
        assert_eq!(store.snapshot(), Settings::new("https://example.com/add", false));
    }

    #[tokio::test]
    async fn reports_store_failures() {
        let (page, store) = page(Settings::default());
        store.fail_writes(true);

        let status = page.submit(&form("https://example.com/add", true)).await;
        assert!(status.is_error());
        assert!(status.text.starts_with("Error saving settings: "));
    }

    #[tokio::test(start_paused = true)]
    async fn status_line_clears_after_delay() {
        let line = StatusLine::default();
        line.show(StatusMessage::success("Settings saved successfully!"));

        tokio::time::sleep(Duration::from_millis(2_900)).await;
        assert!(line.current().is_some());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(line.current(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn newer_status_survives_older_timer() {
        let line = StatusLine::new(Duration::from_secs(3));
        line.show(StatusMessage::error("first"));

        tokio::time::sleep(Duration::from_secs(2)).await;
        line.show(StatusMessage::success("second"));

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(line.current().map(|m| m.text), Some("second".to_string()));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(line.current(), None);
    }
}
