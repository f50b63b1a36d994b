//! Handoff channel: passes an intercepted URL to a page opened in another
//! browser context through session storage.
//!
//! Writers store the URL under the singleton key `pending_orig` before the
//! destination tab exists, then under the tab-scoped key `orig_<tabId>` once it
//! does, and write both again at fixed delays. Readers poll with a bounded
//! budget (see [`RecoveryPolicy`]), waking early whenever the storage reports a
//! write. Delivery is best effort: concurrent writers overwrite the singleton
//! key, and the tab-scoped key is the only one that cannot be stolen.

use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use url::Url;

use crate::constants::{ORIGINAL_PARAM, PENDING_KEY, QUICK_ADD_HOST_PATH, TAB_KEY_PREFIX};
use crate::error::QuickAddResult;
use crate::platform::{Page, SharedSessionStorage, TabId};

/// Storage key of a handoff entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffKey {
    /// The most recent in-flight handoff.
    Pending,
    /// Handoff addressed to one tab.
    Tab(TabId),
}

impl HandoffKey {
    pub fn storage_key(&self) -> String {
        match self {
            HandoffKey::Pending => PENDING_KEY.to_string(),
            HandoffKey::Tab(id) => format!("{TAB_KEY_PREFIX}{id}"),
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        if key == PENDING_KEY {
            return Some(HandoffKey::Pending);
        }
        key.strip_prefix(TAB_KEY_PREFIX)?
            .parse()
            .ok()
            .map(HandoffKey::Tab)
    }
}

/// Retry budget of the reading side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryPolicy {
    /// Total number of attempts.
    pub attempts: u32,
    /// Attempts followed by `fast_delay`; later ones use `slow_delay`.
    pub fast_attempts: u32,
    pub fast_delay: Duration,
    pub slow_delay: Duration,
    /// Final wait before the last check of the page location and singleton key.
    pub grace: Duration,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        RecoveryPolicy {
            attempts: 20,
            fast_attempts: 10,
            fast_delay: Duration::from_millis(30),
            slow_delay: Duration::from_millis(50),
            grace: Duration::from_millis(200),
        }
    }
}

impl RecoveryPolicy {
    /// Wait after the zero-based `attempt`, or `None` after the last one.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt + 1 >= self.attempts {
            None
        } else if attempt < self.fast_attempts {
            Some(self.fast_delay)
        } else {
            Some(self.slow_delay)
        }
    }

    /// Upper bound on the time spent waiting before giving up. With the
    /// default policy this is 10 * 30ms + 9 * 50ms + 200ms = 950ms.
    pub fn max_wait(&self) -> Duration {
        (0..self.attempts)
            .filter_map(|attempt| self.delay_after(attempt))
            .sum::<Duration>()
            + self.grace
    }
}

/// Where a recovered URL was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySource {
    /// The `original` parameter of the page's own URL.
    Location,
    Pending,
    Tab,
    /// Some other entry that holds a quick-add URL.
    Scan,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovered {
    pub original: String,
    pub source: RecoverySource,
}

/// `original` query parameter of a URL, if present and non-empty.
pub fn original_param(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == ORIGINAL_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// `<base>?original=<percent-encoded original>`, replacing any query `base` had.
pub fn with_original(base: &str, original: &str) -> String {
    let base = base.split('?').next().unwrap_or(base);
    format!("{base}?{ORIGINAL_PARAM}={}", urlencoding::encode(original))
}

fn as_url(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}

#[derive(Clone)]
pub struct HandoffChannel {
    storage: SharedSessionStorage,
}

impl HandoffChannel {
    pub fn new(storage: SharedSessionStorage) -> Self {
        HandoffChannel { storage }
    }

    /// Store `original` under the singleton key, before the destination tab exists.
    pub async fn stage_pending(&self, original: &str) -> QuickAddResult<()> {
        self.write(&[HandoffKey::Pending], original).await
    }

    /// Store `original` under the tab's key and the singleton key.
    pub async fn stage_for_tab(&self, tab_id: TabId, original: &str) -> QuickAddResult<()> {
        self.write(&[HandoffKey::Tab(tab_id), HandoffKey::Pending], original).await
    }

    /// Repeat [`Self::stage_for_tab`] after each delay, measured from now.
    pub fn schedule_rewrites(
        &self,
        tab_id: TabId,
        original: &str,
        delays: &[Duration],
    ) -> JoinHandle<()> {
        let channel = self.clone();
        let original = original.to_string();
        let mut delays = delays.to_vec();
        delays.sort();

        tokio::spawn(async move {
            let start = tokio::time::Instant::now();
            for delay in delays {
                tokio::time::sleep_until(start + delay).await;
                match channel.stage_for_tab(tab_id, &original).await {
                    Ok(()) => tracing::debug!(tab = tab_id, ?delay, "re-stored handoff"),
                    Err(e) => tracing::warn!(tab = tab_id, ?delay, "failed to re-store handoff: {e}"),
                }
            }
        })
    }

    pub async fn clear_pending(&self) -> QuickAddResult<()> {
        self.storage.remove(&HandoffKey::Pending.storage_key()).await
    }

    pub async fn read(&self, key: HandoffKey) -> QuickAddResult<Option<String>> {
        Ok(as_url(self.storage.get(&key.storage_key()).await?))
    }

    /// Recover the URL handed off to `page`, running in tab `tab_id`.
    ///
    /// Each attempt checks, in order: the page's `original` parameter, the
    /// singleton key, the tab's key, then any entry holding a quick-add URL.
    /// Returns `None` once the budget and the grace period are exhausted.
    pub async fn recover(
        &self,
        page: &dyn Page,
        tab_id: TabId,
        policy: &RecoveryPolicy,
    ) -> QuickAddResult<Option<Recovered>> {
        for attempt in 0..policy.attempts {
            if let Some(found) = self.check(page, tab_id).await? {
                tracing::debug!(
                    attempt = attempt + 1,
                    source = ?found.source,
                    "found original URL"
                );
                return Ok(Some(found));
            }

            let Some(delay) = policy.delay_after(attempt) else {
                break;
            };
            tracing::trace!(attempt = attempt + 1, ?delay, "original URL not found, waiting");
            self.wait(delay).await;
        }

        tracing::warn!("original URL not found after {} attempts", policy.attempts);
        tokio::time::sleep(policy.grace).await;

        if let Some(original) = original_param(&page.location()) {
            return Ok(Some(Recovered {
                original,
                source: RecoverySource::Location,
            }));
        }
        Ok(self.read(HandoffKey::Pending).await?.map(|original| Recovered {
            original,
            source: RecoverySource::Pending,
        }))
    }

    async fn check(&self, page: &dyn Page, tab_id: TabId) -> QuickAddResult<Option<Recovered>> {
        if let Some(original) = original_param(&page.location()) {
            return Ok(Some(Recovered {
                original,
                source: RecoverySource::Location,
            }));
        }

        if let Some(original) = self.read(HandoffKey::Pending).await? {
            return Ok(Some(Recovered {
                original,
                source: RecoverySource::Pending,
            }));
        }

        if let Some(original) = self.read(HandoffKey::Tab(tab_id)).await? {
            return Ok(Some(Recovered {
                original,
                source: RecoverySource::Tab,
            }));
        }

        let scanned = self
            .storage
            .entries()
            .await?
            .into_iter()
            .find_map(|(key, value)| match value {
                Value::String(s) if s.contains(QUICK_ADD_HOST_PATH) => {
                    tracing::debug!(%key, "found original URL under unexpected key");
                    Some(s)
                }
                _ => None,
            });

        Ok(scanned.map(|original| Recovered {
            original,
            source: RecoverySource::Scan,
        }))
    }

    /// Sleep for `delay`, returning early if the storage is written to.
    async fn wait(&self, delay: Duration) {
        let _ = tokio::time::timeout(delay, self.storage.changed()).await;
    }

    async fn write(&self, keys: &[HandoffKey], original: &str) -> QuickAddResult<()> {
        let entries = keys
            .iter()
            .map(|key| (key.storage_key(), Value::String(original.to_string())))
            .collect();
        self.storage.set(entries).await
    }
}
