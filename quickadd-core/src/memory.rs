//! In-process implementations of the platform traits.
//!
//! Used by the CLI to run the extension flows outside a browser, and by tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use crate::error::{QuickAddError, QuickAddResult};
use crate::platform::{
    ContextMenus, MenuItem, Page, Runtime, SessionStorage, SettingsStore, TabId, Tabs,
};
use crate::settings::Settings;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Settings held in memory.
#[derive(Default)]
pub struct MemorySettingsStore {
    settings: Mutex<Settings>,
    fail_writes: AtomicBool,
}

impl MemorySettingsStore {
    pub fn new(settings: Settings) -> Self {
        MemorySettingsStore {
            settings: Mutex::new(settings),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `set` fail, as an unavailable sync store would.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Settings {
        lock(&self.settings).clone()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self) -> QuickAddResult<Settings> {
        Ok(self.snapshot())
    }

    async fn set(&self, settings: &Settings) -> QuickAddResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(QuickAddError::Storage("sync storage unavailable".into()));
        }
        *lock(&self.settings) = settings.clone();
        Ok(())
    }
}

/// Session storage held in memory, waking `changed()` waiters on every write.
#[derive(Default)]
pub struct MemorySessionStorage {
    entries: Mutex<BTreeMap<String, Value>>,
    writes: AtomicUsize,
    notify: Notify,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn get(&self, key: &str) -> QuickAddResult<Option<Value>> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    async fn set(&self, entries: Vec<(String, Value)>) -> QuickAddResult<()> {
        lock(&self.entries).extend(entries);
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.notify.notify_waiters();
        Ok(())
    }

    async fn remove(&self, key: &str) -> QuickAddResult<()> {
        lock(&self.entries).remove(key);
        Ok(())
    }

    async fn entries(&self) -> QuickAddResult<Vec<(String, Value)>> {
        Ok(lock(&self.entries)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn changed(&self) {
        self.notify.notified().await;
    }
}

/// Tabs held in memory. Identifiers start at 1; new tabs become active.
pub struct MemoryTabs {
    locations: Mutex<BTreeMap<TabId, String>>,
    active: Mutex<Option<TabId>>,
    next_id: AtomicI64,
}

impl Default for MemoryTabs {
    fn default() -> Self {
        MemoryTabs {
            locations: Mutex::new(BTreeMap::new()),
            active: Mutex::new(None),
            next_id: AtomicI64::new(1),
        }
    }
}

impl MemoryTabs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a tab without going through the async trait.
    pub fn open(&self, url: &str) -> TabId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.locations).insert(id, url.to_string());
        *lock(&self.active) = Some(id);
        id
    }

    pub fn url(&self, tab_id: TabId) -> Option<String> {
        lock(&self.locations).get(&tab_id).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.locations).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Tabs for MemoryTabs {
    async fn update(&self, tab_id: TabId, url: &str) -> QuickAddResult<()> {
        let mut locations = lock(&self.locations);
        let location = locations
            .get_mut(&tab_id)
            .ok_or_else(|| QuickAddError::Tabs(format!("No tab with id: {tab_id}")))?;
        *location = url.to_string();
        Ok(())
    }

    async fn create(&self, url: &str) -> QuickAddResult<TabId> {
        Ok(self.open(url))
    }

    async fn active_tab(&self) -> QuickAddResult<Option<TabId>> {
        Ok(*lock(&self.active))
    }
}

#[derive(Default)]
pub struct MemoryContextMenus {
    items: Mutex<Vec<MenuItem>>,
}

impl MemoryContextMenus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> Vec<MenuItem> {
        lock(&self.items).clone()
    }
}

#[async_trait]
impl ContextMenus for MemoryContextMenus {
    async fn remove_all(&self) -> QuickAddResult<()> {
        lock(&self.items).clear();
        Ok(())
    }

    async fn create(&self, item: MenuItem) -> QuickAddResult<()> {
        let mut items = lock(&self.items);
        if items.iter().any(|existing| existing.id == item.id) {
            return Err(QuickAddError::ContextMenu(format!(
                "Cannot create item with duplicate id {}",
                item.id
            )));
        }
        items.push(item);
        Ok(())
    }
}

/// Extension pages served from a fixed base URL.
pub struct StaticRuntime {
    base: String,
}

impl StaticRuntime {
    pub fn new(base: impl Into<String>) -> Self {
        StaticRuntime { base: base.into() }
    }
}

impl Runtime for StaticRuntime {
    fn get_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// A page whose location can be changed from outside, the way the browser
/// rewrites a loading page.
pub struct MemoryPage {
    location: Mutex<String>,
    navigations: Mutex<Vec<String>>,
}

impl MemoryPage {
    pub fn new(location: impl Into<String>) -> Self {
        MemoryPage {
            location: Mutex::new(location.into()),
            navigations: Mutex::new(Vec::new()),
        }
    }

    pub fn set_location(&self, url: &str) {
        *lock(&self.location) = url.to_string();
    }

    /// URLs passed to `navigate`, oldest first.
    pub fn navigations(&self) -> Vec<String> {
        lock(&self.navigations).clone()
    }
}

impl Page for MemoryPage {
    fn location(&self) -> String {
        lock(&self.location).clone()
    }

    fn navigate(&self, url: &str) {
        lock(&self.navigations).push(url.to_string());
        self.set_location(url);
    }
}
