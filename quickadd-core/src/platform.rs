//! Host browser contract.
//!
//! Every browser API quickadd touches sits behind one of these traits: synced
//! settings storage, session storage, tabs, context menus, extension page URLs
//! and the location of the page running the chooser. A real extension binds them
//! to the browser; [`crate::memory`] provides in-process implementations.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::QuickAddResult;
use crate::settings::Settings;

/// Browser tab identifier.
pub type TabId = i64;

/// One outgoing navigation as reported by the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationDetails {
    pub tab_id: TabId,
    /// `0` is the top-level frame.
    pub frame_id: i64,
    pub url: String,
}

impl NavigationDetails {
    pub fn top_level(tab_id: TabId, url: impl Into<String>) -> Self {
        NavigationDetails {
            tab_id,
            frame_id: 0,
            url: url.into(),
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.frame_id == 0
    }
}

/// Synced key-value settings storage.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self) -> QuickAddResult<Settings>;
    async fn set(&self, settings: &Settings) -> QuickAddResult<()>;
}

/// Session-scoped key-value storage shared by every extension context.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn get(&self, key: &str) -> QuickAddResult<Option<Value>>;

    /// Write several entries at once. Existing keys are overwritten.
    async fn set(&self, entries: Vec<(String, Value)>) -> QuickAddResult<()>;

    async fn remove(&self, key: &str) -> QuickAddResult<()>;

    async fn entries(&self) -> QuickAddResult<Vec<(String, Value)>>;

    /// Resolves after the next write to the storage.
    ///
    /// Stores without change notifications never resolve, leaving readers on
    /// plain polling.
    async fn changed(&self) {
        std::future::pending::<()>().await
    }
}

#[async_trait]
pub trait Tabs: Send + Sync {
    /// Point an existing tab at a new URL.
    async fn update(&self, tab_id: TabId, url: &str) -> QuickAddResult<()>;

    /// Open a new tab and return its identifier.
    async fn create(&self, url: &str) -> QuickAddResult<TabId>;

    /// Active tab of the current window, if any.
    async fn active_tab(&self) -> QuickAddResult<Option<TabId>>;
}

/// Where a context menu item is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuContext {
    /// The extension's toolbar icon.
    Action,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub id: String,
    pub title: String,
    pub contexts: Vec<MenuContext>,
}

#[async_trait]
pub trait ContextMenus: Send + Sync {
    async fn remove_all(&self) -> QuickAddResult<()>;
    async fn create(&self, item: MenuItem) -> QuickAddResult<()>;
}

/// Resolves paths inside the extension package to loadable URLs.
pub trait Runtime: Send + Sync {
    fn get_url(&self, path: &str) -> String;
}

/// The page hosting the chooser.
pub trait Page: Send + Sync {
    /// Current URL. May change underneath the page while it is loading.
    fn location(&self) -> String;

    fn navigate(&self, url: &str);
}

pub type SharedSettingsStore = Arc<dyn SettingsStore>;
pub type SharedSessionStorage = Arc<dyn SessionStorage>;
pub type SharedTabs = Arc<dyn Tabs>;
pub type SharedContextMenus = Arc<dyn ContextMenus>;
pub type SharedRuntime = Arc<dyn Runtime>;
