//! Background event handlers: navigation interception plus the "Open Settings"
//! entry on the toolbar icon's context menu.

use crate::constants::{SETTINGS_MENU_ID, SETTINGS_MENU_TITLE, SETTINGS_PAGE};
use crate::error::QuickAddResult;
use crate::intercept::{InterceptOutcome, Interceptor};
use crate::platform::{
    MenuContext, MenuItem, NavigationDetails, SharedContextMenus, SharedRuntime, SharedTabs, TabId,
};

pub struct Background {
    interceptor: Interceptor,
    menus: SharedContextMenus,
    tabs: SharedTabs,
    runtime: SharedRuntime,
}

impl Background {
    pub fn new(
        interceptor: Interceptor,
        menus: SharedContextMenus,
        tabs: SharedTabs,
        runtime: SharedRuntime,
    ) -> Self {
        Background {
            interceptor,
            menus,
            tabs,
            runtime,
        }
    }

    pub async fn on_installed(&self) -> QuickAddResult<()> {
        self.register_context_menu().await
    }

    pub async fn on_startup(&self) -> QuickAddResult<()> {
        self.register_context_menu().await
    }

    pub async fn on_before_navigate(&self, details: &NavigationDetails) -> InterceptOutcome {
        self.interceptor.on_before_navigate(details).await
    }

    /// Open the settings page when our menu item is clicked. Returns the new tab.
    pub async fn on_menu_clicked(&self, menu_item_id: &str) -> QuickAddResult<Option<TabId>> {
        if menu_item_id != SETTINGS_MENU_ID {
            return Ok(None);
        }
        let tab = self.tabs.create(&self.runtime.get_url(SETTINGS_PAGE)).await?;
        Ok(Some(tab))
    }

    /// Remove every item, then add ours, so repeated registration never
    /// duplicates it.
    async fn register_context_menu(&self) -> QuickAddResult<()> {
        self.menus.remove_all().await?;
        self.menus
            .create(MenuItem {
                id: SETTINGS_MENU_ID.to_string(),
                title: SETTINGS_MENU_TITLE.to_string(),
                contexts: vec![MenuContext::Action],
            })
            .await?;
        tracing::debug!("registered context menu");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryContextMenus, MemorySettingsStore, MemoryTabs, StaticRuntime};
    use crate::settings::Settings;
    use std::sync::Arc;

    fn background() -> (Background, Arc<MemoryContextMenus>, Arc<MemoryTabs>) {
        let tabs = Arc::new(MemoryTabs::new());
        let menus = Arc::new(MemoryContextMenus::new());
        let interceptor = Interceptor::new(
            Arc::new(MemorySettingsStore::new(Settings::default())),
            tabs.clone(),
        );
        let background = Background::new(
            interceptor,
            menus.clone(),
            tabs.clone(),
            Arc::new(StaticRuntime::new("chrome-extension://quickadd")),
        );
        (background, menus, tabs)
    }

    #[tokio::test]
    async fn registration_is_idempotent() {
        let (background, menus, _) = background();

        background.on_installed().await.unwrap();
        background.on_startup().await.unwrap();
        background.on_startup().await.unwrap();

        let items = menus.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "open-settings");
        assert_eq!(items[0].title, "Open Settings");
        assert_eq!(items[0].contexts, [MenuContext::Action]);
    }

    #[tokio::test]
    async fn settings_item_opens_settings_page() {
        let (background, _, tabs) = background();

        let tab = background.on_menu_clicked("open-settings").await.unwrap();
        let tab = tab.expect("settings tab");
        assert_eq!(
            tabs.url(tab).as_deref(),
            Some("chrome-extension://quickadd/settings.html")
        );

        assert_eq!(background.on_menu_clicked("something-else").await.unwrap(), None);
        assert_eq!(tabs.len(), 1);
    }
}
