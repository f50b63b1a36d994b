use std::sync::Arc;

use anyhow::Result;
use owo_colors::OwoColorize;
use quickadd_core::background::Background;
use quickadd_core::intercept::{InterceptOutcome, Interceptor};
use quickadd_core::memory::{MemoryContextMenus, MemoryTabs, StaticRuntime};
use quickadd_core::platform::NavigationDetails;

use crate::commands::EXTENSION_BASE;
use crate::config::FileSettingsStore;

pub async fn run(store: Arc<FileSettingsStore>, url: &str, frame_id: i64) -> Result<()> {
    let tabs = Arc::new(MemoryTabs::new());
    let background = Background::new(
        Interceptor::new(store, tabs.clone()),
        Arc::new(MemoryContextMenus::new()),
        tabs.clone(),
        Arc::new(StaticRuntime::new(EXTENSION_BASE)),
    );

    let details = NavigationDetails {
        tab_id: tabs.open(url),
        frame_id,
        url: url.to_string(),
    };
    let outcome = background.on_before_navigate(&details).await;

    match outcome {
        InterceptOutcome::Redirected(target) => println!("{target}"),
        InterceptOutcome::Disabled => {
            eprintln!("{}", "Interception is disabled, link left unchanged.".yellow());
            println!("{url}");
        }
        InterceptOutcome::Ignored => {
            if details.is_top_level() {
                eprintln!("{}", "Not a Google Calendar quick-add link.".dimmed());
            } else {
                eprintln!("{}", "Subframe navigations are never redirected.".dimmed());
            }
            println!("{url}");
        }
        InterceptOutcome::Failed => {
            anyhow::bail!("Could not redirect {url} (run with -v for details)")
        }
    }

    Ok(())
}
