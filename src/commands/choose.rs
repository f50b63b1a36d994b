use std::sync::Arc;

use anyhow::Result;
use owo_colors::OwoColorize;
use quickadd_core::chooser::{Chooser, ChooserState, Destinations};
use quickadd_core::constants::CHOOSER_PAGE;
use quickadd_core::handoff::{HandoffChannel, with_original};
use quickadd_core::memory::{MemoryPage, MemorySessionStorage, MemoryTabs, StaticRuntime};
use quickadd_core::platform::Runtime;

use crate::commands::EXTENSION_BASE;
use crate::config::FileSettingsStore;

pub async fn run(store: Arc<FileSettingsStore>, url: &str, via_handoff: bool) -> Result<()> {
    let tabs = Arc::new(MemoryTabs::new());
    let runtime = Arc::new(StaticRuntime::new(EXTENSION_BASE));
    let channel = HandoffChannel::new(Arc::new(MemorySessionStorage::new()));
    let chooser = Chooser::new(store, tabs.clone(), runtime.clone(), channel.clone());

    let chooser_page = runtime.get_url(CHOOSER_PAGE);
    let location = if via_handoff {
        channel.stage_pending(url).await?;
        chooser_page
    } else {
        with_original(&chooser_page, url)
    };
    tabs.open(&location);
    let page = MemoryPage::new(location);

    // A handoff-sourced load reloads the page once with the URL in place.
    for _ in 0..2 {
        match chooser.load(&page).await? {
            ChooserState::Ready(destinations) => {
                print_destinations(&destinations);
                return Ok(());
            }
            ChooserState::Reloading(reload) => {
                println!("{} {}", "Recovered from handoff, reloading".dimmed(), reload.dimmed());
            }
            ChooserState::Failed(failure) => anyhow::bail!("{failure}"),
        }
    }

    anyhow::bail!("Chooser did not settle after reloading")
}

fn print_destinations(destinations: &Destinations) {
    println!("{}", "Continue with original provider flow:".bold());
    println!("  {}", destinations.bounce.cyan());
    println!("{}", "Continue with custom handler:".bold());
    println!("  {}", destinations.handler.cyan());
}
