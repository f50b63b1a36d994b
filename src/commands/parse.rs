use anyhow::{Context, Result};
use quickadd_core::quick_add::QuickAddEvent;

pub fn run(url: &str) -> Result<()> {
    let event = QuickAddEvent::from_url(url)?;
    let json = serde_json::to_string_pretty(&event).context("Failed to serialize event")?;
    println!("{json}");
    Ok(())
}
