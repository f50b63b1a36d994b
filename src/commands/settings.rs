use std::sync::Arc;

use anyhow::Result;
use owo_colors::OwoColorize;
use quickadd_core::settings_form::{SettingsForm, SettingsPage};

use crate::config::FileSettingsStore;

pub async fn show(store: Arc<FileSettingsStore>) -> Result<()> {
    let path = store.path().to_path_buf();
    let form = SettingsPage::new(store).load().await?;

    println!("{} {}", "Settings file:".dimmed(), path.display().dimmed());
    println!("redirect origin: {}", form.redirect_origin);
    println!(
        "enabled:         {}",
        if form.enabled { "yes".green().to_string() } else { "no".red().to_string() }
    );

    Ok(())
}

pub async fn set(
    store: Arc<FileSettingsStore>,
    redirect_origin: String,
    enabled: Option<bool>,
) -> Result<()> {
    let page = SettingsPage::new(store);
    let current = page.load().await?;

    let form = SettingsForm {
        redirect_origin,
        enabled: enabled.unwrap_or(current.enabled),
    };
    let status = page.submit(&form).await;

    if status.is_error() {
        anyhow::bail!("{}", status.text);
    }
    println!("{}", status.text.green());

    Ok(())
}
