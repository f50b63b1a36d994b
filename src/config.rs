use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use quickadd_core::platform::SettingsStore;
use quickadd_core::{QuickAddError, QuickAddResult, Settings};

/// Get the config directory path (~/.config/quickadd)
pub fn config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("quickadd");
    Ok(config_dir)
}

/// Get the settings file path (~/.config/quickadd/settings.toml)
pub fn settings_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("settings.toml"))
}

/// Settings store backed by a TOML file using the synced store's keys
/// (`redirectOrigin`, `enabled`).
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: PathBuf) -> Self {
        FileSettingsStore { path }
    }

    pub fn open_default() -> Result<Self> {
        Ok(Self::new(settings_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings, treating a missing file as "nothing stored".
    pub fn load(&self) -> Result<Settings> {
        tracing::debug!(path = %self.path.display(), "loading settings");
        if !self.path.exists() {
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings file at {}", self.path.display()))?;

        let settings: Settings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file at {}", self.path.display()))?;

        Ok(settings)
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory at {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(settings).context("Failed to serialize settings")?;

        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write settings file at {}", self.path.display()))?;

        Ok(())
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn get(&self) -> QuickAddResult<Settings> {
        self.load().map_err(|e| QuickAddError::Storage(format!("{e:#}")))
    }

    async fn set(&self, settings: &Settings) -> QuickAddResult<()> {
        self.save(settings).map_err(|e| QuickAddError::Storage(format!("{e:#}")))
    }
}
