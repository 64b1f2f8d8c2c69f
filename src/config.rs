//! Configuration handling for the wizard

use crate::forms::WizardOptions;
use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Default number of answer changes between draft saves
pub const DEFAULT_AUTO_SAVE_EVERY: usize = 5;

/// User configuration for wizard sessions
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WizardConfig {
    /// Allow moving back to earlier steps
    pub allow_back: Option<bool>,
    /// Save a draft after this many changes; 0 disables auto-save
    pub auto_save_every: Option<usize>,
    /// Directory for drafts and submissions
    pub store_dir: Option<PathBuf>,
}

impl WizardConfig {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("org", "intake", "intake-forms")
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if let Some(path) = path {
            if path.exists() {
                let content = fs::read_to_string(&path)?;
                let config: WizardConfig = serde_json::from_str(&content)?;
                return Ok(config);
            }
        }

        Ok(Self::default())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let content = serde_json::to_string_pretty(self)?;
            fs::write(&path, content)?;
        }
        Ok(())
    }

    pub fn allow_back(&self) -> bool {
        self.allow_back.unwrap_or(true)
    }

    pub fn auto_save_every(&self) -> usize {
        self.auto_save_every.unwrap_or(DEFAULT_AUTO_SAVE_EVERY)
    }

    /// Configured store directory, else the platform data directory
    pub fn store_dir(&self) -> PathBuf {
        self.store_dir
            .clone()
            .or_else(|| Self::project_dirs().map(|dirs| dirs.data_dir().to_path_buf()))
            .unwrap_or_else(|| PathBuf::from(".intake-forms"))
    }
}

impl From<&WizardConfig> for WizardOptions {
    fn from(config: &WizardConfig) -> Self {
        Self {
            allow_back: config.allow_back(),
        }
    }
}
