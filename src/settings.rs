//! Persistent application settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::module::{ModuleId, ModuleSelection};
use crate::project::{AutosaveConfig, CompactOptions};
use crate::util::{Error, Result};

const MAX_RECENT_FILES: usize = 10;

/// Application settings that persist between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Autosave
    pub autosave_period: u32, // minutes, 0 = off
    pub silent_autosave: bool,

    // Compact save defaults
    pub compact_binary: bool,
    pub compact_modules: Vec<String>,

    // Recent projects (most recent first, max 10)
    pub recent_projects: Vec<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        let autosave = AutosaveConfig::default();
        Self {
            autosave_period: autosave.period_minutes,
            silent_autosave: autosave.silent,
            compact_binary: true,
            compact_modules: ModuleId::ALL.iter().map(|id| id.name().to_string()).collect(),
            recent_projects: Vec::new(),
        }
    }
}

impl Settings {
    /// Get settings file path
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("tasproj");
            p.push("settings.json");
            p
        })
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        Self::path().map(|p| Self::load_from(&p)).unwrap_or_default()
    }

    /// Load settings from a file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed settings");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<()> {
        let path = Self::path().ok_or_else(|| Error::other("no config directory on this system"))?;
        self.save_to(&path)
    }

    /// Save settings to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::other(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Autosave part of the settings
    pub fn autosave(&self) -> AutosaveConfig {
        AutosaveConfig { period_minutes: self.autosave_period, silent: self.silent_autosave }
    }

    /// Default options for compact saves. Unknown module names are skipped.
    pub fn compact_options(&self) -> CompactOptions {
        let modules = self
            .compact_modules
            .iter()
            .filter_map(|name| ModuleId::from_name(name))
            .collect::<ModuleSelection>();
        CompactOptions { binary: self.compact_binary, modules }
    }

    /// Add project to recent list (moves to top if already present)
    pub fn add_recent(&mut self, path: PathBuf) {
        self.recent_projects.retain(|p| p != &path);
        self.recent_projects.insert(0, path);
        self.recent_projects.truncate(MAX_RECENT_FILES);
    }

    /// Get recent projects (filters out non-existent)
    pub fn recent_projects(&self) -> Vec<&PathBuf> {
        self.recent_projects.iter().filter(|p| p.exists()).collect()
    }
}
