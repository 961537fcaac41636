use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration (`config.json`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub launcher: LauncherConfig,

    #[serde(default)]
    pub plugins: PluginsConfig,
}

impl Config {
    /// Load config from file. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        super::validation::warn_unknown_fields(&content, "config.json");
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save config to file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LauncherConfig {
    /// Result cap outside trigger mode
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    #[serde(default = "default_search_debounce")]
    pub search_debounce_ms: u64,

    /// Delay after the automatic space following a bare trigger word
    #[serde(default = "default_trigger_debounce")]
    pub trigger_debounce_ms: u64,

    /// Rows moved by Page Up / Page Down
    #[serde(default = "default_page_step")]
    pub page_step: usize,

    /// Query `global` plugins when no trigger or suggestion matches
    #[serde(default = "default_true")]
    pub global_search: bool,
}

fn default_max_results() -> usize {
    10
}
fn default_search_debounce() -> u64 {
    150
}
fn default_trigger_debounce() -> u64 {
    50
}
fn default_page_step() -> usize {
    5
}
fn default_true() -> bool {
    true
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            search_debounce_ms: default_search_debounce(),
            trigger_debounce_ms: default_trigger_debounce(),
            page_step: default_page_step(),
            global_search: default_true(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginsConfig {
    /// Plugins activated at startup. `None` activates every enabled plugin;
    /// plugins left out stay lazy until their trigger is typed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autostart: Option<Vec<String>>,

    /// Plugins that never match a trigger and never activate
    #[serde(default)]
    pub disabled: Vec<String>,

    /// Hot-reload plugins when their directory changes
    #[serde(default = "default_true")]
    pub watch: bool,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            autostart: None,
            disabled: Vec::new(),
            watch: default_true(),
        }
    }
}

impl PluginsConfig {
    #[must_use]
    pub fn should_autostart(&self, name: &str) -> bool {
        match &self.autostart {
            Some(list) => list.iter().any(|n| n == name),
            None => true,
        }
    }
}
