//! Display metadata for trigger suggestions (`triggers.json`).
//!
//! Only the suggestion rows read this; query routing never does.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerInfo {
    #[serde(default)]
    pub examples: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerSettings {
    #[serde(default = "default_max_examples")]
    pub max_examples_shown: usize,

    #[serde(default = "default_icon")]
    pub default_icon: String,

    #[serde(default = "default_template")]
    pub fallback_example_template: String,
}

fn default_max_examples() -> usize {
    2
}
fn default_icon() -> String {
    "apps".to_string()
}
fn default_template() -> String {
    "{trigger} <search>".to_string()
}

impl Default for TriggerSettings {
    fn default() -> Self {
        Self {
            max_examples_shown: default_max_examples(),
            default_icon: default_icon(),
            fallback_example_template: default_template(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TriggerFile {
    #[serde(default)]
    triggers: BTreeMap<String, TriggerInfo>,

    #[serde(default)]
    settings: TriggerSettings,
}

#[derive(Debug, Clone)]
pub struct TriggerConfig {
    path: Option<PathBuf>,
    triggers: BTreeMap<String, TriggerInfo>,
    pub settings: TriggerSettings,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            path: None,
            triggers: default_triggers(),
            settings: TriggerSettings::default(),
        }
    }
}

fn default_triggers() -> BTreeMap<String, TriggerInfo> {
    let entry = |examples: &[&str], icon: &str, description: &str| TriggerInfo {
        examples: examples.iter().map(ToString::to_string).collect(),
        icon: Some(icon.to_string()),
        description: Some(description.to_string()),
    };

    BTreeMap::from([
        (
            "app".to_string(),
            entry(
                &["app firefox", "app chrome", "app terminal"],
                "apps",
                "Applications - Launch installed applications",
            ),
        ),
        (
            "calc".to_string(),
            entry(
                &["calc 2+2", "calc sqrt(16)", "calc pi*2"],
                "calculator",
                "Calculator - Perform mathematical calculations",
            ),
        ),
        (
            "file".to_string(),
            entry(
                &["file document.pdf", "file *.py", "file config"],
                "file",
                "Files - Search for files and documents",
            ),
        ),
    ])
}

impl TriggerConfig {
    /// Load trigger metadata. A missing file, or one without triggers, is
    /// seeded with the default set.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let file = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str::<TriggerFile>(&content)?
        } else {
            TriggerFile::default()
        };

        let triggers = if file.triggers.is_empty() {
            default_triggers()
        } else {
            file.triggers
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            triggers,
            settings: file.settings,
        })
    }

    /// Write back to the file this config was loaded from.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no backing file or it cannot be written.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Err(crate::Error::Config(
                "trigger config has no backing file".to_string(),
            ));
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = TriggerFile {
            triggers: self.triggers.clone(),
            settings: self.settings.clone(),
        };
        std::fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    /// Examples for a trigger, or the fallback template when none are configured
    #[must_use]
    pub fn examples(&self, trigger: &str) -> Vec<String> {
        let key = trigger.trim();
        match self.triggers.get(key) {
            Some(info) if !info.examples.is_empty() => info.examples.clone(),
            _ => vec![
                self.settings
                    .fallback_example_template
                    .replace("{trigger}", key),
            ],
        }
    }

    #[must_use]
    pub fn icon(&self, trigger: &str) -> &str {
        self.triggers
            .get(trigger.trim())
            .and_then(|info| info.icon.as_deref())
            .unwrap_or(&self.settings.default_icon)
    }

    #[must_use]
    pub fn description(&self, trigger: &str) -> String {
        let key = trigger.trim();
        self.triggers
            .get(key)
            .and_then(|info| info.description.clone())
            .unwrap_or_else(|| format!("{key} - No description available"))
    }

    #[must_use]
    pub fn max_examples_shown(&self) -> usize {
        self.settings.max_examples_shown
    }

    pub fn all_triggers(&self) -> impl Iterator<Item = (&str, &TriggerInfo)> {
        self.triggers.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn add_trigger(
        &mut self,
        trigger: &str,
        examples: Vec<String>,
        icon: Option<String>,
        description: Option<String>,
    ) {
        let key = trigger.trim().to_string();
        let info = TriggerInfo {
            examples,
            icon: Some(icon.unwrap_or_else(|| self.settings.default_icon.clone())),
            description: Some(description.unwrap_or_else(|| format!("{key} - Custom trigger"))),
        };
        self.triggers.insert(key, info);
    }

    /// Returns false if the trigger was not configured
    pub fn remove_trigger(&mut self, trigger: &str) -> bool {
        self.triggers.remove(trigger.trim()).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_triggers_seeded() {
        let config = TriggerConfig::default();
        assert_eq!(config.icon("calc"), "calculator");
        assert_eq!(config.max_examples_shown(), 2);
        assert_eq!(config.examples("app")[0], "app firefox");
    }

    #[test]
    fn test_unknown_trigger_fallbacks() {
        let config = TriggerConfig::default();
        assert_eq!(config.examples("otp "), vec!["otp <search>".to_string()]);
        assert_eq!(config.icon("otp"), "apps");
        assert_eq!(config.description("otp"), "otp - No description available");
    }

    #[test]
    fn test_load_missing_file_seeds_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = TriggerConfig::load(&dir.path().join("triggers.json")).unwrap();
        assert!(config.all_triggers().any(|(t, _)| t == "file"));
    }

    #[test]
    fn test_load_custom_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("triggers.json");
        std::fs::write(
            &path,
            r#"{
                "triggers": {"otp": {"examples": ["otp github"], "icon": "key"}},
                "settings": {"maxExamplesShown": 1, "fallbackExampleTemplate": "{trigger} ..."}
            }"#,
        )
        .unwrap();

        let config = TriggerConfig::load(&path).unwrap();
        assert_eq!(config.icon("otp"), "key");
        assert_eq!(config.max_examples_shown(), 1);
        assert_eq!(config.examples("calc"), vec!["calc ...".to_string()]);
        assert!(!config.all_triggers().any(|(t, _)| t == "app"));
    }

    #[test]
    fn test_add_remove_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("triggers.json");
        let mut config = TriggerConfig::load(&path).unwrap();

        config.add_trigger("tmux", vec!["tmux main".to_string()], None, None);
        assert!(config.remove_trigger("file"));
        assert!(!config.remove_trigger("file"));
        config.save().unwrap();

        let reloaded = TriggerConfig::load(&path).unwrap();
        assert_eq!(reloaded.icon("tmux"), "apps");
        assert_eq!(reloaded.description("tmux"), "tmux - Custom trigger");
        assert!(!reloaded.all_triggers().any(|(t, _)| t == "file"));
    }

    #[test]
    fn test_save_without_path_fails() {
        assert!(TriggerConfig::default().save().is_err());
    }
}
