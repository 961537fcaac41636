use super::PluginMeta;
use serde::{Deserialize, Serialize};

/// Plugin manifest (manifest.json)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Display name; the plugin's registry name is its directory name
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub triggers: Vec<String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub global: bool,

    /// Name of a registered built-in constructor
    #[serde(default)]
    pub builtin: Option<String>,

    /// External handler process
    #[serde(default)]
    pub handler: Option<Handler>,
}

fn default_enabled() -> bool {
    true
}

/// Handler process configuration for script plugins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handler {
    /// Program to run, relative paths resolve against the plugin directory
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    2000
}

impl Manifest {
    /// Registry metadata for a plugin living in directory `name`
    #[must_use]
    pub fn to_meta(&self, name: &str) -> PluginMeta {
        PluginMeta {
            name: name.to_string(),
            display_name: self.name.clone(),
            description: self.description.clone().unwrap_or_default(),
            enabled: self.enabled,
            global: self.global,
            triggers: self.triggers.clone(),
        }
    }
}
