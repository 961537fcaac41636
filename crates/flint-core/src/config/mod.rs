mod dirs;
mod settings;
mod triggers;
mod validation;

pub use dirs::Directories;
pub use settings::{Config, LauncherConfig, PluginsConfig};
pub use triggers::{TriggerConfig, TriggerInfo, TriggerSettings};
pub use validation::{warn_unknown_fields, warn_unknown_manifest_fields};
