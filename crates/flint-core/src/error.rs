use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Plugin error: {0}")]
    Plugin(String),

    #[error("Plugin not found: {0}")]
    PluginNotFound(String),

    #[error("Failed to activate plugin {plugin}: {reason}")]
    Activation { plugin: String, reason: String },

    #[error("Result has no action")]
    NoAction,

    #[error("Watch error: {0}")]
    Watch(String),
}

pub type Result<T> = std::result::Result<T, Error>;
