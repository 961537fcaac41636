//! Plugin contract and registry.
//!
//! A plugin is described statically by [`PluginMeta`] and produced on demand by
//! a [`PluginFactory`]. The [`PluginManager`] keeps factories for everything it
//! discovered and only materializes a [`Plugin`] when its trigger is used.

mod manager;
mod manifest;
mod meta;
mod script;
mod watcher;

pub use manager::{PluginInfo, PluginManager};
pub use manifest::{Handler, Manifest};
pub use meta::PluginMeta;
pub(crate) use meta::trigger_matches;
pub use script::{ScriptFactory, ScriptPlugin};
pub use watcher::PluginWatcher;

use crate::launcher::LauncherEvent;
use flint_types::SearchResult;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Behavior of a live plugin instance.
///
/// Every call may fail; the registry logs failures and degrades to empty
/// results instead of propagating them.
pub trait Plugin: Send {
    /// Called once after construction, before the first query.
    ///
    /// # Errors
    ///
    /// An error aborts activation and nothing of the instance is kept.
    fn initialize(&mut self, ctx: &PluginContext) -> anyhow::Result<()>;

    /// Called before the instance is dropped.
    ///
    /// # Errors
    ///
    /// Errors are logged; the instance is dropped regardless.
    fn cleanup(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Produce results for the text after the trigger (possibly empty).
    ///
    /// # Errors
    ///
    /// An error is treated as an empty result list.
    fn query(&mut self, query: &str) -> anyhow::Result<Vec<SearchResult>>;

    /// Run a command named by an [`Action::Plugin`](flint_types::Action::Plugin).
    ///
    /// # Errors
    ///
    /// Returns an error if the command is unknown or fails.
    fn execute(&mut self, command: &str, args: &serde_json::Value) -> anyhow::Result<()> {
        let _ = args;
        anyhow::bail!("unsupported command: {command}")
    }
}

/// Produces plugin instances. Discovery records factories, activation calls them.
pub trait PluginFactory: Send {
    fn meta(&self) -> &PluginMeta;

    /// # Errors
    ///
    /// Returns an error if the instance cannot be constructed.
    fn create(&self) -> anyhow::Result<Box<dyn Plugin>>;
}

pub type Constructor = Arc<dyn Fn() -> anyhow::Result<Box<dyn Plugin>> + Send + Sync>;

/// Factory for plugins compiled into the binary
pub struct BuiltinFactory {
    meta: PluginMeta,
    constructor: Constructor,
}

impl BuiltinFactory {
    pub fn new(meta: PluginMeta, constructor: Constructor) -> Self {
        Self { meta, constructor }
    }
}

impl PluginFactory for BuiltinFactory {
    fn meta(&self) -> &PluginMeta {
        &self.meta
    }

    fn create(&self) -> anyhow::Result<Box<dyn Plugin>> {
        (self.constructor)()
    }
}

/// Handle given to a plugin on initialization.
///
/// Cloneable so background workers can keep one and ask for a refresh from
/// any thread; the launcher re-runs the search on its own loop.
#[derive(Debug, Clone)]
pub struct PluginContext {
    name: String,
    events: UnboundedSender<LauncherEvent>,
}

impl PluginContext {
    #[must_use]
    pub fn new(name: &str, events: UnboundedSender<LauncherEvent>) -> Self {
        Self {
            name: name.to_string(),
            events,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn request_refresh(&self) {
        let event = LauncherEvent::Refresh {
            plugin: self.name.clone(),
        };
        if self.events.send(event).is_err() {
            debug!("[{}] refresh requested after launcher shut down", self.name);
        }
    }
}

/// Run a plugin call, turning panics into errors.
pub(crate) fn guarded<T>(call: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<T> {
    match std::panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(anyhow::anyhow!("plugin panicked: {message}"))
        }
    }
}
