//! Plugin directory watcher for hot-reload support.

use crate::launcher::LauncherEvent;
use crate::{Error, Result};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info};

const WATCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Posts [`LauncherEvent::PluginChanged`] for every plugin directory that
/// changes on disk. Watching stops when this is dropped.
pub struct PluginWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
}

impl PluginWatcher {
    /// # Errors
    ///
    /// Returns an error if the watcher cannot be created or a directory
    /// cannot be watched.
    pub fn spawn(plugin_dirs: Vec<PathBuf>, events: UnboundedSender<LauncherEvent>) -> Result<Self> {
        let roots = plugin_dirs.clone();
        let mut debouncer = new_debouncer(WATCH_DEBOUNCE, move |result: DebounceEventResult| {
            match result {
                Ok(changes) => {
                    let names: BTreeSet<String> = changes
                        .iter()
                        .filter_map(|change| plugin_name_for(&change.path, &roots))
                        .collect();
                    for plugin in names {
                        debug!("Plugin {plugin} changed on disk");
                        if events.send(LauncherEvent::PluginChanged { plugin }).is_err() {
                            return;
                        }
                    }
                }
                Err(e) => error!("Plugin watcher error: {e}"),
            }
        })
        .map_err(|e| Error::Watch(e.to_string()))?;

        for dir in &plugin_dirs {
            if !dir.exists() {
                debug!("Not watching missing plugin directory {}", dir.display());
                continue;
            }
            debouncer
                .watcher()
                .watch(dir, RecursiveMode::Recursive)
                .map_err(|e| Error::Watch(e.to_string()))?;
            info!("Watching plugin directory: {}", dir.display());
        }

        Ok(Self {
            _debouncer: debouncer,
        })
    }
}

/// Name of the plugin owning `path`: its first component below a plugin root
fn plugin_name_for(path: &Path, roots: &[PathBuf]) -> Option<String> {
    roots.iter().find_map(|root| {
        let relative = path.strip_prefix(root).ok()?;
        match relative.components().next()? {
            Component::Normal(name) => name.to_str().map(ToString::to_string),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_name_for_nested_path() {
        let roots = vec![PathBuf::from("/home/u/.config/flint/plugins")];
        assert_eq!(
            plugin_name_for(
                Path::new("/home/u/.config/flint/plugins/clip/handler.sh"),
                &roots
            ),
            Some("clip".to_string())
        );
    }

    #[test]
    fn test_plugin_name_for_outside_roots() {
        let roots = vec![PathBuf::from("/plugins")];
        assert_eq!(plugin_name_for(Path::new("/other/clip/x"), &roots), None);
        assert_eq!(plugin_name_for(Path::new("/plugins"), &roots), None);
    }

    #[test]
    fn test_plugin_name_for_second_root() {
        let roots = vec![PathBuf::from("/a"), PathBuf::from("/b")];
        assert_eq!(
            plugin_name_for(Path::new("/b/tmux/manifest.json"), &roots),
            Some("tmux".to_string())
        );
    }
}
