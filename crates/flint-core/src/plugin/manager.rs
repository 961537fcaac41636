use super::{
    BuiltinFactory, Constructor, Manifest, Plugin, PluginContext, PluginFactory, PluginMeta,
    ScriptFactory, guarded, trigger_matches,
};
use crate::config::{PluginsConfig, warn_unknown_manifest_fields};
use crate::launcher::LauncherEvent;
use crate::{Error, Result};
use flint_types::SearchResult;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

const MANIFEST_FILENAME: &str = "manifest.json";

/// A discovered plugin: metadata and how to build it
struct PluginClass {
    meta: PluginMeta,
    factory: Box<dyn PluginFactory>,
    /// Plugin directory, for plugins found on disk
    dir: Option<PathBuf>,
}

/// Summary of one registered plugin
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginInfo {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub enabled: bool,
    pub active: bool,
    pub global: bool,
    pub triggers: Vec<String>,
}

/// Registry of discovered plugin classes and activated instances.
///
/// Discovery is cheap: only metadata is read. Instances are created when a
/// trigger is first used, or at startup for autostart plugins.
pub struct PluginManager {
    classes: HashMap<String, PluginClass>,
    /// Registration order; the tie-break for triggers claimed twice
    order: Vec<String>,
    instances: HashMap<String, Box<dyn Plugin>>,
    /// Activation order
    active: Vec<String>,
    /// Lowercased trigger -> plugin name, enabled plugins only
    trigger_map: HashMap<String, String>,
    constructors: HashMap<String, Constructor>,
    disabled: HashSet<String>,
    plugin_dirs: Vec<PathBuf>,
    events: UnboundedSender<LauncherEvent>,
}

impl PluginManager {
    pub fn new(events: UnboundedSender<LauncherEvent>) -> Self {
        Self {
            classes: HashMap::new(),
            order: Vec::new(),
            instances: HashMap::new(),
            active: Vec::new(),
            trigger_map: HashMap::new(),
            constructors: HashMap::new(),
            disabled: HashSet::new(),
            plugin_dirs: Vec::new(),
            events,
        }
    }

    /// Mark plugins as disabled. Applies to plugins registered afterwards.
    pub fn set_disabled<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled = names.into_iter().map(Into::into).collect();
    }

    /// Make a built-in constructor available to manifests (`"builtin": name`)
    pub fn provide_builtin(&mut self, name: &str, constructor: Constructor) {
        self.constructors.insert(name.to_string(), constructor);
    }

    /// Register a built-in plugin and expose its constructor to manifests
    pub fn register_builtin(&mut self, meta: PluginMeta, constructor: Constructor) {
        self.provide_builtin(&meta.name, constructor.clone());
        self.register(Box::new(BuiltinFactory::new(meta, constructor)));
    }

    pub fn register(&mut self, factory: Box<dyn PluginFactory>) {
        self.insert_class(factory, None);
        self.rebuild_trigger_map();
    }

    fn insert_class(&mut self, factory: Box<dyn PluginFactory>, dir: Option<PathBuf>) {
        let mut meta = factory.meta().clone();
        if self.disabled.contains(&meta.name) {
            meta.enabled = false;
        }

        let name = meta.name.clone();
        if self.order.contains(&name) {
            debug!("Replacing plugin class {name}");
        } else {
            self.order.push(name.clone());
        }
        debug!("Registered plugin {name} (triggers: {:?})", meta.triggers);
        self.classes.insert(name, PluginClass { meta, factory, dir });
    }

    /// Discover plugin directories under `path`. Units that fail to load are
    /// logged and skipped. Returns the number of plugins registered.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` exists but cannot be read.
    pub fn discover(&mut self, path: &Path) -> Result<usize> {
        if !self.plugin_dirs.iter().any(|p| p == path) {
            self.plugin_dirs.push(path.to_path_buf());
        }
        if !path.exists() {
            debug!("Plugin directory {} does not exist", path.display());
            return Ok(0);
        }

        let mut units: Vec<PathBuf> = std::fs::read_dir(path)?
            .flatten()
            .map(|entry| entry.path())
            .filter(|p| p.is_dir())
            .collect();
        units.sort();

        let mut count = 0;
        for unit in units {
            match self.load_unit(&unit) {
                Ok(factory) => {
                    self.insert_class(factory, Some(unit));
                    count += 1;
                }
                Err(e) => warn!("Failed to load plugin from {}: {e}", unit.display()),
            }
        }

        self.rebuild_trigger_map();
        info!("Discovered {count} plugins in {}", path.display());
        Ok(count)
    }

    fn load_unit(&self, dir: &Path) -> Result<Box<dyn PluginFactory>> {
        let manifest_path = dir.join(MANIFEST_FILENAME);
        if !manifest_path.exists() {
            return Err(Error::Plugin(format!(
                "{MANIFEST_FILENAME} not found in {}",
                dir.display()
            )));
        }

        let content = std::fs::read_to_string(&manifest_path)?;
        warn_unknown_manifest_fields(&content, &manifest_path.display().to_string());
        let manifest: Manifest = serde_json::from_str(&content).map_err(|e| {
            Error::Plugin(format!(
                "Failed to parse manifest at {}: {e}",
                manifest_path.display()
            ))
        })?;

        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::Plugin(format!("Invalid plugin directory: {}", dir.display())))?;
        let meta = manifest.to_meta(name);

        if let Some(builtin) = &manifest.builtin {
            let constructor = self
                .constructors
                .get(builtin)
                .ok_or_else(|| Error::Plugin(format!("{name}: unknown builtin '{builtin}'")))?;
            return Ok(Box::new(BuiltinFactory::new(meta, constructor.clone())));
        }

        match manifest.handler {
            Some(handler) => Ok(Box::new(ScriptFactory::new(
                meta,
                dir.to_path_buf(),
                handler,
            ))),
            None => Err(Error::Plugin(format!(
                "{name}: manifest declares neither builtin nor handler"
            ))),
        }
    }

    /// Rebuild the trigger index. The earliest-registered plugin keeps a
    /// trigger that several plugins declare.
    fn rebuild_trigger_map(&mut self) {
        self.trigger_map.clear();

        for name in &self.order {
            let Some(class) = self.classes.get(name) else {
                continue;
            };
            if !class.meta.enabled {
                continue;
            }
            for trigger in &class.meta.triggers {
                let key = trigger.to_lowercase();
                if key.trim().is_empty() {
                    continue;
                }
                match self.trigger_map.get(&key) {
                    Some(owner) if owner != name => {
                        warn!("Trigger '{trigger}' of {name} already claimed by {owner}");
                    }
                    Some(_) => {}
                    None => {
                        self.trigger_map.insert(key, name.clone());
                    }
                }
            }
        }
    }

    /// Instantiate and initialize a plugin. Already-active plugins succeed
    /// immediately; on failure nothing of the new instance is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the plugin is unknown, disabled, or fails to
    /// construct or initialize.
    pub fn activate_plugin(&mut self, name: &str) -> Result<()> {
        if self.instances.contains_key(name) {
            return Ok(());
        }

        let class = self
            .classes
            .get(name)
            .ok_or_else(|| Error::PluginNotFound(name.to_string()))?;

        if !class.meta.enabled {
            return Err(Error::Activation {
                plugin: name.to_string(),
                reason: "plugin is disabled".to_string(),
            });
        }

        let ctx = PluginContext::new(name, self.events.clone());
        let instance = guarded(|| {
            let mut instance = class.factory.create()?;
            instance.initialize(&ctx)?;
            Ok(instance)
        })
        .map_err(|e| {
            warn!("[{name}] activation failed: {e:#}");
            Error::Activation {
                plugin: name.to_string(),
                reason: format!("{e:#}"),
            }
        })?;

        self.instances.insert(name.to_string(), instance);
        self.active.push(name.to_string());
        info!("[{name}] activated");
        Ok(())
    }

    /// Clean up and drop a live plugin. Cleanup failures are logged; the
    /// instance is removed either way. Returns false if it was not active.
    pub fn deactivate_plugin(&mut self, name: &str) -> bool {
        let Some(mut instance) = self.instances.remove(name) else {
            return false;
        };
        self.active.retain(|n| n != name);

        if let Err(e) = guarded(|| instance.cleanup()) {
            warn!("[{name}] cleanup failed: {e:#}");
        }
        info!("[{name}] deactivated");
        true
    }

    /// Owner of `trigger`, activated on the spot if needed.
    ///
    /// Returns `None` if no plugin declares the trigger or activation fails.
    pub fn get_plugin_for_trigger(&mut self, trigger: &str) -> Option<String> {
        let lower = trigger.to_lowercase();
        let word = lower.trim();
        let owner = [lower.clone(), word.to_string(), format!("{word} ")]
            .iter()
            .find_map(|key| self.trigger_map.get(key))
            .cloned()?;

        match self.activate_plugin(&owner) {
            Ok(()) => Some(owner),
            Err(e) => {
                debug!("Trigger '{trigger}' unavailable: {e}");
                None
            }
        }
    }

    /// Find and activate an inactive plugin whose trigger claims `query`.
    ///
    /// Longer triggers are tried first; a plugin that fails to activate does
    /// not stop the next candidate.
    pub fn activate_for_query(&mut self, query: &str) -> Option<String> {
        let lower = query.trim().to_lowercase();
        if lower.is_empty() {
            return None;
        }

        let mut candidates: Vec<(&String, &String)> = self
            .trigger_map
            .iter()
            .filter(|(key, owner)| {
                !self.instances.contains_key(owner.as_str()) && trigger_matches(&lower, key)
            })
            .collect();
        candidates.sort_by(|(a_key, a_owner), (b_key, b_owner)| {
            b_key
                .len()
                .cmp(&a_key.len())
                .then_with(|| self.position(a_owner).cmp(&self.position(b_owner)))
                .then_with(|| a_key.cmp(b_key))
        });
        let candidates: Vec<String> = candidates.into_iter().map(|(k, _)| k.clone()).collect();

        candidates
            .iter()
            .find_map(|key| self.get_plugin_for_trigger(key))
    }

    fn position(&self, name: &str) -> usize {
        self.order
            .iter()
            .position(|n| n == name)
            .unwrap_or(usize::MAX)
    }

    /// Query a live plugin. Failures and panics are logged and yield no results.
    pub fn query(&mut self, name: &str, query: &str) -> Vec<SearchResult> {
        let Some(instance) = self.instances.get_mut(name) else {
            debug!("[{name}] query skipped, plugin not active");
            return Vec::new();
        };

        match guarded(|| instance.query(query)) {
            Ok(results) => {
                debug!("[{name}] '{query}' -> {} results", results.len());
                results
                    .into_iter()
                    .map(|mut result| {
                        if result.plugin_name.is_empty() {
                            result.plugin_name = name.to_string();
                        }
                        result
                    })
                    .collect()
            }
            Err(e) => {
                warn!("[{name}] query failed: {e:#}");
                Vec::new()
            }
        }
    }

    /// Run a plugin command.
    ///
    /// # Errors
    ///
    /// Returns an error if the plugin is not active or the command fails.
    pub fn execute(&mut self, name: &str, command: &str, args: &serde_json::Value) -> Result<()> {
        let instance = self
            .instances
            .get_mut(name)
            .ok_or_else(|| Error::PluginNotFound(name.to_string()))?;

        guarded(|| instance.execute(command, args))
            .map_err(|e| Error::Plugin(format!("{name}: {command} failed: {e:#}")))
    }

    /// Deactivate, rediscover from disk and reactivate if it was active.
    ///
    /// Built-in plugins keep their class and are simply restarted. A plugin
    /// whose directory no longer loads is dropped from the registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the plugin cannot be found, rediscovered or
    /// reactivated.
    pub fn reload_plugin(&mut self, name: &str) -> Result<()> {
        let was_active = self.deactivate_plugin(name);

        let dir = match self.classes.get(name) {
            Some(class) => class.dir.clone(),
            None => Some(
                self.plugin_dirs
                    .iter()
                    .map(|base| base.join(name))
                    .find(|dir| dir.join(MANIFEST_FILENAME).exists())
                    .ok_or_else(|| Error::PluginNotFound(name.to_string()))?,
            ),
        };

        if let Some(dir) = dir {
            self.classes.remove(name);
            match self.load_unit(&dir) {
                Ok(factory) => self.insert_class(factory, Some(dir)),
                Err(e) => {
                    self.order.retain(|n| n != name);
                    self.rebuild_trigger_map();
                    warn!("[{name}] dropped after failed reload: {e}");
                    return Err(e);
                }
            }
        }

        self.rebuild_trigger_map();
        info!("[{name}] reloaded");

        if was_active {
            self.activate_plugin(name)?;
        }
        Ok(())
    }

    /// Activate startup plugins. Failures are logged and skipped.
    pub fn activate_autostart(&mut self, config: &PluginsConfig) {
        let names: Vec<String> = self
            .order
            .iter()
            .filter(|name| config.should_autostart(name))
            .filter(|name| self.classes.get(*name).is_some_and(|c| c.meta.enabled))
            .cloned()
            .collect();

        for name in names {
            if let Err(e) = self.activate_plugin(&name) {
                warn!("Autostart of {name} failed: {e}");
            }
        }
    }

    /// Deactivate every live plugin
    pub fn shutdown(&mut self) {
        for name in self.active.clone() {
            self.deactivate_plugin(&name);
        }
    }

    #[must_use]
    pub fn is_active(&self, name: &str) -> bool {
        self.instances.contains_key(name)
    }

    #[must_use]
    pub fn meta(&self, name: &str) -> Option<&PluginMeta> {
        self.classes.get(name).map(|c| &c.meta)
    }

    /// All registered plugins in registration order
    pub fn metas(&self) -> impl Iterator<Item = &PluginMeta> {
        self.order
            .iter()
            .filter_map(|name| self.classes.get(name))
            .map(|c| &c.meta)
    }

    /// Live plugins in registration order
    pub fn active_metas(&self) -> impl Iterator<Item = &PluginMeta> {
        self.metas().filter(|meta| self.is_active(&meta.name))
    }

    /// Names of live plugins in activation order
    #[must_use]
    pub fn active_names(&self) -> &[String] {
        &self.active
    }

    #[must_use]
    pub fn trigger_owner(&self, trigger: &str) -> Option<&str> {
        self.trigger_map
            .get(&trigger.to_lowercase())
            .map(String::as_str)
    }

    /// Whether `word` is exactly some enabled plugin's trigger, ignoring
    /// case and a trailing space
    #[must_use]
    pub fn is_trigger_word(&self, word: &str) -> bool {
        let word = word.trim().to_lowercase();
        !word.is_empty() && self.trigger_map.keys().any(|key| key.trim() == word)
    }

    /// Whether some enabled plugin's trigger claims `query`, active or not
    #[must_use]
    pub fn claims_query(&self, query: &str) -> bool {
        let lower = query.trim().to_lowercase();
        !lower.is_empty() && self.trigger_map.keys().any(|key| trigger_matches(&lower, key))
    }

    /// Enabled trigger words in registration order, without duplicates
    #[must_use]
    pub fn trigger_words(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.metas()
            .filter(|meta| meta.enabled)
            .flat_map(|meta| meta.triggers.iter())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
            .collect()
    }

    #[must_use]
    pub fn plugin_dirs(&self) -> &[PathBuf] {
        &self.plugin_dirs
    }

    #[must_use]
    pub fn list(&self) -> Vec<PluginInfo> {
        self.metas()
            .map(|meta| PluginInfo {
                name: meta.name.clone(),
                display_name: meta.display_name.clone(),
                description: meta.description.clone(),
                enabled: meta.enabled,
                active: self.is_active(&meta.name),
                global: meta.global,
                triggers: meta.triggers.clone(),
            })
            .collect()
    }
}
