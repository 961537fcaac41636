//! Launcher session: owns the query, trigger mode, results and focus, and
//! turns [`LauncherEvent`]s into [`LauncherUpdate`]s.
//!
//! All state is mutated from one task. Timers and plugin workers talk to it
//! only by posting events.

mod focus;
mod invoke;
mod search;
mod suggestions;
mod trigger;

pub use flint_types::{LauncherEvent, LauncherUpdate};
pub use trigger::{detect_trigger, extract_query_after_trigger, still_triggered};

use crate::Result;
use crate::config::{Config, TriggerConfig};
use crate::plugin::{PluginManager, PluginWatcher};
use flint_types::{FocusMode, SearchResult};
use search::SHOW_ALL_TRIGGERS;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

/// Current launcher state
#[derive(Debug, Clone, Default)]
pub struct LauncherState {
    pub visible: bool,

    /// Text the last search was scheduled for
    pub query: String,

    /// Raw search entry text
    pub entry_text: String,

    /// Empty when not in trigger mode
    pub active_trigger: String,

    /// Name of the plugin owning trigger mode; set iff `active_trigger` is
    pub triggered_plugin: Option<String>,

    pub results: Vec<SearchResult>,

    /// Valid when `results` is non-empty
    pub selected_index: usize,

    pub focus_mode: FocusMode,
    pub header_button_index: usize,
    pub header_button_count: usize,

    /// Opened with a seed text; Escape closes instead of leaving trigger mode
    pub opened_with_trigger: bool,

    /// Next text change is the result of a Backspace in trigger mode
    backspace_pending: bool,
}

impl LauncherState {
    /// Both halves of trigger mode must be present; anything else counts as
    /// untriggered.
    #[must_use]
    pub fn in_trigger_mode(&self) -> bool {
        self.triggered_plugin.is_some() && !self.active_trigger.is_empty()
    }

    #[must_use]
    pub fn selected_result(&self) -> Option<&SearchResult> {
        self.results.get(self.selected_index)
    }
}

pub struct Launcher {
    config: Config,
    triggers: TriggerConfig,
    plugins: PluginManager,
    state: LauncherState,
    events_tx: UnboundedSender<LauncherEvent>,
    events_rx: UnboundedReceiver<LauncherEvent>,
    update_tx: UnboundedSender<LauncherUpdate>,
}

impl Launcher {
    /// Create a launcher with an empty plugin registry.
    /// Returns the launcher and a receiver for renderer updates.
    pub fn new(config: Config, triggers: TriggerConfig) -> (Self, UnboundedReceiver<LauncherUpdate>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        let mut plugins = PluginManager::new(events_tx.clone());
        plugins.set_disabled(config.plugins.disabled.iter().cloned());

        (
            Self {
                config,
                triggers,
                plugins,
                state: LauncherState::default(),
                events_tx,
                events_rx,
                update_tx,
            },
            update_rx,
        )
    }

    /// Activate autostart plugins. Call after registration and discovery.
    pub fn start(&mut self) {
        self.plugins.activate_autostart(&self.config.plugins);
        info!(
            "Launcher started with {} active plugins",
            self.plugins.active_names().len()
        );
    }

    /// Watch plugin directories if enabled in config.
    ///
    /// # Errors
    ///
    /// Returns an error if the watcher cannot be set up.
    pub fn watch_plugins(&self) -> Result<Option<PluginWatcher>> {
        if !self.config.plugins.watch {
            return Ok(None);
        }
        let dirs = self.plugins.plugin_dirs().to_vec();
        PluginWatcher::spawn(dirs, self.events_tx.clone()).map(Some)
    }

    /// Sender for renderers, plugin workers and timers
    #[must_use]
    pub fn events(&self) -> UnboundedSender<LauncherEvent> {
        self.events_tx.clone()
    }

    /// Drain events until [`LauncherEvent::Shutdown`], then deactivate all plugins.
    pub async fn run(&mut self) {
        while let Some(event) = self.events_rx.recv().await {
            if matches!(event, LauncherEvent::Shutdown) {
                break;
            }
            self.process(event);
        }
        self.plugins.shutdown();
        info!("Launcher stopped");
    }

    /// Process events already queued, without waiting. Returns how many ran.
    pub fn process_pending(&mut self) -> usize {
        let mut count = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            if !matches!(event, LauncherEvent::Shutdown) {
                self.process(event);
            }
            count += 1;
        }
        count
    }

    pub fn process(&mut self, event: LauncherEvent) {
        match event {
            LauncherEvent::TextChanged { text } => self.handle_text_changed(text),
            LauncherEvent::Key { press } => {
                self.handle_key(press);
            }
            LauncherEvent::SearchDue { query } => self.handle_search_due(&query),
            LauncherEvent::Refresh { plugin } => self.handle_refresh(&plugin),
            LauncherEvent::PluginChanged { plugin } => self.handle_plugin_changed(&plugin),
            LauncherEvent::Show { seed, external } => {
                self.show_launcher(seed.as_deref(), external);
            }
            LauncherEvent::Hide => self.hide_launcher(),
            LauncherEvent::ResultClicked { index } => self.handle_result_clicked(index),
            LauncherEvent::HeaderButtons { count } => self.set_header_buttons(count),
            LauncherEvent::Invoke { command } => {
                if let Err(e) = self.invoke(&command) {
                    warn!("Invocation '{command}' failed: {e}");
                }
            }
            LauncherEvent::Shutdown => {}
        }
    }

    /// Open the launcher. A seed is handled as if typed; `external` runs its
    /// search right away instead of after the debounce.
    pub fn show_launcher(&mut self, seed: Option<&str>, external: bool) {
        self.state.visible = true;
        self.send_update(LauncherUpdate::Show);

        let seed = seed.filter(|s| !s.trim().is_empty());
        self.state.opened_with_trigger = seed.is_some_and(|text| self.plugins.claims_query(text));

        match seed {
            Some(text) => {
                debug!("Opened with '{text}' (external: {external})");
                self.set_entry_text(text);
                match self.route_entry_text() {
                    Some((query, _)) if external => self.perform_search(&query),
                    Some((query, delay_ms)) => self.schedule_search(query, delay_ms),
                    None => {}
                }
            }
            None => {
                self.set_entry_text("");
                self.state.query.clear();
                self.exit_trigger_mode();
                self.show_available_triggers();
            }
        }
    }

    /// Close and reset the session
    pub fn hide_launcher(&mut self) {
        let header_button_count = self.state.header_button_count;
        self.state = LauncherState {
            header_button_count,
            ..LauncherState::default()
        };
        self.send_update(LauncherUpdate::Close);
    }

    fn handle_refresh(&mut self, plugin: &str) {
        let query = self.state.query.trim();
        if !self.state.visible || query.is_empty() || query == SHOW_ALL_TRIGGERS {
            return;
        }

        let owns_view = if self.state.in_trigger_mode() {
            self.state.triggered_plugin.as_deref() == Some(plugin)
        } else {
            self.plugins.meta(plugin).is_some_and(|meta| meta.global)
        };
        if !owns_view {
            return;
        }

        debug!("[{plugin}] refreshing results");
        let selected = self.state.selected_index;
        let query = self.state.query.clone();
        self.perform_search(&query);
        if selected < self.state.results.len() && selected != 0 {
            self.select(selected);
        }
    }

    fn handle_plugin_changed(&mut self, plugin: &str) {
        let was_triggered = self.state.triggered_plugin.as_deref() == Some(plugin);
        if let Err(e) = self.plugins.reload_plugin(plugin) {
            warn!("[{plugin}] reload failed: {e}");
        }

        if was_triggered {
            self.exit_trigger_mode();
            if self.state.visible {
                let query = self.state.query.clone();
                self.perform_search(&query);
            }
        }
    }

    fn set_header_buttons(&mut self, count: usize) {
        self.state.header_button_count = count;
        if count == 0 {
            self.state.header_button_index = 0;
            if self.state.focus_mode == FocusMode::Header {
                self.set_focus(FocusMode::Search);
            }
        } else if self.state.header_button_index >= count {
            self.state.header_button_index = count - 1;
        }
    }

    fn enter_trigger_mode(&mut self, plugin: &str, trigger: &str) {
        debug!("Entering trigger mode '{trigger}' ({plugin})");
        self.state.triggered_plugin = Some(plugin.to_string());
        self.state.active_trigger = trigger.to_string();
    }

    fn exit_trigger_mode(&mut self) {
        if self.state.triggered_plugin.is_some() || !self.state.active_trigger.is_empty() {
            debug!("Leaving trigger mode '{}'", self.state.active_trigger);
        }
        self.state.triggered_plugin = None;
        self.state.active_trigger.clear();
    }

    /// Replace the entry text programmatically, caret at the end
    fn set_entry_text(&mut self, text: &str) {
        self.state.entry_text = text.to_string();
        self.send_update(LauncherUpdate::EntryText {
            text: text.to_string(),
            caret_at_end: true,
        });
    }

    fn send_update(&self, update: LauncherUpdate) {
        if let Err(e) = self.update_tx.send(update) {
            error!("Failed to send update: {}", e);
        }
    }

    #[must_use]
    pub fn state(&self) -> &LauncherState {
        &self.state
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn trigger_config(&self) -> &TriggerConfig {
        &self.triggers
    }

    #[must_use]
    pub fn plugins(&self) -> &PluginManager {
        &self.plugins
    }

    pub fn plugins_mut(&mut self) -> &mut PluginManager {
        &mut self.plugins
    }
}
