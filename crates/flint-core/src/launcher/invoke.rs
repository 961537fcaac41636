//! Result activation and one-shot invocation.

use super::trigger::extract_query_after_trigger;
use super::{Launcher, LauncherUpdate};
use crate::{Error, Result};
use flint_types::{Action, FocusMode, SearchResult};
use tracing::{debug, error, info};

/// One-shot invocation takes the first result at or above this relevance
/// when no result's action tag matches.
const CONFIDENT_RELEVANCE: f64 = 0.9;

impl Launcher {
    pub(super) fn handle_enter(&mut self, shift: bool) {
        if self.state.focus_mode == FocusMode::Header {
            self.send_update(LauncherUpdate::HeaderActivated {
                index: self.state.header_button_index,
            });
            return;
        }

        let Some(result) = self.state.selected_result().cloned() else {
            return;
        };

        if shift && let Some(alt) = result.alt_action() {
            if let Err(e) = self.dispatch(&alt) {
                error!("Alternate action of '{}' failed: {e}", result.title);
            }
            return;
        }

        if let Some(entry) = result
            .custom_widget
            .as_ref()
            .and_then(|widget| widget.focused_entry())
        {
            entry.activate();
            return;
        }

        self.activate_result(&result);
    }

    pub(crate) fn handle_result_clicked(&mut self, index: usize) {
        let Some(result) = self.state.results.get(index).cloned() else {
            debug!("Click on missing result {index}");
            return;
        };
        self.select(index);
        self.activate_result(&result);
    }

    /// Run the primary action. Failures are logged and keep the launcher
    /// open; on success it closes unless the result asks otherwise.
    fn activate_result(&mut self, result: &SearchResult) {
        let outcome = match &result.action {
            Some(action) => self.dispatch(action),
            None => Err(Error::NoAction),
        };

        if let Err(e) = outcome {
            error!("Activating '{}' failed: {e}", result.title);
            return;
        }

        if !result.is_trigger_suggestion() && !result.keep_launcher_open() {
            self.hide_launcher();
        }
    }

    /// Execute an action value.
    ///
    /// # Errors
    ///
    /// Returns an error if the action's plugin is not active or the command fails.
    pub fn dispatch(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::ActivateTrigger { trigger } => {
                self.activate_trigger(trigger);
                Ok(())
            }
            Action::Plugin {
                plugin,
                command,
                args,
            } => self.plugins.execute(plugin, command, args),
        }
    }

    /// Put `"<trigger> "` in the entry and show the plugin's default results
    pub fn activate_trigger(&mut self, trigger: &str) {
        let text = format!("{} ", trigger.trim());
        self.set_entry_text(&text);
        self.state.query.clone_from(&text);
        self.exit_trigger_mode();
        self.perform_search(&text);
        self.set_focus(FocusMode::Search);
    }

    /// Run `"<trigger> <rest>"` without the UI: query the owning plugin with
    /// `rest` and activate the best result. Returns the activated result.
    ///
    /// The pick is the first result whose action tag equals `rest`, else the
    /// first with relevance of at least 0.9, else the first.
    ///
    /// # Errors
    ///
    /// Returns an error if no plugin claims the trigger or the action fails.
    pub fn invoke(&mut self, command: &str) -> Result<Option<SearchResult>> {
        let command = command.trim();
        let (plugin, trigger) = self
            .resolve_trigger(command)
            .ok_or_else(|| Error::PluginNotFound(command.to_string()))?;

        let rest = extract_query_after_trigger(command, &trigger);
        let results = self.plugins.query(&plugin, &rest);

        let picked = results
            .iter()
            .find(|r| r.action_tag() == Some(rest.as_str()))
            .or_else(|| results.iter().find(|r| r.relevance() >= CONFIDENT_RELEVANCE))
            .or_else(|| results.first())
            .cloned();

        let Some(result) = picked else {
            info!("[{plugin}] no results for '{rest}'");
            return Ok(None);
        };

        info!("[{plugin}] invoking '{}'", result.title);
        match &result.action {
            Some(action) => self.dispatch(action)?,
            None => return Err(Error::NoAction),
        }
        Ok(Some(result))
    }
}
