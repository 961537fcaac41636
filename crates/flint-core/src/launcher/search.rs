//! Text handling, debounce and result evaluation.

use super::trigger::{detect_trigger, extract_query_after_trigger, still_triggered};
use super::{Launcher, LauncherEvent, LauncherUpdate};
use flint_types::{FocusMode, SearchResult};
use std::time::Duration;
use tracing::debug;

pub(super) const SHOW_ALL_TRIGGERS: &str = ":";

impl Launcher {
    pub(crate) fn handle_text_changed(&mut self, text: String) {
        // Also swallows the echo of text we set ourselves
        if text == self.state.entry_text {
            return;
        }
        self.state.entry_text = text;

        if std::mem::take(&mut self.state.backspace_pending) && self.state.in_trigger_mode() {
            self.settle_backspace();
        } else {
            self.on_search_changed();
        }
    }

    /// Route the current entry text and debounce the search it needs.
    pub(crate) fn on_search_changed(&mut self) {
        if let Some((query, delay_ms)) = self.route_entry_text() {
            self.schedule_search(query, delay_ms);
        }
    }

    /// Special-case `:`, empty text and bare trigger words. Returns the
    /// search still to run with its debounce.
    pub(crate) fn route_entry_text(&mut self) -> Option<(String, u64)> {
        let raw = self.state.entry_text.clone();
        let query = raw.trim().to_string();
        self.state.query.clone_from(&query);

        if query == SHOW_ALL_TRIGGERS {
            self.exit_trigger_mode();
            let results = self.trigger_suggestions("");
            self.replace_results(results, false);
            return None;
        }

        if self.plugins.is_trigger_word(&query) {
            if raw.ends_with(' ') {
                return Some((query, self.config.launcher.search_debounce_ms));
            }
            let spaced = format!("{query} ");
            debug!("Completing trigger '{query}'");
            self.set_entry_text(&spaced);
            self.state.query.clone_from(&spaced);
            return Some((spaced, self.config.launcher.trigger_debounce_ms));
        }

        if query.is_empty() {
            self.perform_search("");
            return None;
        }
        Some((query, self.config.launcher.search_debounce_ms))
    }

    /// After a Backspace in trigger mode: leave trigger mode once the text no
    /// longer starts with the trigger, otherwise search again.
    fn settle_backspace(&mut self) {
        let text = self.state.entry_text.clone();
        let query = text.trim().to_string();
        self.state.query.clone_from(&query);

        if still_triggered(&text, &self.state.active_trigger) {
            self.schedule_search(query, self.config.launcher.search_debounce_ms);
            return;
        }

        self.exit_trigger_mode();
        let results = if query.is_empty() {
            Vec::new()
        } else {
            self.trigger_suggestions(&query)
        };
        self.replace_results(results, true);
    }

    /// Post [`LauncherEvent::SearchDue`] after `delay_ms`. Without a tokio
    /// runtime the search runs immediately.
    pub(crate) fn schedule_search(&mut self, query: String, delay_ms: u64) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            self.perform_search(&query);
            return;
        };

        let events = self.events_tx.clone();
        handle.spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            let _ = events.send(LauncherEvent::SearchDue { query });
        });
    }

    pub(crate) fn handle_search_due(&mut self, query: &str) {
        self.state.backspace_pending = false;
        if query != self.state.query {
            debug!("Dropping stale search for '{query}'");
            return;
        }
        self.perform_search(query);
    }

    /// Evaluate `query` and replace the result list.
    pub fn perform_search(&mut self, query: &str) {
        if query.trim().is_empty() {
            self.exit_trigger_mode();
            self.replace_results(Vec::new(), true);
            return;
        }

        if self.state.in_trigger_mode() {
            let active = self
                .state
                .triggered_plugin
                .clone()
                .filter(|name| self.plugins.is_active(name));
            if let Some(plugin) = active {
                let residual = extract_query_after_trigger(query, &self.state.active_trigger);
                let results = self.plugins.query(&plugin, &residual);
                self.replace_results(results, false);
                return;
            }
            self.exit_trigger_mode();
        } else if !self.state.active_trigger.is_empty() || self.state.triggered_plugin.is_some() {
            self.exit_trigger_mode();
        }

        if let Some((plugin, trigger)) = self.resolve_trigger(query) {
            self.enter_trigger_mode(&plugin, &trigger);
            let residual = extract_query_after_trigger(query, &trigger);
            let results = self.plugins.query(&plugin, &residual);
            self.replace_results(results, false);
            return;
        }

        let suggestions = self.trigger_suggestions(query);
        let results = if suggestions.is_empty() && self.config.launcher.global_search {
            self.global_search(query)
        } else {
            suggestions
        };
        self.replace_results(results, true);
    }

    /// Plugin and trigger claiming `query`: active plugins first, then the
    /// trigger index, activating the owner on demand.
    pub(crate) fn resolve_trigger(&mut self, query: &str) -> Option<(String, String)> {
        let found = |launcher: &Self| {
            detect_trigger(query, launcher.plugins.active_metas())
                .map(|(meta, trigger)| (meta.name.clone(), trigger.to_string()))
        };

        if let Some(hit) = found(self) {
            return Some(hit);
        }
        self.plugins.activate_for_query(query)?;
        found(self)
    }

    /// Query every active `global` plugin with the raw query
    fn global_search(&mut self, query: &str) -> Vec<SearchResult> {
        let names: Vec<String> = self
            .plugins
            .active_metas()
            .filter(|meta| meta.global && meta.enabled)
            .map(|meta| meta.name.clone())
            .collect();

        names
            .iter()
            .flat_map(|name| self.plugins.query(name, query))
            .collect()
    }

    /// Sort by relevance (stable), cap unless exempt, reset the selection.
    pub(crate) fn replace_results(&mut self, mut results: Vec<SearchResult>, capped: bool) {
        results.sort_by(|a, b| b.relevance().total_cmp(&a.relevance()));

        let max = self.config.launcher.max_results;
        if capped && results.len() > max && !results.iter().any(SearchResult::bypass_max_results) {
            results.truncate(max);
        }

        self.state.results = results;
        self.state.selected_index = 0;
        self.send_update(LauncherUpdate::Results {
            results: self.state.results.clone(),
            selected: 0,
        });

        if self.state.results.is_empty() && self.state.focus_mode == FocusMode::Results {
            self.set_focus(FocusMode::Search);
        }
        let text = self.placeholder();
        self.send_update(LauncherUpdate::Placeholder { text });
    }

    /// Suggestions for every trigger, capped, as shown on open
    pub(crate) fn show_available_triggers(&mut self) {
        let results = self.trigger_suggestions("");
        self.replace_results(results, true);
    }
}
