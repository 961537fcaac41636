use super::Launcher;
use flint_types::{Action, Icon, SearchResult, keys};
use std::collections::HashSet;

impl Launcher {
    /// One result per trigger of the active plugins whose keyword starts with
    /// `query` (all of them for an empty query). Shorter triggers rank higher.
    pub(crate) fn trigger_suggestions(&self, query: &str) -> Vec<SearchResult> {
        let query = query.trim().to_lowercase();
        let max_examples = self.triggers.max_examples_shown();
        let mut seen = HashSet::new();
        let mut suggestions = Vec::new();

        for meta in self.plugins.active_metas().filter(|meta| meta.enabled) {
            for trigger in &meta.triggers {
                let clean = trigger.trim();
                if clean.is_empty() || !seen.insert(clean.to_string()) {
                    continue;
                }
                if !clean.to_lowercase().starts_with(&query) {
                    continue;
                }

                let examples = self.triggers.examples(clean);
                let shown: Vec<&str> = examples
                    .iter()
                    .take(max_examples)
                    .map(String::as_str)
                    .collect();
                let subtitle = format!(
                    "{} - {}",
                    self.triggers.description(clean),
                    shown.join(", ")
                );
                #[allow(clippy::cast_precision_loss)]
                let relevance = (100.0 - clean.chars().count() as f64) / 100.0;

                suggestions.push(
                    SearchResult::new(clean, relevance)
                        .with_subtitle(subtitle)
                        .with_icon(Icon::Symbolic(self.triggers.icon(clean).to_string()))
                        .with_action(Action::ActivateTrigger {
                            trigger: clean.to_string(),
                        })
                        .with_plugin(&meta.name)
                        .with_data(keys::TYPE, keys::TYPE_TRIGGER_SUGGESTION)
                        .with_data(keys::TRIGGER, clean),
                );
            }
        }

        suggestions
    }

    /// Entry placeholder describing what Enter would do
    pub(crate) fn placeholder(&self) -> String {
        let current = self.state.entry_text.as_str();

        if self.state.in_trigger_mode() {
            let trigger = self.state.active_trigger.trim();
            if let Some(first) = self.state.results.first() {
                let action_text = match first.data.get(keys::RESULT) {
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(value) => value.to_string(),
                    None => first.title.clone(),
                };
                if !action_text.is_empty() && action_text != current {
                    return format!("{current} → {action_text}");
                }
                return format!("[{trigger}] searching...");
            }
            if current.trim() == trigger {
                return format!("[{trigger}] ready - type to search");
            }
            return format!("[{trigger}] searching...");
        }

        let words = self.plugins.trigger_words();
        if words.is_empty() {
            "Type to search".to_string()
        } else if current.is_empty() {
            format!("Type trigger keyword: {}", words.join(", "))
        } else {
            format!("Type trigger keyword ({})", words.join(", "))
        }
    }
}
