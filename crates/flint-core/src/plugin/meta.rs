use serde::{Deserialize, Serialize};

/// Static description of a plugin.
///
/// Triggers live here and nowhere else: the registry builds its trigger
/// index from this, and runtime matching asks [`PluginMeta::active_trigger`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginMeta {
    pub name: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Take part in untriggered global search
    #[serde(default)]
    pub global: bool,

    /// Declaration order is kept for suggestion display
    #[serde(default)]
    pub triggers: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

impl PluginMeta {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: name.to_string(),
            description: String::new(),
            enabled: true,
            global: false,
            triggers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, display_name: &str) -> Self {
        self.display_name = display_name.to_string();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    #[must_use]
    pub fn with_triggers(mut self, triggers: &[&str]) -> Self {
        self.triggers = triggers.iter().map(ToString::to_string).collect();
        self
    }

    #[must_use]
    pub fn global(mut self) -> Self {
        self.global = true;
        self
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// The trigger that claims `query`, longest trigger first.
    ///
    /// Disabled plugins never match. Equal-length triggers keep their
    /// declaration order.
    #[must_use]
    pub fn active_trigger(&self, query: &str) -> Option<&str> {
        if !self.enabled {
            return None;
        }

        let query = query.trim().to_lowercase();
        let mut triggers: Vec<&String> = self.triggers.iter().collect();
        triggers.sort_by_key(|t| std::cmp::Reverse(t.len()));

        triggers
            .into_iter()
            .find(|trigger| trigger_matches(&query, trigger))
            .map(String::as_str)
    }
}

/// Whether a lowercased, trimmed query is claimed by `trigger`.
pub(crate) fn trigger_matches(query_lower: &str, trigger: &str) -> bool {
    let trigger_lower = trigger.to_lowercase();
    if trigger_lower.trim().is_empty() {
        return false;
    }
    if query_lower.starts_with(&trigger_lower) {
        return true;
    }

    let word = trigger_lower.trim();
    query_lower == word
        || query_lower
            .strip_prefix(word)
            .is_some_and(|rest| rest.starts_with(' '))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_word_matches_trigger_with_space() {
        let meta = PluginMeta::new("calendar").with_triggers(&["cal "]);
        assert_eq!(meta.active_trigger("cal"), Some("cal "));
        assert_eq!(meta.active_trigger("CAL today"), Some("cal "));
        assert_eq!(meta.active_trigger("calendar"), None);
    }

    #[test]
    fn test_trigger_without_space_is_permissive() {
        let meta = PluginMeta::new("calculator").with_triggers(&["calc"]);
        assert_eq!(meta.active_trigger("calc2+2"), Some("calc"));
        assert_eq!(meta.active_trigger("ca"), None);
    }

    #[test]
    fn test_longest_trigger_wins() {
        let meta = PluginMeta::new("cal").with_triggers(&["c", "cal "]);
        assert_eq!(meta.active_trigger("cal next week"), Some("cal "));
        assert_eq!(meta.active_trigger("clock"), Some("c"));
    }

    #[test]
    fn test_disabled_never_matches() {
        let meta = PluginMeta::new("otp").with_triggers(&["otp "]).disabled();
        assert_eq!(meta.active_trigger("otp github"), None);
    }

    #[test]
    fn test_blank_query_never_matches() {
        let meta = PluginMeta::new("app").with_triggers(&["app "]);
        assert_eq!(meta.active_trigger("   "), None);
        assert_eq!(meta.active_trigger(""), None);
    }

    #[test]
    fn test_manifest_style_deserialize_defaults() {
        let meta: PluginMeta =
            serde_json::from_str(r#"{"name": "tmux", "triggers": ["tmux "]}"#).unwrap();
        assert!(meta.enabled);
        assert!(!meta.global);
        assert!(meta.display_name.is_empty());
    }

    proptest! {
        #[test]
        fn prop_longer_matching_trigger_preferred(
            short in "[a-z]{1,3}",
            extra in "[a-z]{1,4}",
            tail in "[a-z ]{0,8}",
        ) {
            let long = format!("{short}{extra}");
            let query = format!("{long}{tail}");
            let meta = PluginMeta::new("p").with_triggers(&[short.as_str(), long.as_str()]);

            prop_assert_eq!(meta.active_trigger(&query), Some(long.as_str()));
        }
    }
}
