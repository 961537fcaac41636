//! Trigger detection and residual query extraction.

use crate::plugin::PluginMeta;

/// First plugin (in iteration order) whose trigger claims `query`, with the
/// trigger it matched. Each plugin prefers its longest matching trigger.
pub fn detect_trigger<'a, I>(query: &str, plugins: I) -> Option<(&'a PluginMeta, &'a str)>
where
    I: IntoIterator<Item = &'a PluginMeta>,
{
    if query.trim().is_empty() {
        return None;
    }

    plugins
        .into_iter()
        .find_map(|meta| meta.active_trigger(query).map(|trigger| (meta, trigger)))
}

/// Text after `trigger` in `query`, trimmed.
///
/// A trigger with a trailing space must match including the space; a bare
/// trigger word does not require a separating space (`"calc2+2"` yields
/// `"2+2"`). Returns an empty string when `query` does not start with the
/// trigger at all.
#[must_use]
pub fn extract_query_after_trigger(query: &str, trigger: &str) -> String {
    if query.is_empty() || trigger.is_empty() {
        return String::new();
    }

    if trigger.ends_with(' ')
        && let Some(rest) = strip_prefix_ignore_case(query, trigger)
    {
        return rest.trim().to_string();
    }

    let word = trigger.trim();
    if word.is_empty() {
        return String::new();
    }

    strip_prefix_ignore_case(query, word)
        .map(|rest| rest.trim().to_string())
        .unwrap_or_default()
}

/// Whether `text` is still inside `trigger`, honoring a trailing space in
/// the trigger's canonical form
#[must_use]
pub fn still_triggered(text: &str, trigger: &str) -> bool {
    let text = text.trim_start();
    if trigger.ends_with(' ') {
        strip_prefix_ignore_case(text, trigger).is_some()
    } else {
        let word = trigger.trim();
        !word.is_empty() && strip_prefix_ignore_case(text, word).is_some()
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    (head.to_lowercase() == prefix.to_lowercase()).then(|| &text[prefix.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_extract_with_spaced_trigger() {
        assert_eq!(extract_query_after_trigger("cal today", "cal "), "today");
        assert_eq!(extract_query_after_trigger("CAL  Today ", "cal "), "Today");
    }

    #[test]
    fn test_extract_bare_word_for_spaced_trigger() {
        assert_eq!(extract_query_after_trigger("cal", "cal "), "");
    }

    #[test]
    fn test_extract_without_separator() {
        assert_eq!(extract_query_after_trigger("calc2+2", "calc"), "2+2");
        assert_eq!(extract_query_after_trigger("calc 2+2", "calc"), "2+2");
    }

    #[test]
    fn test_extract_non_matching() {
        assert_eq!(extract_query_after_trigger("files", "cal "), "");
        assert_eq!(extract_query_after_trigger("", "cal "), "");
        assert_eq!(extract_query_after_trigger("cal x", ""), "");
    }

    #[test]
    fn test_extract_multibyte_does_not_panic() {
        assert_eq!(extract_query_after_trigger("é", "ab"), "");
        assert_eq!(extract_query_after_trigger("émoji smile", "émoji "), "smile");
    }

    #[test]
    fn test_detect_skips_blank_query() {
        let metas = [PluginMeta::new("app").with_triggers(&["app "])];
        assert!(detect_trigger("  ", &metas).is_none());
    }

    #[test]
    fn test_detect_first_plugin_wins_ties() {
        let metas = [
            PluginMeta::new("first").with_triggers(&["go "]),
            PluginMeta::new("second").with_triggers(&["go "]),
        ];
        let (meta, trigger) = detect_trigger("go home", &metas).unwrap();
        assert_eq!(meta.name, "first");
        assert_eq!(trigger, "go ");
    }

    #[test]
    fn test_detect_skips_disabled() {
        let metas = [
            PluginMeta::new("off").with_triggers(&["go "]).disabled(),
            PluginMeta::new("on").with_triggers(&["go"]),
        ];
        let (meta, _) = detect_trigger("go home", &metas).unwrap();
        assert_eq!(meta.name, "on");
    }

    #[test]
    fn test_still_triggered() {
        assert!(still_triggered("cal tomorrow", "cal "));
        assert!(still_triggered("cal ", "cal "));
        assert!(!still_triggered("cal", "cal "));
        assert!(still_triggered("calc", "calc"));
        assert!(!still_triggered("cal", "calc"));
    }

    proptest! {
        #[test]
        fn prop_detect_is_deterministic(
            query in "[a-c ]{0,6}",
            triggers in proptest::collection::vec("[a-c]{1,3} ?", 1..6),
        ) {
            let metas: Vec<PluginMeta> = triggers
                .iter()
                .enumerate()
                .map(|(i, t)| PluginMeta::new(&format!("p{i}")).with_triggers(&[t.as_str()]))
                .collect();

            let first = detect_trigger(&query, &metas).map(|(m, t)| (m.name.clone(), t.to_string()));
            let second = detect_trigger(&query, &metas).map(|(m, t)| (m.name.clone(), t.to_string()));
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_extract_is_idempotent_on_rest(word in "[a-z]{1,5}", rest in "[a-z0-9]{0,8}") {
            let trigger = format!("{word} ");
            let query = format!("{word} {rest}");
            prop_assert_eq!(extract_query_after_trigger(&query, &trigger), rest);
        }
    }
}
