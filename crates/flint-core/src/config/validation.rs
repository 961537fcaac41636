//! Config validation - warns about unknown fields

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Validate `config.json` and warn about unknown fields.
pub fn warn_unknown_fields(content: &str, config_name: &str) {
    warn_against(content, config_name, &expected_config_keys());
}

/// Validate a plugin `manifest.json` and warn about unknown fields.
pub fn warn_unknown_manifest_fields(content: &str, manifest_name: &str) {
    warn_against(content, manifest_name, &expected_manifest_keys());
}

fn warn_against(content: &str, name: &str, expected: &ExpectedKeys) {
    let Ok(value) = serde_json::from_str::<Value>(content) else {
        return;
    };

    for path in find_unknown_keys(&value, expected, "") {
        warn!("Unknown config field in {name}: {path}");
    }
}

/// Find unknown keys in JSON value compared to expected keys.
/// Returns paths like "launcher.maxResult" for unknown fields.
fn find_unknown_keys(value: &Value, expected: &ExpectedKeys, prefix: &str) -> Vec<String> {
    let mut unknowns = Vec::new();

    let Value::Object(obj) = value else {
        return unknowns;
    };

    for (key, child) in obj {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        if let Some(nested) = expected.nested.get(key.as_str()) {
            unknowns.extend(find_unknown_keys(child, nested, &path));
        } else if !expected.fields.contains(key.as_str()) {
            unknowns.push(path);
        }
    }

    unknowns
}

/// `fields` are leaf fields, `nested` are objects with their own expected keys.
struct ExpectedKeys {
    fields: HashSet<&'static str>,
    nested: HashMap<&'static str, ExpectedKeys>,
}

impl ExpectedKeys {
    fn new(fields: &[&'static str]) -> Self {
        Self {
            fields: fields.iter().copied().collect(),
            nested: HashMap::new(),
        }
    }

    fn with_nested(mut self, key: &'static str, nested: ExpectedKeys) -> Self {
        self.nested.insert(key, nested);
        self
    }
}

fn expected_config_keys() -> ExpectedKeys {
    let launcher_keys = ExpectedKeys::new(&[
        "maxResults",
        "searchDebounceMs",
        "triggerDebounceMs",
        "pageStep",
        "globalSearch",
    ]);

    let plugins_keys = ExpectedKeys::new(&["autostart", "disabled", "watch"]);

    ExpectedKeys::new(&[])
        .with_nested("launcher", launcher_keys)
        .with_nested("plugins", plugins_keys)
}

fn expected_manifest_keys() -> ExpectedKeys {
    let handler_keys = ExpectedKeys::new(&["command", "args", "timeoutMs"]);

    ExpectedKeys::new(&[
        "name",
        "description",
        "triggers",
        "enabled",
        "global",
        "builtin",
    ])
    .with_nested("handler", handler_keys)
}
