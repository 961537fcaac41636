//! Shared types for flint launcher components.
//!
//! This crate provides the value types exchanged between the routing core
//! (`flint-core`) and whatever renders it. Results are serializable so that
//! script plugins can hand them over as JSON.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Well-known keys of [`SearchResult::data`].
pub mod keys {
    /// Keep the launcher window open after activating the result.
    pub const KEEP_LAUNCHER_OPEN: &str = "keep_launcher_open";
    /// Secondary [`Action`](super::Action) run on Shift+Enter.
    pub const ALT_ACTION: &str = "alt_action";
    /// Older name for [`ALT_ACTION`].
    pub const PIN_ACTION: &str = "pin_action";
    /// Show every result even outside trigger mode.
    pub const BYPASS_MAX_RESULTS: &str = "bypass_max_results";
    /// Result kind tag.
    pub const TYPE: &str = "type";
    /// Literal action tag matched by one-shot invocation.
    pub const ACTION: &str = "action";
    /// Trigger keyword carried by trigger suggestions.
    pub const TRIGGER: &str = "trigger";
    /// Precomputed value shown in the entry placeholder.
    pub const RESULT: &str = "result";

    /// [`TYPE`] value of trigger suggestions.
    pub const TYPE_TRIGGER_SUGGESTION: &str = "trigger_suggestion";
}

/// Free-form result metadata.
pub type ResultData = HashMap<String, serde_json::Value>;

/// Icon of a result row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Icon {
    #[default]
    None,
    /// Image file on disk
    Bitmap(PathBuf),
    /// Named icon from the icon theme
    Symbolic(String),
    /// Pre-rendered markup (glyph fonts)
    Markup(String),
}

impl Icon {
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Icon::None)
    }
}

/// What happens when a result is activated.
///
/// Actions are plain values so they can be inspected and tested without
/// running them. Plugin actions are resolved against the registry at
/// activation time, never captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Write `"<trigger> "` into the search entry and enter its trigger mode
    ActivateTrigger { trigger: String },

    /// Run `command` inside the named plugin
    Plugin {
        plugin: String,
        command: String,
        #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
        args: serde_json::Value,
    },
}

impl Action {
    #[must_use]
    pub fn plugin(plugin: &str, command: &str, args: serde_json::Value) -> Self {
        Action::Plugin {
            plugin: plugin.to_string(),
            command: command.to_string(),
            args,
        }
    }
}

/// Widget supplied by a plugin in place of the default result row.
///
/// Optional capabilities are exposed through the `as_*` accessors; the
/// launcher only asks, it never probes.
pub trait CustomWidget: fmt::Debug + Send + Sync {
    /// In-place input that Escape should cancel (password prompts and the like)
    fn as_cancelable(&self) -> Option<&dyn Cancelable> {
        None
    }

    /// Editable field that currently holds keyboard focus, if any
    fn focused_entry(&self) -> Option<&dyn TextEntry> {
        None
    }
}

/// Capability: the widget has an input that can be cancelled.
pub trait Cancelable {
    /// Returns false if there was nothing to cancel.
    fn cancel(&self) -> bool;
}

/// Capability: an editable field with its own activation.
pub trait TextEntry {
    fn activate(&self);
}

/// One renderable, activatable search hit
#[derive(Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,

    /// May contain pre-rendered markup
    #[serde(default)]
    pub subtitle: String,

    #[serde(default, skip_serializing_if = "Icon::is_none")]
    pub icon: Icon,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,

    #[serde(default, deserialize_with = "deserialize_relevance")]
    relevance: f64,

    #[serde(default)]
    pub plugin_name: String,

    #[serde(default, deserialize_with = "deserialize_null_as_empty_map")]
    pub data: ResultData,

    #[serde(skip)]
    pub custom_widget: Option<Arc<dyn CustomWidget>>,
}

/// Clamp a relevance score into `[0.0, 1.0]`. NaN becomes `0.0`.
#[must_use]
pub fn clamp_relevance(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn deserialize_relevance<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(clamp_relevance(value.unwrap_or(0.0)))
}

/// Deserialize a map that may be null or missing (both become empty map)
fn deserialize_null_as_empty_map<'de, D>(deserializer: D) -> Result<ResultData, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<ResultData> = Option::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

impl SearchResult {
    #[must_use]
    pub fn new(title: impl Into<String>, relevance: f64) -> Self {
        Self {
            title: title.into(),
            subtitle: String::new(),
            icon: Icon::None,
            action: None,
            relevance: clamp_relevance(relevance),
            plugin_name: String::new(),
            data: ResultData::new(),
            custom_widget: None,
        }
    }

    #[must_use]
    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    #[must_use]
    pub fn with_icon(mut self, icon: Icon) -> Self {
        self.icon = icon;
        self
    }

    #[must_use]
    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    #[must_use]
    pub fn with_plugin(mut self, plugin_name: impl Into<String>) -> Self {
        self.plugin_name = plugin_name.into();
        self
    }

    #[must_use]
    pub fn with_data(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn with_widget(mut self, widget: Arc<dyn CustomWidget>) -> Self {
        self.custom_widget = Some(widget);
        self
    }

    #[must_use]
    pub fn relevance(&self) -> f64 {
        self.relevance
    }

    pub fn set_relevance(&mut self, relevance: f64) {
        self.relevance = clamp_relevance(relevance);
    }

    fn flag(&self, key: &str) -> bool {
        self.data
            .get(key)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }

    #[must_use]
    pub fn keep_launcher_open(&self) -> bool {
        self.flag(keys::KEEP_LAUNCHER_OPEN)
    }

    #[must_use]
    pub fn bypass_max_results(&self) -> bool {
        self.flag(keys::BYPASS_MAX_RESULTS)
    }

    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.data.get(keys::TYPE).and_then(serde_json::Value::as_str)
    }

    #[must_use]
    pub fn is_trigger_suggestion(&self) -> bool {
        self.kind() == Some(keys::TYPE_TRIGGER_SUGGESTION)
    }

    /// Literal action tag used by one-shot invocation to pick a result
    #[must_use]
    pub fn action_tag(&self) -> Option<&str> {
        self.data.get(keys::ACTION).and_then(serde_json::Value::as_str)
    }

    /// Secondary action for Shift+Enter (`alt_action`, then legacy `pin_action`)
    #[must_use]
    pub fn alt_action(&self) -> Option<Action> {
        [keys::ALT_ACTION, keys::PIN_ACTION]
            .iter()
            .filter_map(|key| self.data.get(*key))
            .find_map(|value| serde_json::from_value(value.clone()).ok())
    }
}

impl fmt::Debug for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchResult")
            .field("title", &self.title)
            .field("relevance", &self.relevance)
            .field("plugin_name", &self.plugin_name)
            .field("action", &self.action)
            .field("custom_widget", &self.custom_widget.is_some())
            .finish_non_exhaustive()
    }
}

/// Which part of the launcher owns keyboard focus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusMode {
    #[default]
    Search,
    Results,
    Header,
}

/// Keys the launcher reacts to. Everything else is `Other` and left to the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Backspace,
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub shift: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPress {
    pub key: Key,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl KeyPress {
    #[must_use]
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
        }
    }

    #[must_use]
    pub fn shifted(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers { shift: true },
        }
    }
}

impl From<Key> for KeyPress {
    fn from(key: Key) -> Self {
        Self::plain(key)
    }
}

/// Input to the launcher event loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LauncherEvent {
    /// Search entry text after an edit
    TextChanged { text: String },

    /// Key press. Backspace is reported before the edit is applied.
    Key { press: KeyPress },

    /// Debounce timer for `query` elapsed
    SearchDue { query: String },

    /// A plugin has new data for its current results
    Refresh { plugin: String },

    /// Files of a plugin changed on disk
    PluginChanged { plugin: String },

    Show {
        #[serde(default)]
        seed: Option<String>,
        #[serde(default)]
        external: bool,
    },

    Hide,

    ResultClicked { index: usize },

    /// Number of header buttons the renderer shows
    HeaderButtons { count: usize },

    /// One-shot `"<trigger> <rest>"` invocation
    Invoke { command: String },

    Shutdown,
}

/// Output of the launcher for a renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LauncherUpdate {
    /// Result list replaced
    Results {
        results: Vec<SearchResult>,
        selected: usize,
    },

    Selection { index: usize },

    Focus { mode: FocusMode, header_index: usize },

    /// Text set programmatically
    EntryText { text: String, caret_at_end: bool },

    Placeholder { text: String },

    HeaderActivated { index: usize },

    Show,

    Close,
}
