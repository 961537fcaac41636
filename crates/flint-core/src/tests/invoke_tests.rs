//! Tests for result activation and one-shot invocation
//!
//! Tests the activation path including:
//! - Enter / click on plugin results and trigger suggestions
//! - Shift+Enter alternate actions
//! - Header button activation and widget text entries
//! - Picking the result for `invoke`

use super::fixtures::{Scripted, drain, launcher_with, launcher_with_config, lazy_config};
use crate::Error;
use crate::plugin::PluginMeta;
use flint_types::{
    Action, CustomWidget, FocusMode, Key, KeyPress, LauncherEvent, LauncherUpdate, SearchResult,
    TextEntry, keys,
};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn open(plugin: &str, arg: &str) -> Action {
    Action::plugin(plugin, "open", json!(arg))
}

fn apps_plugin(results: Vec<SearchResult>) -> (PluginMeta, Scripted) {
    (
        PluginMeta::new("apps").with_triggers(&["app "]),
        Scripted::new(move |_| results.clone()),
    )
}

// ============================================================================
// Enter
// ============================================================================

#[test]
fn test_enter_executes_and_closes() {
    let (meta, apps) = apps_plugin(vec![
        SearchResult::new("Firefox", 0.9).with_action(open("apps", "firefox")),
    ]);
    let (mut launcher, mut updates) = launcher_with(vec![(meta, &apps)]);
    launcher.show_launcher(None, false);
    launcher.perform_search("app fire");

    assert!(launcher.handle_key(Key::Enter.into()));

    assert_eq!(apps.probe.executed(), vec![("open".to_string(), json!("firefox"))]);
    assert!(!launcher.state().visible);
    assert!(
        drain(&mut updates)
            .iter()
            .any(|u| matches!(u, LauncherUpdate::Close))
    );
}

#[test]
fn test_enter_runs_selected_result() {
    let (meta, apps) = apps_plugin(vec![
        SearchResult::new("Firefox", 0.9).with_action(open("apps", "firefox")),
        SearchResult::new("Files", 0.8).with_action(open("apps", "files")),
    ]);
    let (mut launcher, _updates) = launcher_with(vec![(meta, &apps)]);
    launcher.show_launcher(None, false);
    launcher.perform_search("app f");
    launcher.handle_key(Key::Down.into());
    launcher.handle_key(Key::Down.into());

    launcher.handle_key(Key::Enter.into());

    assert_eq!(apps.probe.executed(), vec![("open".to_string(), json!("files"))]);
}

#[test]
fn test_keep_open_flag_keeps_launcher_visible() {
    let (meta, apps) = apps_plugin(vec![
        SearchResult::new("Volume up", 0.9)
            .with_action(open("apps", "volume"))
            .with_data(keys::KEEP_LAUNCHER_OPEN, true),
    ]);
    let (mut launcher, _updates) = launcher_with(vec![(meta, &apps)]);
    launcher.show_launcher(None, false);
    launcher.perform_search("app vol");

    launcher.handle_key(Key::Enter.into());

    assert_eq!(apps.probe.executed().len(), 1);
    assert!(launcher.state().visible);
}

#[test]
fn test_result_without_action_keeps_launcher_open() {
    let (meta, apps) = apps_plugin(vec![SearchResult::new("Nothing", 0.9)]);
    let (mut launcher, _updates) = launcher_with(vec![(meta, &apps)]);
    launcher.show_launcher(None, false);
    launcher.perform_search("app x");

    launcher.handle_key(Key::Enter.into());

    assert!(launcher.state().visible);
}

#[test]
fn test_failed_action_keeps_launcher_open() {
    let results = vec![SearchResult::new("Broken", 0.9).with_action(open("apps", "x"))];
    let apps = Scripted::new(move |_| results.clone()).fail_execute();
    let (mut launcher, _updates) = launcher_with(vec![(
        PluginMeta::new("apps").with_triggers(&["app "]),
        &apps,
    )]);
    launcher.show_launcher(None, false);
    launcher.perform_search("app x");

    launcher.handle_key(Key::Enter.into());

    assert!(launcher.state().visible);
    assert!(launcher.state().in_trigger_mode());
}

#[test]
fn test_action_for_inactive_plugin_fails() {
    let (meta, apps) = apps_plugin(Vec::new());
    let (mut launcher, _updates) = launcher_with_config(lazy_config(), vec![(meta, &apps)]);

    let err = launcher.dispatch(&open("apps", "firefox")).unwrap_err();

    assert!(matches!(err, Error::PluginNotFound(name) if name == "apps"));
}

#[test]
fn test_enter_on_suggestion_enters_trigger() {
    let (meta, apps) = apps_plugin(vec![SearchResult::new("Firefox", 0.9)]);
    let (mut launcher, mut updates) = launcher_with(vec![(meta, &apps)]);
    launcher.show_launcher(None, false);
    assert!(launcher.state().results[0].is_trigger_suggestion());
    drain(&mut updates);

    launcher.handle_key(Key::Enter.into());

    let state = launcher.state();
    assert!(state.visible);
    assert_eq!(state.entry_text, "app ");
    assert!(state.in_trigger_mode());
    assert_eq!(state.focus_mode, FocusMode::Search);
    assert_eq!(apps.probe.queries(), vec![""]);
    assert!(drain(&mut updates).iter().any(|u| matches!(
        u,
        LauncherUpdate::EntryText { text, caret_at_end: true } if text == "app "
    )));
}

#[test]
fn test_click_activates_clicked_row() {
    let (meta, apps) = apps_plugin(vec![
        SearchResult::new("Firefox", 0.9).with_action(open("apps", "firefox")),
        SearchResult::new("Files", 0.8).with_action(open("apps", "files")),
    ]);
    let (mut launcher, _updates) = launcher_with(vec![(meta, &apps)]);
    launcher.show_launcher(None, false);
    launcher.perform_search("app f");

    launcher.process(LauncherEvent::ResultClicked { index: 1 });

    assert_eq!(apps.probe.executed(), vec![("open".to_string(), json!("files"))]);
    assert!(!launcher.state().visible);
}

#[test]
fn test_click_out_of_range_is_ignored() {
    let (meta, apps) = apps_plugin(vec![
        SearchResult::new("Firefox", 0.9).with_action(open("apps", "firefox")),
    ]);
    let (mut launcher, _updates) = launcher_with(vec![(meta, &apps)]);
    launcher.show_launcher(None, false);
    launcher.perform_search("app f");

    launcher.process(LauncherEvent::ResultClicked { index: 5 });

    assert!(apps.probe.executed().is_empty());
    assert!(launcher.state().visible);
}

#[test]
fn test_shift_enter_runs_alt_action() {
    let pin = serde_json::to_value(Action::plugin("apps", "pin", json!("firefox"))).unwrap();
    let (meta, apps) = apps_plugin(vec![
        SearchResult::new("Firefox", 0.9)
            .with_action(open("apps", "firefox"))
            .with_data(keys::PIN_ACTION, pin),
    ]);
    let (mut launcher, _updates) = launcher_with(vec![(meta, &apps)]);
    launcher.show_launcher(None, false);
    launcher.perform_search("app fire");

    launcher.handle_key(KeyPress::shifted(Key::Enter));

    assert_eq!(apps.probe.executed(), vec![("pin".to_string(), json!("firefox"))]);
    assert!(launcher.state().visible);
}

#[test]
fn test_shift_enter_without_alt_runs_primary() {
    let (meta, apps) = apps_plugin(vec![
        SearchResult::new("Firefox", 0.9).with_action(open("apps", "firefox")),
    ]);
    let (mut launcher, _updates) = launcher_with(vec![(meta, &apps)]);
    launcher.show_launcher(None, false);
    launcher.perform_search("app fire");

    launcher.handle_key(KeyPress::shifted(Key::Enter));

    assert_eq!(apps.probe.executed(), vec![("open".to_string(), json!("firefox"))]);
}

#[test]
fn test_enter_on_header_button() {
    let (meta, apps) = apps_plugin(vec![SearchResult::new("Firefox", 0.9)]);
    let (mut launcher, mut updates) = launcher_with(vec![(meta, &apps)]);
    launcher.show_launcher(None, false);
    launcher.process(LauncherEvent::HeaderButtons { count: 2 });
    launcher.handle_key(KeyPress::shifted(Key::Tab));
    drain(&mut updates);

    launcher.handle_key(Key::Enter.into());

    assert!(
        drain(&mut updates)
            .iter()
            .any(|u| matches!(u, LauncherUpdate::HeaderActivated { index: 1 }))
    );
    assert!(launcher.state().visible);
}

#[derive(Debug, Default)]
struct FormWidget {
    submitted: AtomicUsize,
}

impl TextEntry for FormWidget {
    fn activate(&self) {
        self.submitted.fetch_add(1, Ordering::SeqCst);
    }
}

impl CustomWidget for FormWidget {
    fn focused_entry(&self) -> Option<&dyn TextEntry> {
        Some(self)
    }
}

#[test]
fn test_enter_activates_focused_widget_entry() {
    let widget = Arc::new(FormWidget::default());
    let row = SearchResult::new("Rename", 0.9)
        .with_action(open("apps", "rename"))
        .with_widget(widget.clone());
    let (meta, apps) = apps_plugin(vec![row]);
    let (mut launcher, _updates) = launcher_with(vec![(meta, &apps)]);
    launcher.show_launcher(None, false);
    launcher.perform_search("app r");

    launcher.handle_key(Key::Enter.into());

    assert_eq!(widget.submitted.load(Ordering::SeqCst), 1);
    assert!(apps.probe.executed().is_empty());
    assert!(launcher.state().visible);
}

// ============================================================================
// One-shot invocation
// ============================================================================

fn power_plugin() -> (PluginMeta, Scripted) {
    (
        PluginMeta::new("power").with_triggers(&["power "]),
        Scripted::new(|_| {
            vec![
                SearchResult::new("Shut down", 0.95)
                    .with_action(Action::plugin("power", "shutdown", json!(null)))
                    .with_data(keys::ACTION, "shutdown"),
                SearchResult::new("Lock", 0.5)
                    .with_action(Action::plugin("power", "lock", json!(null)))
                    .with_data(keys::ACTION, "lock"),
            ]
        }),
    )
}

#[test]
fn test_invoke_prefers_matching_action_tag() -> crate::Result<()> {
    let (meta, power) = power_plugin();
    let (mut launcher, _updates) = launcher_with(vec![(meta, &power)]);

    let result = launcher.invoke("power lock")?;

    assert_eq!(result.map(|r| r.title), Some("Lock".to_string()));
    assert_eq!(power.probe.queries(), vec!["lock"]);
    assert_eq!(power.probe.executed(), vec![("lock".to_string(), json!(null))]);
    Ok(())
}

#[test]
fn test_invoke_falls_back_to_confident_result() -> crate::Result<()> {
    let (meta, power) = power_plugin();
    let (mut launcher, _updates) = launcher_with(vec![(meta, &power)]);

    let result = launcher.invoke("power off")?;

    assert_eq!(result.map(|r| r.title), Some("Shut down".to_string()));
    Ok(())
}

#[test]
fn test_invoke_falls_back_to_first_result() -> crate::Result<()> {
    let (meta, apps) = apps_plugin(vec![
        SearchResult::new("Files", 0.4).with_action(open("apps", "files")),
        SearchResult::new("Firefox", 0.6).with_action(open("apps", "firefox")),
    ]);
    let (mut launcher, _updates) = launcher_with(vec![(meta, &apps)]);

    let result = launcher.invoke("app f")?;

    assert_eq!(result.map(|r| r.title), Some("Files".to_string()));
    Ok(())
}

#[test]
fn test_invoke_activates_lazy_plugin() -> crate::Result<()> {
    let (meta, power) = power_plugin();
    let (mut launcher, _updates) = launcher_with_config(lazy_config(), vec![(meta, &power)]);

    launcher.invoke("power lock")?;

    assert!(launcher.plugins().is_active("power"));
    assert_eq!(power.probe.executed().len(), 1);
    Ok(())
}

#[test]
fn test_invoke_without_results_is_none() -> crate::Result<()> {
    let (meta, apps) = apps_plugin(Vec::new());
    let (mut launcher, _updates) = launcher_with(vec![(meta, &apps)]);

    assert!(launcher.invoke("app nothing")?.is_none());
    Ok(())
}

#[test]
fn test_invoke_unknown_trigger_fails() {
    let (mut launcher, _updates) = launcher_with(Vec::new());

    let err = launcher.invoke("nope x").unwrap_err();

    assert!(matches!(err, Error::PluginNotFound(_)));
}

#[test]
fn test_invoke_result_without_action_fails() {
    let (meta, apps) = apps_plugin(vec![SearchResult::new("Inert", 1.0)]);
    let (mut launcher, _updates) = launcher_with(vec![(meta, &apps)]);

    let err = launcher.invoke("app inert").unwrap_err();

    assert!(matches!(err, Error::NoAction));
}

#[test]
fn test_invoke_event_is_processed() {
    let (meta, power) = power_plugin();
    let (mut launcher, _updates) = launcher_with(vec![(meta, &power)]);

    launcher
        .events()
        .send(LauncherEvent::Invoke {
            command: "power shutdown".to_string(),
        })
        .unwrap();
    launcher.process_pending();

    assert_eq!(
        power.probe.executed(),
        vec![("shutdown".to_string(), json!(null))]
    );
}
