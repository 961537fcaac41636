//! Flint launcher CLI
//!
//! Drives the launcher core from a terminal. Provides:
//! - Default: interactive session reading entry text and key commands from stdin
//! - One-shot invocation of `"<trigger> <query>"`
//! - Plugin and trigger listings

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flint_core::Launcher;
use flint_core::config::{Config, Directories, TriggerConfig};
use flint_types::{Key, KeyPress, LauncherEvent, LauncherUpdate, SearchResult};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Flint launcher CLI
#[derive(Parser)]
#[command(name = "flint")]
#[command(about = "Flint launcher - trigger-routed plugin launcher")]
#[command(version)]
#[command(after_help = "\
Examples:
  flint                       Interactive session on stdin
  flint invoke calc 2+2       Run the best result of a trigger query
  flint query cal tomorrow    Print the results a query would show
  flint query --json web rust Print results as JSON
  flint plugins               List discovered plugins
  flint triggers              List trigger keywords and their owners
  flint init                  Create config directories and default files

Interactive commands (one per line, anything else is entry text):
  /tab /stab /up /down /pgup /pgdn /home /end /enter /senter /esc /back
  /click N   /buttons N   /show [seed]   /hide   /invoke CMD   /reload NAME   /quit
")]
struct Cli {
    /// Extra plugin directory, searched after the user plugin directory
    #[arg(long = "plugins-dir", global = true)]
    plugin_dirs: Vec<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive session (the default)
    Repl,

    /// Query the plugin owning a trigger and activate the best result
    Invoke {
        /// Trigger followed by its query, e.g. `calc 2+2`
        #[arg(required = true, num_args = 1..)]
        command: Vec<String>,
    },

    /// Evaluate a query and print the results
    Query {
        /// Print results as JSON
        #[arg(long)]
        json: bool,

        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// List discovered plugins
    Plugins,

    /// List trigger keywords and the plugins owning them
    Triggers,

    /// Create config directories, config.json and triggers.json
    Init,
}

fn setup_logging() {
    let default_level = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("flint={default_level}")));

    if cfg!(debug_assertions) {
        let temp_dir = std::env::temp_dir();
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let log_filename = format!("flint-{timestamp}.log");
        let log_path = temp_dir.join(&log_filename);

        #[cfg(unix)]
        {
            let symlink_path = temp_dir.join("flint.log");
            let _ = std::fs::remove_file(&symlink_path);
            let _ = std::os::unix::fs::symlink(&log_path, &symlink_path);
        }

        let file_appender = tracing_appender::rolling::never(&temp_dir, &log_filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        std::mem::forget(guard);

        let file_layer = fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_line_number(true);

        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(file_layer)
            .with(stderr_layer)
            .with(filter)
            .init();

        eprintln!("Logging to: {} (and stderr)", log_path.display());
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging();

    match cli.command {
        None | Some(Commands::Repl) => run_repl(&cli.plugin_dirs).await,
        Some(Commands::Invoke { command }) => run_invoke(&cli.plugin_dirs, &command.join(" ")),
        Some(Commands::Query { json, text }) => run_query(&cli.plugin_dirs, &text.join(" "), json),
        Some(Commands::Plugins) => run_plugins(&cli.plugin_dirs),
        Some(Commands::Triggers) => run_triggers(&cli.plugin_dirs),
        Some(Commands::Init) => run_init(),
    }
}

/// Load configuration, discover plugins and start the launcher
fn build_launcher(
    extra_dirs: &[PathBuf],
) -> Result<(Launcher, UnboundedReceiver<LauncherUpdate>)> {
    let dirs = Directories::new()?;
    let config = Config::load(&dirs.config_file)
        .with_context(|| format!("Failed to load {}", dirs.config_file.display()))?;
    let triggers = TriggerConfig::load(&dirs.triggers_file)
        .with_context(|| format!("Failed to load {}", dirs.triggers_file.display()))?;

    let (mut launcher, updates) = Launcher::new(config, triggers);
    for dir in std::iter::once(&dirs.user_plugins).chain(extra_dirs) {
        launcher
            .plugins_mut()
            .discover(dir)
            .with_context(|| format!("Failed to read plugin directory {}", dir.display()))?;
    }
    launcher.start();

    Ok((launcher, updates))
}

fn run_invoke(extra_dirs: &[PathBuf], command: &str) -> Result<()> {
    let (mut launcher, _updates) = build_launcher(extra_dirs)?;

    let outcome = launcher
        .invoke(command)
        .with_context(|| format!("Invocation '{command}' failed"));
    launcher.plugins_mut().shutdown();

    match outcome? {
        Some(result) => println!("{}", result.title),
        None => println!("No results for '{command}'."),
    }
    Ok(())
}

fn run_query(extra_dirs: &[PathBuf], text: &str, json: bool) -> Result<()> {
    let (mut launcher, _updates) = build_launcher(extra_dirs)?;

    launcher.perform_search(text);
    let results = launcher.state().results.clone();
    launcher.plugins_mut().shutdown();

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
    }
    for (i, result) in results.iter().enumerate() {
        print_result(i, result, false);
    }
    Ok(())
}

fn run_plugins(extra_dirs: &[PathBuf]) -> Result<()> {
    let (mut launcher, _updates) = build_launcher(extra_dirs)?;
    let plugins = launcher.plugins().list();
    launcher.plugins_mut().shutdown();

    if plugins.is_empty() {
        println!("No plugins found.");
        return Ok(());
    }

    println!("\nInstalled Plugins:\n");

    for plugin in &plugins {
        let status = match (plugin.enabled, plugin.active) {
            (false, _) => "disabled",
            (true, true) => "active",
            (true, false) => "lazy",
        };

        print!("  {:<16} {}", plugin.name, plugin.display_name);
        if !plugin.triggers.is_empty() {
            print!(" [{}]", plugin.triggers.join(", ").trim_end());
        }
        if plugin.global {
            print!(" (global)");
        }
        println!(" ({status})");

        if !plugin.description.is_empty() {
            println!("                   {}", plugin.description);
        }
    }

    println!();
    Ok(())
}

fn run_triggers(extra_dirs: &[PathBuf]) -> Result<()> {
    let (mut launcher, _updates) = build_launcher(extra_dirs)?;
    let words = launcher.plugins().trigger_words();

    if words.is_empty() {
        println!("No triggers registered.");
    }
    for word in &words {
        let owner = launcher
            .plugins()
            .trigger_owner(word)
            .or_else(|| launcher.plugins().trigger_owner(&format!("{word} ")))
            .unwrap_or("?");
        println!(
            "  {word:<10} {owner:<16} {}",
            launcher.trigger_config().description(word)
        );
    }

    launcher.plugins_mut().shutdown();
    Ok(())
}

fn run_init() -> Result<()> {
    let dirs = Directories::new()?;
    dirs.ensure_exists()
        .with_context(|| format!("Failed to create {}", dirs.config.display()))?;

    if dirs.config_file.exists() {
        println!("  exists   {}", dirs.config_file.display());
    } else {
        Config::default().save(&dirs.config_file)?;
        println!("  created  {}", dirs.config_file.display());
    }

    if dirs.triggers_file.exists() {
        println!("  exists   {}", dirs.triggers_file.display());
    } else {
        TriggerConfig::load(&dirs.triggers_file)?.save()?;
        println!("  created  {}", dirs.triggers_file.display());
    }

    println!("  plugins  {}", dirs.user_plugins.display());
    Ok(())
}

async fn run_repl(extra_dirs: &[PathBuf]) -> Result<()> {
    let (mut launcher, mut updates) = build_launcher(extra_dirs)?;
    let _watcher = launcher.watch_plugins()?;

    let printer = tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            print_update(&update);
        }
    });

    let events = launcher.events();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut entry = String::new();
        while let Ok(Some(line)) = lines.next_line().await {
            let batch = parse_line(&line, &mut entry);
            let quit = batch.iter().any(|e| matches!(e, LauncherEvent::Shutdown));
            if batch.into_iter().any(|event| events.send(event).is_err()) || quit {
                return;
            }
        }
        let _ = events.send(LauncherEvent::Shutdown);
    });

    info!("Interactive session started");
    launcher.show_launcher(None, false);
    launcher.run().await;

    drop(launcher);
    printer.await.context("Update printer failed")?;
    Ok(())
}

fn key(key: Key) -> LauncherEvent {
    LauncherEvent::Key {
        press: KeyPress::plain(key),
    }
}

fn shifted(key: Key) -> LauncherEvent {
    LauncherEvent::Key {
        press: KeyPress::shifted(key),
    }
}

/// Translate one input line. `entry` tracks the text typed so far so that
/// `/back` can emit the edit a Backspace would make.
fn parse_line(line: &str, entry: &mut String) -> Vec<LauncherEvent> {
    let Some(command) = line.strip_prefix('/') else {
        entry.clear();
        entry.push_str(line);
        return vec![LauncherEvent::TextChanged {
            text: line.to_string(),
        }];
    };

    let (name, arg) = command.split_once(' ').unwrap_or((command, ""));
    let event = match name {
        "tab" => key(Key::Tab),
        "stab" => shifted(Key::Tab),
        "up" => key(Key::Up),
        "down" => key(Key::Down),
        "pgup" => key(Key::PageUp),
        "pgdn" => key(Key::PageDown),
        "home" => key(Key::Home),
        "end" => key(Key::End),
        "enter" => key(Key::Enter),
        "senter" => shifted(Key::Enter),
        "esc" => key(Key::Escape),
        "back" => {
            entry.pop();
            return vec![
                key(Key::Backspace),
                LauncherEvent::TextChanged {
                    text: entry.clone(),
                },
            ];
        }
        "click" => match arg.trim().parse() {
            Ok(index) => LauncherEvent::ResultClicked { index },
            Err(_) => {
                eprintln!("usage: /click N");
                return Vec::new();
            }
        },
        "buttons" => match arg.trim().parse() {
            Ok(count) => LauncherEvent::HeaderButtons { count },
            Err(_) => {
                eprintln!("usage: /buttons N");
                return Vec::new();
            }
        },
        "show" => {
            entry.clear();
            entry.push_str(arg);
            LauncherEvent::Show {
                seed: (!arg.is_empty()).then(|| arg.to_string()),
                external: true,
            }
        }
        "hide" => LauncherEvent::Hide,
        "invoke" => LauncherEvent::Invoke {
            command: arg.to_string(),
        },
        "reload" if !arg.trim().is_empty() => LauncherEvent::PluginChanged {
            plugin: arg.trim().to_string(),
        },
        "reload" => {
            eprintln!("usage: /reload NAME");
            return Vec::new();
        }
        "quit" => LauncherEvent::Shutdown,
        other => {
            eprintln!("unknown command: /{other}");
            return Vec::new();
        }
    };
    vec![event]
}

fn print_result(index: usize, result: &SearchResult, selected: bool) {
    let marker = if selected { ">" } else { " " };
    print!("{marker} {index:>2}. {}", result.title);
    if !result.subtitle.is_empty() {
        print!("  ({})", result.subtitle);
    }
    if !result.plugin_name.is_empty() {
        print!("  [{}]", result.plugin_name);
    }
    println!();
}

fn print_update(update: &LauncherUpdate) {
    match update {
        LauncherUpdate::Results { results, selected } => {
            println!("-- {} results", results.len());
            for (i, result) in results.iter().enumerate() {
                print_result(i, result, i == *selected);
            }
        }
        LauncherUpdate::Selection { index } => println!("-- selected {index}"),
        LauncherUpdate::Focus { mode, header_index } => {
            println!("-- focus {mode:?} (header {header_index})");
        }
        LauncherUpdate::EntryText { text, .. } => println!("-- entry '{text}'"),
        LauncherUpdate::Placeholder { text } => println!("-- {text}"),
        LauncherUpdate::HeaderActivated { index } => {
            println!("-- header button {index} activated");
        }
        LauncherUpdate::Show => println!("-- shown"),
        LauncherUpdate::Close => println!("-- closed"),
    }
}
