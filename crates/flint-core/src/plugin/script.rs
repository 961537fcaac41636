//! Plugins backed by an external handler process.
//!
//! Each call spawns the handler, writes one JSON request to its stdin and
//! reads `{"results": [...]}` from its stdout. Handlers that overrun their
//! timeout are killed.

use super::{Handler, Plugin, PluginContext, PluginFactory, PluginMeta};
use anyhow::{Context, bail};
use flint_types::SearchResult;
use serde::Deserialize;
use serde_json::json;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Default, Deserialize)]
struct ScriptResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

pub struct ScriptFactory {
    meta: PluginMeta,
    dir: PathBuf,
    handler: Handler,
}

impl ScriptFactory {
    #[must_use]
    pub fn new(meta: PluginMeta, dir: PathBuf, handler: Handler) -> Self {
        Self { meta, dir, handler }
    }
}

impl PluginFactory for ScriptFactory {
    fn meta(&self) -> &PluginMeta {
        &self.meta
    }

    fn create(&self) -> anyhow::Result<Box<dyn Plugin>> {
        Ok(Box::new(ScriptPlugin {
            name: self.meta.name.clone(),
            dir: self.dir.clone(),
            program: resolve_command(&self.dir, &self.handler.command),
            args: self.handler.args.clone(),
            timeout: Duration::from_millis(self.handler.timeout_ms),
        }))
    }
}

#[derive(Debug)]
pub struct ScriptPlugin {
    name: String,
    dir: PathBuf,
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

/// Paths with a directory part are relative to the plugin directory; bare
/// names are looked up on `PATH`.
fn resolve_command(dir: &Path, command: &str) -> PathBuf {
    let path = Path::new(command);
    if path.is_absolute() || path.components().count() == 1 {
        path.to_path_buf()
    } else {
        dir.join(path)
    }
}

impl ScriptPlugin {
    fn run(&self, request: &serde_json::Value) -> anyhow::Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to spawn {}", self.program.display()))?;

        if let Some(mut stdin) = child.stdin.take()
            && let Err(e) = stdin.write_all(request.to_string().as_bytes())
        {
            debug!("[{}] handler closed stdin early: {e}", self.name);
        }

        let (tx, rx) = mpsc::channel();
        if let Some(mut stdout) = child.stdout.take() {
            std::thread::spawn(move || {
                let mut output = String::new();
                let _ = tx.send(stdout.read_to_string(&mut output).map(|_| output));
            });
        }

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                bail!("handler timed out after {}ms", self.timeout.as_millis());
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        if !status.success() {
            bail!("handler exited with {status}");
        }

        let output = rx
            .recv_timeout(self.timeout)
            .context("handler output not received")??;
        Ok(output)
    }
}

impl Plugin for ScriptPlugin {
    fn initialize(&mut self, _ctx: &PluginContext) -> anyhow::Result<()> {
        if self.program.components().count() > 1 && !self.program.exists() {
            bail!("handler {} not found", self.program.display());
        }
        Ok(())
    }

    fn query(&mut self, query: &str) -> anyhow::Result<Vec<SearchResult>> {
        let output = self.run(&json!({"step": "query", "query": query}))?;
        if output.trim().is_empty() {
            return Ok(Vec::new());
        }

        let response: ScriptResponse =
            serde_json::from_str(&output).context("invalid handler response")?;

        Ok(response
            .results
            .into_iter()
            .map(|mut result| {
                if result.plugin_name.is_empty() {
                    result.plugin_name.clone_from(&self.name);
                }
                result
            })
            .collect())
    }

    fn execute(&mut self, command: &str, args: &serde_json::Value) -> anyhow::Result<()> {
        self.run(&json!({"step": "execute", "command": command, "args": args}))?;
        Ok(())
    }
}
