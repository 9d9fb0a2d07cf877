//! Build tool execution with merged output capture
//!
//! Runs one command to completion and returns its stdout and stderr as a
//! single line stream, in the order the child wrote them.

use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;

use crate::error::BuildError;

/// Options for command execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOptions {
    /// Working directory for the command
    pub working_dir: Option<PathBuf>,
    /// Environment variables to set
    pub env: HashMap<String, String>,
}

impl ExecOptions {
    /// Create options with a working directory
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: Some(dir.into()),
            ..Default::default()
        }
    }

    /// Add several environment variables
    pub fn with_envs(mut self, vars: &HashMap<String, String>) -> Self {
        for (k, v) in vars {
            self.env.insert(k.clone(), v.clone());
        }
        self
    }
}

/// Result of running a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    /// Exit code, `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    /// Combined stdout/stderr, one entry per line, without line terminators
    pub lines: Vec<String>,
    /// Wall-clock duration
    pub duration: Duration,
}

impl ExecResult {
    /// Captured output as log text, every line newline-terminated
    pub fn log_text(&self) -> String {
        let mut text = String::with_capacity(self.lines.iter().map(|l| l.len() + 1).sum());
        for line in &self.lines {
            text.push_str(line);
            text.push('\n');
        }
        text
    }
}

/// Execute a command and capture stdout and stderr as one stream
///
/// Both descriptors of the child share one pipe, so the captured lines are
/// in the exact order the child wrote them. Blocks (asynchronously) until the
/// process exits and the pipe reaches EOF; there is no timeout.
///
/// # Errors
/// * `BuildError::SpawnFailed` - If the pipe or the command couldn't be set up
/// * `BuildError::Io` - If waiting on the child or the reader fails
pub async fn exec_merged(
    program: &str,
    args: &[String],
    options: &ExecOptions,
) -> Result<ExecResult, BuildError> {
    let start = Instant::now();
    let command_str = command_line(program, args);
    let spawn_failed = |e: io::Error| BuildError::SpawnFailed {
        command: command_str.clone(),
        error: e.to_string(),
    };

    let (reader, writer) = io::pipe().map_err(spawn_failed)?;
    let writer_err = writer.try_clone().map_err(spawn_failed)?;

    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::from(writer));
    cmd.stderr(Stdio::from(writer_err));

    if let Some(ref dir) = options.working_dir {
        cmd.current_dir(dir);
    }
    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    tracing::debug!(command = %command_str, dir = ?options.working_dir, "spawning");

    let spawned = cmd.spawn();
    // The command holds our copies of the write end; EOF needs them closed
    drop(cmd);
    let mut child = spawned.map_err(spawn_failed)?;

    let lines = tokio::task::spawn_blocking(move || read_lines(reader));
    let status = child.wait().await?;
    let lines = lines.await.map_err(io::Error::other)?;
    let duration = start.elapsed();

    tracing::debug!(
        command = %command_str,
        exit_code = ?status.code(),
        lines = lines.len(),
        elapsed_ms = duration.as_millis() as u64,
        "process exited"
    );

    Ok(ExecResult {
        exit_code: status.code(),
        lines,
        duration,
    })
}

/// Read `source` to EOF, one entry per line without its terminator
///
/// On a read error the rest of the output is dropped and the pipe is closed,
/// so a child still writing gets `EPIPE` instead of blocking.
fn read_lines(source: impl Read) -> Vec<String> {
    let mut reader = BufReader::new(source);
    let mut buf = Vec::with_capacity(4096);
    let mut lines = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => lines.push(decode_line(&buf)),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!("Error reading output: {}", e);
                if !buf.is_empty() {
                    lines.push(decode_line(&buf));
                }
                break;
            }
        }
    }

    lines
}

fn decode_line(raw: &[u8]) -> String {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

/// Join program and arguments for display
pub fn command_line(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

/// Spawns build tools on behalf of the dispatcher
#[cfg_attr(test, mockall::automock)]
pub trait Launcher {
    /// Run `program` with `args` to completion
    fn launch(
        &self,
        program: &str,
        args: &[String],
        options: &ExecOptions,
    ) -> Result<ExecResult, BuildError>;
}

/// [`Launcher`] that runs real processes
///
/// Owns a current-thread runtime so callers stay synchronous: one build at a
/// time, each blocking until its process exits.
pub struct ProcessLauncher {
    runtime: tokio::runtime::Runtime,
}

impl ProcessLauncher {
    pub fn new() -> Result<Self, BuildError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { runtime })
    }
}

impl Launcher for ProcessLauncher {
    fn launch(
        &self,
        program: &str,
        args: &[String],
        options: &ExecOptions,
    ) -> Result<ExecResult, BuildError> {
        self.runtime.block_on(exec_merged(program, args, options))
    }
}

/// Check whether a program resolves to an executable
pub fn resolve_tool(program: &str) -> Option<PathBuf> {
    let path = Path::new(program);
    if path.components().count() > 1 {
        return path.is_file().then(|| path.to_path_buf());
    }
    which::which(program).ok()
}
