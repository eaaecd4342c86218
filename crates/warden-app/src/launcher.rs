//! Worker child process.
//!
//! # Design
//! - stdin and stdout are inherited; stderr is piped, forwarded to the log and
//!   the last [`STDERR_TAIL_LINES`] lines are kept for failure reports.
//! - Each line is cut at [`STDERR_LINE_BYTES`]; the rest of an over-long line
//!   is read and dropped.
//! - The child is awaited without a timeout.

use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, Command};
use tracing::{debug, info, warn};

/// Number of trailing stderr lines kept from the worker.
pub const STDERR_TAIL_LINES: usize = 40;

/// Longest stderr line kept, in bytes.
pub const STDERR_LINE_BYTES: usize = 4096;

const TRUNCATED_MARKER: &str = " [truncated]";

/// Errors raised while running the worker.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The entrypoint does not exist.
    #[error("worker entrypoint not found")]
    EntrypointMissing {
        /// Entrypoint that was checked.
        path: PathBuf,
    },
    /// The worker could not be spawned.
    #[error("failed to spawn worker")]
    Spawn {
        /// Program that was executed.
        program: String,
        /// Source IO error.
        source: io::Error,
    },
    /// Waiting on the worker failed.
    #[error("failed to wait for worker")]
    Wait {
        /// Source IO error.
        source: io::Error,
    },
    /// The worker exited unsuccessfully.
    #[error("worker exited unsuccessfully")]
    WorkerFailure {
        /// Exit code; `None` when terminated by a signal.
        exit_code: Option<i32>,
        /// Trailing stderr lines.
        stderr_tail: Vec<String>,
    },
}

/// Result alias for launch operations.
pub type LaunchResult<T> = Result<T, LaunchError>;

/// Successful worker run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitOutcome {
    /// Exit code reported by the worker.
    pub exit_code: i32,
    /// Trailing stderr lines.
    pub stderr_tail: Vec<String>,
}

/// Runs the worker entrypoint as a child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessLauncher {
    interpreter: Option<String>,
}

impl ProcessLauncher {
    /// Launcher running entrypoints through `interpreter`, or directly when
    /// `None` or blank.
    #[must_use]
    pub fn new(interpreter: Option<String>) -> Self {
        Self {
            interpreter: interpreter.filter(|value| !value.trim().is_empty()),
        }
    }

    /// Interpreter used for entrypoints, if any.
    #[must_use]
    pub fn interpreter(&self) -> Option<&str> {
        self.interpreter.as_deref()
    }

    /// Run `entrypoint` to completion.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::EntrypointMissing`] before spawning when the
    /// entrypoint is absent, [`LaunchError::Spawn`] when the program cannot be
    /// started and [`LaunchError::WorkerFailure`] on a non-zero exit.
    pub async fn launch(&self, entrypoint: &Path) -> LaunchResult<ExitOutcome> {
        if !entrypoint.exists() {
            return Err(LaunchError::EntrypointMissing {
                path: entrypoint.to_path_buf(),
            });
        }

        let (program, mut command) = match &self.interpreter {
            Some(interpreter) => {
                let mut command = Command::new(interpreter);
                command.arg(entrypoint);
                (interpreter.clone(), command)
            }
            None => {
                // Bare names would otherwise be looked up on PATH.
                let executable = if entrypoint.components().count() == 1 {
                    Path::new(".").join(entrypoint)
                } else {
                    entrypoint.to_path_buf()
                };
                (
                    executable.display().to_string(),
                    Command::new(executable),
                )
            }
        };
        command
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|source| LaunchError::Spawn { program, source })?;
        info!(
            pid = child.id().unwrap_or_default(),
            entrypoint = %entrypoint.display(),
            "worker started"
        );

        let stderr_tail = match child.stderr.take() {
            Some(stderr) => collect_stderr(stderr).await,
            None => Vec::new(),
        };
        let status = child
            .wait()
            .await
            .map_err(|source| LaunchError::Wait { source })?;

        match status.code() {
            Some(0) => {
                info!("worker exited successfully");
                Ok(ExitOutcome {
                    exit_code: 0,
                    stderr_tail,
                })
            }
            exit_code => Err(LaunchError::WorkerFailure {
                exit_code,
                stderr_tail,
            }),
        }
    }
}

async fn collect_stderr(stderr: ChildStderr) -> Vec<String> {
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
    let mut reader = BufReader::new(stderr);
    loop {
        match read_capped_line(&mut reader).await {
            Ok(Some(line)) => {
                debug!(target: "worker.stderr", %line, "worker stderr");
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "failed to read worker stderr");
                break;
            }
        }
    }
    tail.into()
}

/// Next line without its terminator, holding at most [`STDERR_LINE_BYTES`].
async fn read_capped_line<R>(reader: &mut R) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut kept = Vec::new();
    let mut truncated = false;
    let mut started = false;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(started.then(|| finish_line(kept, truncated)));
        }
        started = true;

        let newline = available.iter().position(|byte| *byte == b'\n');
        let chunk = newline.map_or(available, |end| &available[..end]);
        let room = STDERR_LINE_BYTES.saturating_sub(kept.len());
        truncated |= chunk.len() > room;
        kept.extend_from_slice(&chunk[..chunk.len().min(room)]);

        let consumed = newline.map_or(available.len(), |end| end + 1);
        reader.consume(consumed);
        if newline.is_some() {
            return Ok(Some(finish_line(kept, truncated)));
        }
    }
}

fn finish_line(mut kept: Vec<u8>, truncated: bool) -> String {
    if !truncated && kept.last() == Some(&b'\r') {
        kept.pop();
    }
    let mut line = String::from_utf8_lossy(&kept).into_owned();
    if truncated {
        line.push_str(TRUNCATED_MARKER);
    }
    line
}
