//! Subprocess execution with a wall-clock limit.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{Duration, timeout};

/// Captured output of a successful command.
#[derive(Debug, Clone, Default)]
pub(crate) struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug)]
pub(crate) enum CommandFailure {
    Spawn(std::io::Error),
    Exit {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    Timeout(String),
}

impl CommandFailure {
    /// Everything the process reported, for error classification.
    pub fn text(&self) -> String {
        match self {
            Self::Spawn(err) => err.to_string(),
            Self::Exit {
                code,
                stdout,
                stderr,
            } => {
                let mut text = String::new();
                if !stderr.trim().is_empty() {
                    text.push_str(stderr.trim());
                }
                if !stdout.trim().is_empty() {
                    if !text.is_empty() {
                        text.push('\n');
                    }
                    text.push_str(stdout.trim());
                }
                if text.is_empty() {
                    text = format!("process exited with code {}", code.unwrap_or(-1));
                }
                text
            }
            Self::Timeout(message) => message.clone(),
        }
    }
}

/// Render a command line for messages.
pub(crate) fn display_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn timeout_message(command: &str, limit: Duration) -> String {
    let head: String = command.chars().take(40).collect();
    format!(
        "Execution of {head}... cancelled as it exceeded a timeout of {} ms",
        limit.as_millis()
    )
}

/// Run `program args..` in `cwd`, killing it once `limit` elapses.
pub(crate) async fn run(
    program: &str,
    args: &[String],
    cwd: &Path,
    limit: Duration,
) -> Result<CommandOutput, CommandFailure> {
    let command_line = display_command(program, args);
    tracing::debug!(command = %command_line, cwd = %cwd.display(), "Spawning");

    let child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(CommandFailure::Spawn)?;

    // Dropping the wait future on timeout drops the child, which kills it.
    let output = timeout(limit, child.wait_with_output())
        .await
        .map_err(|_| CommandFailure::Timeout(timeout_message(&command_line, limit)))?
        .map_err(CommandFailure::Spawn)?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        return Err(CommandFailure::Exit {
            code: output.status.code(),
            stdout,
            stderr,
        });
    }

    Ok(CommandOutput { stdout, stderr })
}
