use std::env;
use std::process::{Command, Stdio};

use which::which;

use crate::core::{CommandRunner, Error, ExecutionOutcome, Result};

/// Runs candidate commands through the user's shell. Standard output streams
/// straight to the terminal; only the error channel is captured, because that
/// is what gets reported back into the conversation.
#[derive(Debug)]
pub struct ShellRunner {
    shell_path: String,
}

impl ShellRunner {
    pub fn new() -> Self {
        ShellRunner {
            shell_path: env::var("SHELL").unwrap_or_else(|_| String::from("/bin/sh")),
        }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str) -> Result<ExecutionOutcome> {
        if command.trim().is_empty() {
            return Err(Error::ExecutionError("empty command provided".to_string()));
        }

        tracing::debug!(shell = %self.shell_path, command = %command, "running command");

        let output = Command::new(&self.shell_path)
            .arg("-c")
            .arg(command)
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Error::ExecutionError(format!("failed to run shell: {}", e)))?;

        let stderr = String::from_utf8_lossy(&output.stderr)
            .trim_end()
            .to_string();

        let outcome = match output.status.code() {
            None => ExecutionOutcome {
                succeeded: false,
                diagnostic: Some("the command was terminated by a signal".to_string()),
            },
            Some(0) if stderr.is_empty() => ExecutionOutcome::success(),
            // Ran to completion but complained on its error stream.
            Some(0) => ExecutionOutcome {
                succeeded: true,
                diagnostic: Some(format!("stderr: {}", stderr)),
            },
            Some(code) if stderr.is_empty() => ExecutionOutcome {
                succeeded: false,
                diagnostic: Some(format!("the command exited with status {}", code)),
            },
            Some(code) => ExecutionOutcome {
                succeeded: false,
                diagnostic: Some(format!(
                    "the command exited with status {}: {}",
                    code, stderr
                )),
            },
        };

        tracing::debug!(
            succeeded = outcome.succeeded,
            clean = outcome.is_clean(),
            "command finished"
        );
        Ok(outcome)
    }
}

/// Whether the first word of `command` resolves to something runnable.
/// Shell builtins have no binary on disk, so the common ones pass outright.
pub fn is_on_path(command: &str) -> bool {
    let first_word = command.split_whitespace().next().unwrap_or("");
    if first_word.is_empty() {
        return false;
    }
    if matches!(first_word, "cd" | "export" | "source" | "alias") {
        return true;
    }
    which(first_word).is_ok()
}
