use crate::core::conversation::Message;
use crate::core::error::Result;

/// One request/response round-trip that yields a candidate shell command.
/// The model and endpoint are bound at construction.
#[async_trait::async_trait]
pub trait CompletionClient {
    async fn complete(&self, messages: &[Message]) -> Result<String>;
}

/// Runs a candidate command in the host shell. An `Err` means the shell
/// itself could not run; a command that ran and failed is an outcome,
/// not an error.
pub trait CommandRunner {
    fn run(&self, command: &str) -> Result<ExecutionOutcome>;
}

/// One line of input from the user, shown behind `prompt`. Returns `None`
/// when the input stream is closed or interrupted.
pub trait Prompter {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// What happened when a candidate command ran. `succeeded` mirrors the
/// process exit status; the retry branch is entered whenever `diagnostic`
/// is present, so a zero-exit command that wrote to stderr still counts
/// as something to fix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub succeeded: bool,
    pub diagnostic: Option<String>,
}

impl ExecutionOutcome {
    pub fn success() -> Self {
        ExecutionOutcome {
            succeeded: true,
            diagnostic: None,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostic.is_none()
    }
}

/// What the user chose at the "find a fix?" prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    Abort,
    Feedback(String),
}

impl RetryDecision {
    /// Empty or `y` retries with the history as-is, `n` aborts, anything
    /// else is free-text feedback carried verbatim.
    pub fn parse(reply: &str) -> Self {
        let normalized = reply.trim().to_lowercase();
        if normalized.is_empty() || normalized == "y" {
            RetryDecision::Retry
        } else if normalized == "n" {
            RetryDecision::Abort
        } else {
            RetryDecision::Feedback(reply.to_string())
        }
    }
}
