pub mod conversation;
pub mod error;
pub mod traits;

pub use self::conversation::{Conversation, Message, Role};
pub use self::error::{Error, Result};
pub use self::traits::{CommandRunner, CompletionClient, ExecutionOutcome, Prompter, RetryDecision};
