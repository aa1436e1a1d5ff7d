pub mod prompt;
pub mod session;
pub mod spinner;

pub use self::prompt::TerminalPrompt;
pub use self::session::{Session, SessionEnd};
