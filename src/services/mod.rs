pub mod history;
pub mod openai;
pub mod shell;

pub use self::history::HistoryLog;
pub use self::openai::OpenAiClient;
pub use self::shell::{is_on_path, ShellRunner};
