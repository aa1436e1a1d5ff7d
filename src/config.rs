use std::env;
use std::path::PathBuf;

use crate::core::{Error, Result};

const DEFAULT_MODEL: &str = "gpt-4";
const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const HISTORY_FILE: &str = "mem.txt";

/// Everything the session needs, resolved once at startup. Values come from
/// the environment (after loading a `.env` file when present) so nothing is
/// read ambiently later.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub input_language: String,
    pub terminal_name: String,
    pub history_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::ConfigError("OPENAI_API_KEY is not set".to_string()))?;

        Ok(Config {
            api_key,
            api_url: env_or("OPENAI_API_URL", DEFAULT_API_URL),
            model: env_or("OPENAI_MODEL", DEFAULT_MODEL),
            input_language: env_or("INPUT_LANGUAGE", "English"),
            terminal_name: env::var("TERMINAL_NAME")
                .ok()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| default_terminal_name().to_string()),
            history_path: PathBuf::from(HISTORY_FILE),
        })
    }

    /// The assistant's contract, with both labels interpolated. Sent exactly
    /// once per session as the leading system message.
    pub fn system_message(&self) -> String {
        format!(
            "You are a {lang}-to-command translator. The user writes an instruction in \
             {lang} and you reply with exactly one command that carries it out in the \
             {term}: opening programs, searching the web, inspecting files, anything \
             the shell can do. Your reply is passed to the shell verbatim, so it must be \
             plain text containing nothing but the command itself: no code fences, no \
             commentary, no surrounding quotes. Express multi-step work as a single line \
             chained with shell operators. You may use popular command line tools that \
             are not preinstalled as long as they are compatible with the system. When \
             the user reports an error message or gives feedback about a previous \
             command, reply with a corrected command that resolves the issue. If you \
             truly must answer in natural language, reply with a command that prints \
             your answer.",
            lang = self.input_language,
            term = self.terminal_name,
        )
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn default_terminal_name() -> &'static str {
    if cfg!(target_os = "macos") {
        "macOS terminal"
    } else if cfg!(target_os = "windows") {
        "Windows Command Prompt"
    } else if cfg!(target_os = "linux") {
        "Linux terminal"
    } else {
        "terminal"
    }
}
