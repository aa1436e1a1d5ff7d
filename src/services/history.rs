use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use crate::core::{Error, Message, Result, Role};

/// Flat append-only log of conversation turns, one `role: content` line per
/// message. A log, not a database: no compaction, no indexing, and growth is
/// bounded only by the user's patience.
#[derive(Debug)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        HistoryLog { path: path.into() }
    }

    /// Parses every record in the log; a missing file is an empty history.
    /// Lines that do not parse (blank separators, continuation lines of a
    /// multi-line diagnostic) are skipped.
    pub fn load(&self) -> Vec<Message> {
        let Ok(contents) = fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        let messages: Vec<Message> = contents.lines().filter_map(parse_record).collect();
        tracing::debug!(path = %self.path.display(), turns = messages.len(), "history loaded");
        messages
    }

    /// Appends one turn-pair. The file is opened and closed per write; no
    /// lock is held across the session.
    pub fn append(&self, user_text: &str, assistant_text: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                Error::HistoryError(format!("cannot open {}: {}", self.path.display(), e))
            })?;
        write!(
            file,
            "\n{}: {}\n{}: {}",
            Role::User.as_str(),
            user_text,
            Role::Assistant.as_str(),
            assistant_text
        )
        .map_err(|e| Error::HistoryError(format!("cannot write {}: {}", self.path.display(), e)))
    }
}

fn parse_record(line: &str) -> Option<Message> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (token, content) = line.split_once(": ")?;
    let role = match Role::parse(token) {
        Some(role) => role,
        None => {
            tracing::trace!(token = %token, "skipping unparseable history line");
            return None;
        }
    };
    Some(Message {
        role,
        content: content.to_string(),
    })
}
