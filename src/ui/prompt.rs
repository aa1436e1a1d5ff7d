use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::core::{Error, Prompter, Result};

/// Line input backed by rustyline. Ctrl-C and Ctrl-D read as a closed
/// stream, which the session treats as a decline.
pub struct TerminalPrompt {
    editor: DefaultEditor,
}

impl TerminalPrompt {
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new()
            .map_err(|e| Error::InputError(format!("cannot open terminal input: {}", e)))?;
        Ok(TerminalPrompt { editor })
    }
}

impl Prompter for TerminalPrompt {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(e) => Err(Error::InputError(e.to_string())),
        }
    }
}
