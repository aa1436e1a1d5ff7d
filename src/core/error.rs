use std::error::Error as StdError;
use std::fmt;

#[derive(Debug)]
pub enum Error {
    CompletionError(String),
    ExecutionError(String),
    ConfigError(String),
    HistoryError(String),
    InputError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::CompletionError(msg) => write!(f, "completion error: {}", msg),
            Error::ExecutionError(msg) => write!(f, "execution error: {}", msg),
            Error::ConfigError(msg) => write!(f, "configuration error: {}", msg),
            Error::HistoryError(msg) => write!(f, "history error: {}", msg),
            Error::InputError(msg) => write!(f, "input error: {}", msg),
        }
    }
}

impl StdError for Error {}

pub type Result<T> = std::result::Result<T, Error>;
