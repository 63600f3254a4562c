use api::NetworkError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("message is limited to {max} characters")]
    TooLong { max: usize },

    #[error("please wait for the current reply")]
    Disabled,
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("could not save {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: /{0}. Type /help for available commands.")]
    Unknown(String),

    #[error("Empty command")]
    Empty,

    #[error("Usage: /{command} [n] where n is a PDF number, got '{arg}'")]
    InvalidIndex { command: String, arg: String },
}
