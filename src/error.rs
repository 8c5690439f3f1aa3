use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Error saving: {0}")]
    Sink(#[from] SinkError),

    #[error("{0}")]
    Network(#[from] NetworkError),

    #[error("{0}")]
    Auth(String),

    #[error("You must be logged in to upload clothes.")]
    NotSignedIn,

    #[error("Admin access required. Sign in with `fitcheck login --admin`.")]
    AdminRequired,

    #[error("A request is already in flight")]
    Busy,

    #[error("Failed to read {}: {source}", path.display())]
    ReadInput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    WriteOutput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Session store error: {0}")]
    Session(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Missing or malformed user input. Blocks the attempt without any state change.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ValidationError {
    #[error("missing name")]
    MissingName,

    #[error("missing image")]
    MissingImage,

    #[error("invalid name {0:?}: use a plain file name without path separators")]
    InvalidName(String),

    #[error("missing {0}")]
    MissingField(&'static str),
}

/// I/O or permission failure while persisting an asset pair.
#[derive(Debug, Error)]
pub(crate) enum SinkError {
    #[error("cannot access {}: {source}", path.display())]
    Access {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    #[error("permission denied: {} is read-only", path.display())]
    ReadOnly { path: PathBuf },

    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no free file name for {name} in {}", dir.display())]
    NameExhausted { name: String, dir: PathBuf },
}

/// A prediction or account call failed or returned something unusable.
#[derive(Debug, Error)]
pub(crate) enum NetworkError {
    #[error("Cannot reach {url}: {message}")]
    Unreachable { url: String, message: String },

    #[error("Server returned non-JSON response: {body}")]
    NonJson { body: String },

    #[error("{0}")]
    Service(String),

    #[error("Failed to read response from {url}: {message}")]
    Body { url: String, message: String },
}
