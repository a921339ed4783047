//! Error types for the host layer.

use thiserror::Error;

/// Errors raised by the filesystem adapters and the module loader.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read file: {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to file: {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The directory (or some other entry) is already present at `path`.
    #[error("File exists: {path}")]
    AlreadyExists { path: String },

    #[error("Failed to create directory: {path}: {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("require failed with {message} stack: {stack}")]
    ModuleLoad {
        path: String,
        message: String,
        stack: String,
    },
}

impl Error {
    pub fn read(path: impl Into<String>, source: impl Into<std::io::Error>) -> Self {
        Error::Read {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn write(path: impl Into<String>, source: impl Into<std::io::Error>) -> Self {
        Error::Write {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn create_directory(path: impl Into<String>, source: impl Into<std::io::Error>) -> Self {
        Error::CreateDirectory {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Whether this is the recoverable "already exists" outcome of `make_directory`.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Error::AlreadyExists { .. })
    }
}
