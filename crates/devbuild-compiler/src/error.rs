/// Error types for the devbuild compiler

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BuildError>;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Failed to read file: {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "\n========================\nCOMPILATION ERROR!\n\nFile:   {path}\nStack:\n\n{stack}\n\n========================\n"
    )]
    Transform { path: String, stack: String },

    #[error("Failed to create directory: {path}: {source}")]
    DirectoryCreate {
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

    #[error("require failed with {message} stack: {stack}")]
    ModuleLoad {
        path: String,
        message: String,
        stack: String,
    },

    #[error("Usage: {0}")]
    Usage(String),

    #[error("Invalid configuration in {path}: {message}")]
    Config { path: String, message: String },
}

impl BuildError {
    pub fn transform(path: impl Into<String>, stack: impl Into<String>) -> Self {
        BuildError::Transform {
            path: path.into(),
            stack: stack.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        BuildError::Usage(message.into())
    }

    pub fn config(path: impl Into<String>, message: impl Into<String>) -> Self {
        BuildError::Config {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<devbuild_host::Error> for BuildError {
    fn from(err: devbuild_host::Error) -> Self {
        use devbuild_host::Error as HostError;

        match err {
            HostError::Read { path, source } => BuildError::Read { path, source },
            HostError::Write { path, source } => BuildError::Write { path, source },
            HostError::CreateDirectory { path, source } => {
                BuildError::DirectoryCreate { path, source }
            }
            HostError::AlreadyExists { path } => BuildError::DirectoryCreate {
                source: std::io::Error::from(std::io::ErrorKind::AlreadyExists),
                path,
            },
            HostError::ModuleLoad {
                path,
                message,
                stack,
            } => BuildError::ModuleLoad {
                path,
                message,
                stack,
            },
        }
    }
}
