//! Host capability layer for devbuild.
//!
//! Provides the filesystem adapter, path utility and module loader the build
//! runs on, for both the native host (std) and the embedded host (raw OS
//! primitives). A [`Runtime`] bundles the providers selected at startup.

mod error;
pub mod fs;
pub mod module;
pub mod path;
pub mod runtime;

pub use error::Error;
pub use fs::{FileSystem, NativeFs};
#[cfg(unix)]
pub use fs::EmbeddedFs;
pub use module::{Builtin, Exports, ModuleLoader, Resolved};
pub use path::{NativePaths, PathOps, StringPaths};
pub use runtime::{HostKind, Invocation, Runtime, HOST_ENV_VAR};

/// Result type for host operations.
pub type Result<T> = std::result::Result<T, Error>;
