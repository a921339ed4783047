/// devbuild compiler
///
/// Transforms a list of source files into an output directory and reports
/// every file the build depended on.

pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod materialize;
pub mod plugins;
pub mod transform;

pub use config::{BuildConfig, LoadedConfig, CONFIG_ENV_VAR, CONFIG_MODULE};
pub use driver::{BuildOptions, BuildReport, Builder, DEP_PREFIX};
pub use engine::{BuiltinPlugin, EngineFailure, RewriteEngine, TransformEngine, Transformed};
pub use error::{BuildError, Result};
pub use materialize::{ensure_dir, Materialized};
pub use plugins::{PluginList, PluginProvider, PluginTable, DEBUGGER_SUBTREE, DEFAULT_PLUGINS};
pub use transform::Pipeline;
