/// Transform pipeline: one source file in, transformed text out

use devbuild_host::FileSystem;

use crate::engine::{RewriteEngine, TransformEngine};
use crate::error::{BuildError, Result};
use crate::plugins::PluginTable;

/// Reads a source file, picks its plugins and runs the engine over it.
pub struct Pipeline {
    engine: Box<dyn TransformEngine>,
    table: PluginTable,
}

impl Pipeline {
    pub fn new(engine: Box<dyn TransformEngine>, table: PluginTable) -> Self {
        Self { engine, table }
    }

    /// Transform the file at `path`.
    ///
    /// Engine failures are wrapped into [`BuildError::Transform`], which names
    /// the file so that failures in a batch can be told apart.
    pub fn transform(&self, fs: &dyn FileSystem, path: &str) -> Result<String> {
        let plugins = self.table.select(path);
        let source = fs.read_file(path)?;

        let out = self
            .engine
            .transform(&source, &plugins)
            .map_err(|failure| BuildError::transform(path, failure.stack))?;

        Ok(out.code)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(Box::new(RewriteEngine::new()), PluginTable::default())
    }
}
