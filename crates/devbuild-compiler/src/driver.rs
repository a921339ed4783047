/// Build driver that orchestrates the whole build

use std::collections::HashMap;

use devbuild_host::{Invocation, Runtime};

use crate::config::{BuildConfig, CONFIG_MODULE};
use crate::engine::{RewriteEngine, TransformEngine};
use crate::error::{BuildError, Result};
use crate::materialize::ensure_dir;
use crate::transform::Pipeline;

/// Prefix of every line of the dependency report.
pub const DEP_PREFIX: &str = "dep:";

/// Options for a build
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Source files, in invocation order
    pub inputs: Vec<String>,
    /// Directory receiving one output per input
    pub output_dir: String,
    /// Specifier of the configuration module
    pub config: String,
}

impl BuildOptions {
    pub fn new(output_dir: impl Into<String>) -> Self {
        Self {
            inputs: Vec::new(),
            output_dir: output_dir.into(),
            config: CONFIG_MODULE.to_string(),
        }
    }

    /// Read the inputs and output directory from invocation arguments.
    pub fn from_invocation(invocation: &Invocation) -> Result<Self> {
        let output_dir = invocation
            .output_dir()
            .ok_or_else(|| BuildError::usage("devbuild <source-file>... <output-dir>"))?;
        Ok(Self::new(output_dir).inputs(invocation.inputs().iter().cloned()))
    }

    pub fn inputs(mut self, inputs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.inputs = inputs.into_iter().map(Into::into).collect();
        self
    }

    pub fn config(mut self, specifier: impl Into<String>) -> Self {
        self.config = specifier.into();
        self
    }
}

/// Result of a successful build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Build script, configuration module, then every input
    pub dependencies: Vec<String>,
    /// Written output files, in input order
    pub outputs: Vec<String>,
}

impl BuildReport {
    /// One `dep:<path>` line per dependency.
    pub fn render(&self) -> String {
        self.dependencies
            .iter()
            .map(|dep| format!("{DEP_PREFIX}{dep}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The devbuild build driver
pub struct Builder {
    runtime: Runtime,
    options: BuildOptions,
    engine: Box<dyn TransformEngine>,
}

impl Builder {
    /// Create a builder using the built-in engine.
    pub fn new(runtime: Runtime, options: BuildOptions) -> Self {
        Self::with_engine(runtime, options, Box::new(RewriteEngine::new()))
    }

    pub fn with_engine(
        runtime: Runtime,
        options: BuildOptions,
        engine: Box<dyn TransformEngine>,
    ) -> Self {
        Self {
            runtime,
            options,
            engine,
        }
    }

    /// Run the build.
    ///
    /// Stops at the first failing input; outputs written before it stay on disk.
    pub fn build(self) -> Result<BuildReport> {
        let Builder {
            mut runtime,
            options,
            engine,
        } = self;

        ensure_dir(runtime.fs(), runtime.paths(), &options.output_dir)?;

        let loaded = BuildConfig::load(&mut runtime, &options.config)?;
        let pipeline = Pipeline::new(engine, loaded.config.plugin_table());

        let mut dependencies = vec![runtime.invocation().script().to_string(), loaded.path];
        let mut outputs = Vec::with_capacity(options.inputs.len());
        let mut written_by: HashMap<String, &str> = HashMap::new();

        for input in &options.inputs {
            let code = pipeline.transform(runtime.fs(), input)?;

            let name = runtime.paths().basename(input);
            let out_path = runtime.paths().join(&[options.output_dir.as_str(), name.as_str()]);
            if let Some(previous) = written_by.insert(out_path.clone(), input) {
                tracing::warn!(
                    output = %out_path,
                    previous,
                    input = input.as_str(),
                    "inputs share a base name, earlier output is overwritten"
                );
            }

            runtime.fs().write_file(&out_path, &code)?;
            tracing::info!(input = input.as_str(), output = %out_path, "compiled");

            outputs.push(out_path);
            dependencies.push(input.clone());
        }

        Ok(BuildReport {
            dependencies,
            outputs,
        })
    }
}
