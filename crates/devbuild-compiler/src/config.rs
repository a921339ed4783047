/// Build configuration module

use std::collections::BTreeMap;

use devbuild_host::{Resolved, Runtime};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{BuildError, Result};
use crate::plugins::{PluginList, PluginTable, StaticPlugins};

/// Configuration module, relative to the build script's directory.
pub const CONFIG_MODULE: &str = "./transform-config.json";

/// Environment variable overriding [`CONFIG_MODULE`].
pub const CONFIG_ENV_VAR: &str = "DEVBUILD_CONFIG";

/// Settings read from the configuration module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Replaces the default plugin list
    pub plugins: Option<Vec<String>>,
    /// Plugin lists for paths containing the key
    pub overrides: BTreeMap<String, Vec<String>>,
}

/// A configuration module located on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedConfig {
    /// Absolute path of the configuration module, present or not
    pub path: String,
    pub config: BuildConfig,
}

impl BuildConfig {
    /// Locate and load the configuration module named by `specifier`.
    ///
    /// A missing module yields the default configuration; the path is still
    /// reported so it can be listed as a dependency.
    pub fn load(runtime: &mut Runtime, specifier: &str) -> Result<LoadedConfig> {
        let script_dir = runtime.script_dir();
        let path = match runtime.loader().resolve(specifier, &script_dir) {
            Resolved::File(path) => path,
            Resolved::Builtin(builtin) => {
                return Err(BuildError::config(
                    specifier,
                    format!("built-in module '{}' is not a configuration", builtin.name()),
                ));
            }
        };

        if !runtime.fs().exists(&path) {
            tracing::debug!(config = %path, "no configuration module, using defaults");
            return Ok(LoadedConfig {
                path,
                config: BuildConfig::default(),
            });
        }

        let exports = runtime.require(specifier, &script_dir)?;
        let object = exports.as_object().cloned().unwrap_or_default();
        let config = serde_json::from_value(Value::Object(object))
            .map_err(|e| BuildError::config(&path, e.to_string()))?;

        tracing::debug!(config = %path, "loaded configuration module");
        Ok(LoadedConfig { path, config })
    }

    /// Default plugins, with the configured list taking precedence.
    pub fn default_plugins(&self) -> PluginList {
        match &self.plugins {
            Some(plugins) => PluginList::new(plugins.iter().cloned()),
            None => PluginList::defaults(),
        }
    }

    /// The plugin lookup table described by this configuration.
    pub fn plugin_table(&self) -> PluginTable {
        let mut table = PluginTable::new(self.default_plugins());
        for (pattern, plugins) in &self.overrides {
            let list = PluginList::new(plugins.iter().cloned());
            table.add_override(pattern.clone(), Box::new(StaticPlugins(list)));
        }
        table
    }
}
