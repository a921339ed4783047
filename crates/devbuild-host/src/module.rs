/// Module loading with a per-loader cache
///
/// This module handles:
/// - Resolving specifiers to built-in modules or absolute file paths
/// - Evaluating declarative module documents into export objects
/// - Caching exports so each resolved path is evaluated at most once
/// - Detecting circular `extends` chains

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::error::Error;
use crate::fs::FileSystem;
use crate::path::PathOps;
use crate::Result;

/// Suffix appended to file specifiers that do not already carry it.
pub const MODULE_SUFFIX: &str = ".json";

/// Key naming the module whose exports seed the current one.
pub const EXTENDS_KEY: &str = "extends";

/// Modules provided by the host itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Fs,
    Path,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "fs" => Some(Builtin::Fs),
            "path" => Some(Builtin::Path),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Fs => "fs",
            Builtin::Path => "path",
        }
    }
}

/// Outcome of resolving a specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Builtin(Builtin),
    /// Absolute path of a module file.
    File(String),
}

/// The value a module exports.
#[derive(Debug, Clone, PartialEq)]
pub enum Exports {
    /// Marker for a host module; the actual capability lives on the runtime.
    Builtin(Builtin),
    Object(Map<String, Value>),
}

impl Exports {
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            Exports::Object(map) => Some(map),
            Exports::Builtin(_) => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }
}

/// Loads modules through the host filesystem and caches their exports.
pub struct ModuleLoader {
    fs: Rc<dyn FileSystem>,
    paths: Rc<dyn PathOps>,
    /// Evaluated modules by resolved absolute path
    cache: HashMap<String, Rc<Exports>>,
    /// Fixed export objects for the built-in modules
    builtins: HashMap<Builtin, Rc<Exports>>,
    /// Modules currently being evaluated, outermost first (for cycle detection)
    loading: Vec<String>,
}

impl ModuleLoader {
    pub fn new(fs: Rc<dyn FileSystem>, paths: Rc<dyn PathOps>) -> Self {
        let builtins = [Builtin::Fs, Builtin::Path]
            .into_iter()
            .map(|b| (b, Rc::new(Exports::Builtin(b))))
            .collect();
        Self {
            fs,
            paths,
            cache: HashMap::new(),
            builtins,
            loading: Vec::new(),
        }
    }

    /// Resolve a specifier relative to the requesting module's directory.
    pub fn resolve(&self, specifier: &str, requesting_dir: &str) -> Resolved {
        if let Some(builtin) = Builtin::from_name(specifier) {
            return Resolved::Builtin(builtin);
        }

        let file = if specifier.ends_with(MODULE_SUFFIX) {
            specifier.to_string()
        } else {
            format!("{specifier}{MODULE_SUFFIX}")
        };

        if self.paths.is_absolute(&file) {
            Resolved::File(self.paths.resolve(&[file.as_str()]))
        } else {
            Resolved::File(self.paths.resolve(&[requesting_dir, file.as_str()]))
        }
    }

    /// Load a module, evaluating it on first use.
    pub fn load(&mut self, specifier: &str, requesting_dir: &str) -> Result<Rc<Exports>> {
        let path = match self.resolve(specifier, requesting_dir) {
            Resolved::Builtin(builtin) => return Ok(Rc::clone(&self.builtins[&builtin])),
            Resolved::File(path) => path,
        };

        if let Some(exports) = self.cache.get(&path) {
            tracing::trace!(module = %path, "module cache hit");
            return Ok(Rc::clone(exports));
        }

        if self.loading.contains(&path) {
            return Err(self.load_error(&path, "circular module dependency"));
        }

        tracing::debug!(module = %path, "loading module");
        self.loading.push(path.clone());
        let evaluated = self.evaluate(&path);
        self.loading.pop();

        let exports = Rc::new(evaluated?);
        self.cache.insert(path, Rc::clone(&exports));
        Ok(exports)
    }

    /// Whether a resolved path has already been evaluated.
    pub fn is_cached(&self, path: &str) -> bool {
        self.cache.contains_key(path)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Evaluate the module at `path` into a fresh exports container.
    fn evaluate(&mut self, path: &str) -> Result<Exports> {
        let source = self
            .fs
            .read_file(path)
            .map_err(|e| self.load_error(path, e.to_string()))?;

        let document: Value = serde_json::from_str(&source)
            .map_err(|e| self.load_error(path, format!("SyntaxError: {e}")))?;

        let Value::Object(entries) = document else {
            return Err(self.load_error(path, "module must export an object"));
        };

        let mut exports = Map::new();

        if let Some(base) = entries.get(EXTENDS_KEY) {
            let Some(base) = base.as_str() else {
                return Err(self.load_error(path, "`extends` must be a module specifier string"));
            };
            let module_dir = self.paths.dirname(path);
            let inherited = self.load(base, &module_dir)?;
            let Some(inherited) = inherited.as_object() else {
                let message = format!("cannot extend built-in module '{base}'");
                return Err(self.load_error(path, message));
            };
            exports.extend(inherited.clone());
        }

        exports.extend(entries.into_iter().filter(|(key, _)| key != EXTENDS_KEY));
        Ok(Exports::Object(exports))
    }

    fn load_error(&self, path: &str, message: impl Into<String>) -> Error {
        Error::ModuleLoad {
            path: path.to_string(),
            message: message.into(),
            stack: self.stack(),
        }
    }

    /// Modules currently being loaded, innermost first.
    fn stack(&self) -> String {
        self.loading
            .iter()
            .rev()
            .map(|module| format!("    at {module}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::NativeFs;
    use crate::path::NativePaths;
    use tempfile::TempDir;

    fn loader() -> ModuleLoader {
        ModuleLoader::new(Rc::new(NativeFs), Rc::new(NativePaths))
    }

    fn dir_str(dir: &TempDir) -> String {
        dir.path().to_string_lossy().into_owned()
    }

    #[test]
    fn test_resolve_builtin() {
        let loader = loader();
        assert_eq!(loader.resolve("fs", "/x"), Resolved::Builtin(Builtin::Fs));
        assert_eq!(loader.resolve("path", "/x"), Resolved::Builtin(Builtin::Path));
    }

    #[test]
    fn test_resolve_appends_suffix_and_joins_dir() {
        let loader = loader();
        assert_eq!(
            loader.resolve("./config", "/proj/tools"),
            Resolved::File("/proj/tools/config.json".to_string())
        );
        assert_eq!(
            loader.resolve("../base.json", "/proj/tools"),
            Resolved::File("/proj/base.json".to_string())
        );
        assert_eq!(
            loader.resolve("/etc/devbuild", "/proj"),
            Resolved::File("/etc/devbuild.json".to_string())
        );
    }

    #[test]
    fn test_builtin_exports_are_fixed() {
        let mut loader = loader();
        let a = loader.load("fs", "/").unwrap();
        let b = loader.load("fs", "/").unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(*a, Exports::Builtin(Builtin::Fs));
        assert_eq!(loader.cached_len(), 0);
    }

    #[test]
    fn test_load_evaluates_once() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("settings.json");
        std::fs::write(&file, r#"{"plugins": ["strip-bom"]}"#).unwrap();

        let mut loader = loader();
        let first = loader.load("./settings", &dir_str(&dir)).unwrap();

        // Later edits are not observed: the cached export is returned.
        std::fs::write(&file, r#"{"plugins": []}"#).unwrap();
        let second = loader.load("./settings.json", &dir_str(&dir)).unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(second.get("plugins").unwrap(), &serde_json::json!(["strip-bom"]));
        assert_eq!(loader.cached_len(), 1);
    }

    #[test]
    fn test_extends_seeds_exports() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("base.json"), r#"{"a": 1, "b": 2}"#).unwrap();
        std::fs::write(dir.path().join("child.json"), r#"{"extends": "./base", "b": 3}"#).unwrap();

        let mut loader = loader();
        let child = loader.load("./child", &dir_str(&dir)).unwrap();
        let map = child.as_object().unwrap();
        assert_eq!(map.get("a"), Some(&serde_json::json!(1)));
        assert_eq!(map.get("b"), Some(&serde_json::json!(3)));
        assert!(!map.contains_key("extends"));

        let base_path = dir.path().join("base.json").to_string_lossy().into_owned();
        assert!(loader.is_cached(&base_path));
    }

    #[test]
    fn test_syntax_error_is_module_load_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ nope").unwrap();

        let mut loader = loader();
        let err = loader.load("./broken", &dir_str(&dir)).unwrap_err();
        match err {
            Error::ModuleLoad { path, message, stack } => {
                assert!(path.ends_with("broken.json"));
                assert!(message.starts_with("SyntaxError"));
                assert!(stack.contains("broken.json"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(loader.cached_len(), 0);
    }

    #[test]
    fn test_missing_module_is_module_load_error() {
        let dir = TempDir::new().unwrap();
        let mut loader = loader();
        let err = loader.load("./absent", &dir_str(&dir)).unwrap_err();
        assert!(matches!(err, Error::ModuleLoad { .. }));
    }

    #[test]
    fn test_non_object_module_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("list.json"), "[1, 2]").unwrap();
        let mut loader = loader();
        assert!(loader.load("./list", &dir_str(&dir)).is_err());
    }

    #[test]
    fn test_circular_extends_detected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.json"), r#"{"extends": "./b"}"#).unwrap();
        std::fs::write(dir.path().join("b.json"), r#"{"extends": "./a"}"#).unwrap();

        let mut loader = loader();
        let err = loader.load("./a", &dir_str(&dir)).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("circular"), "{text}");
        assert_eq!(loader.cached_len(), 0);
    }

    #[test]
    fn test_extending_builtin_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("x.json"), r#"{"extends": "fs"}"#).unwrap();
        let mut loader = loader();
        let err = loader.load("./x", &dir_str(&dir)).unwrap_err();
        assert!(err.to_string().contains("built-in"));
    }
}
