/// Plugin lists and per-path plugin selection

use std::fmt;

/// Plugins applied to every file without a more specific rule.
pub const DEFAULT_PLUGINS: &[&str] = &["check-delimiters", "normalize-line-endings"];

/// Path fragment identifying sources of the debugger.
pub const DEBUGGER_SUBTREE: &str = "devtools/client/debugger";

/// Plugin that removes `debugger;` statements.
pub const STRIP_DEBUGGER: &str = "strip-debugger-statements";

/// Ordered plugin identifiers handed to the transformation engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginList(Vec<String>);

impl PluginList {
    pub fn new(plugins: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(plugins.into_iter().map(Into::into).collect())
    }

    pub fn defaults() -> Self {
        Self::new(DEFAULT_PLUGINS.iter().copied())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|p| p == id)
    }

    pub fn push(&mut self, id: impl Into<String>) {
        self.0.push(id.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PluginList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Computes the plugin list for a specific source path.
pub trait PluginProvider {
    fn plugins_for(&self, path: &str) -> PluginList;
}

/// Plugin selection for debugger sources.
///
/// Debugger sources get the base list plus `strip-debugger-statements`,
/// except test fixtures, which exercise `debugger;` on purpose.
#[derive(Debug, Clone)]
pub struct DebuggerPlugins {
    base: PluginList,
}

impl DebuggerPlugins {
    pub fn new(base: PluginList) -> Self {
        Self { base }
    }
}

impl PluginProvider for DebuggerPlugins {
    fn plugins_for(&self, path: &str) -> PluginList {
        let mut plugins = self.base.clone();
        let is_fixture = path.contains("/test/") || path.contains("/tests/");
        if !is_fixture && !plugins.contains(STRIP_DEBUGGER) {
            plugins.push(STRIP_DEBUGGER);
        }
        plugins
    }
}

/// A fixed list, whatever the path.
#[derive(Debug, Clone)]
pub struct StaticPlugins(pub PluginList);

impl PluginProvider for StaticPlugins {
    fn plugins_for(&self, _path: &str) -> PluginList {
        self.0.clone()
    }
}

/// Lookup table from path fragments to plugin providers.
pub struct PluginTable {
    default: PluginList,
    /// Rules from configuration, checked before the built-in rules
    overrides: Vec<(String, Box<dyn PluginProvider>)>,
    builtin: Vec<(String, Box<dyn PluginProvider>)>,
}

impl PluginTable {
    /// A table with `default` as fallback and the debugger rule installed.
    pub fn new(default: PluginList) -> Self {
        let debugger: Box<dyn PluginProvider> = Box::new(DebuggerPlugins::new(default.clone()));
        Self {
            default,
            overrides: Vec::new(),
            builtin: vec![(DEBUGGER_SUBTREE.to_string(), debugger)],
        }
    }

    /// Register a provider for paths containing `pattern`, ahead of the built-in rules.
    pub fn add_override(&mut self, pattern: impl Into<String>, provider: Box<dyn PluginProvider>) {
        self.overrides.push((pattern.into(), provider));
    }

    /// Select the plugin list for `path`.
    pub fn select(&self, path: &str) -> PluginList {
        let normalized = path.replace('\\', "/");
        let rule = self
            .overrides
            .iter()
            .chain(self.builtin.iter())
            .find(|(pattern, _)| normalized.contains(pattern.as_str()));

        match rule {
            Some((pattern, provider)) => {
                let plugins = provider.plugins_for(&normalized);
                tracing::debug!(path, %pattern, %plugins, "path-specific plugins");
                plugins
            }
            None => self.default.clone(),
        }
    }
}

impl Default for PluginTable {
    fn default() -> Self {
        Self::new(PluginList::defaults())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_selection() {
        let table = PluginTable::default();
        assert_eq!(table.select("devtools/client/inspector/x.js"), PluginList::defaults());
    }

    #[test]
    fn test_debugger_subtree_uses_provider() {
        let table = PluginTable::default();
        let plugins = table.select("/src/devtools/client/debugger/src/utils/a.js");
        let ids: Vec<&str> = plugins.iter().collect();
        assert_eq!(
            ids,
            vec!["check-delimiters", "normalize-line-endings", "strip-debugger-statements"]
        );
    }

    #[test]
    fn test_debugger_fixtures_keep_statements() {
        let table = PluginTable::default();
        let plugins = table.select("devtools/client/debugger/test/mochitest/examples/a.js");
        assert!(!plugins.contains(STRIP_DEBUGGER));
    }

    #[test]
    fn test_windows_separators_match() {
        let table = PluginTable::default();
        let plugins = table.select(r"C:\src\devtools\client\debugger\a.js");
        assert!(plugins.contains(STRIP_DEBUGGER));
    }

    #[test]
    fn test_overrides_win_over_builtin_rules() {
        let mut table = PluginTable::default();
        table.add_override(
            "debugger/dist",
            Box::new(StaticPlugins(PluginList::new(["strip-bom"]))),
        );
        assert_eq!(
            table.select("devtools/client/debugger/dist/vendors.js"),
            PluginList::new(["strip-bom"])
        );
        assert!(table.select("devtools/client/debugger/src/a.js").contains(STRIP_DEBUGGER));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            PluginList::defaults().to_string(),
            "[check-delimiters, normalize-line-endings]"
        );
    }
}
