//! Path utilities.
//!
//! Paths are plain strings. Two implementations share the `PathOps` trait:
//! `NativePaths` goes through `std::path`, `StringPaths` only uses string
//! operations and is what the embedded host gets.

use std::path::{Component, Path, PathBuf};

/// Join, split and resolve operations over string paths.
pub trait PathOps {
    /// Join the given parts with a separator.
    fn join(&self, parts: &[&str]) -> String;

    /// Everything before the last segment. `.` when there is no directory part.
    fn dirname(&self, path: &str) -> String;

    /// The last segment of the path.
    fn basename(&self, path: &str) -> String;

    /// Resolve the segments, left to right, into an absolute normalized path.
    /// An absolute segment discards everything before it.
    fn resolve(&self, segments: &[&str]) -> String;

    fn is_absolute(&self, path: &str) -> bool;
}

/// String-only path rules with `/` as the separator.
#[derive(Debug, Clone)]
pub struct StringPaths {
    /// Anchor for relative results of `resolve`.
    cwd: String,
}

impl StringPaths {
    pub fn new(cwd: impl Into<String>) -> Self {
        let cwd = cwd.into();
        let cwd = if cwd.starts_with('/') { cwd } else { "/".to_string() };
        Self { cwd }
    }

    pub fn cwd(&self) -> &str {
        &self.cwd
    }
}

/// Strip trailing separators, keeping a lone root.
fn trim_trailing(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/"
    } else {
        trimmed
    }
}

fn collapse_separators(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut last_was_sep = false;
    for ch in path.chars() {
        if ch == '/' {
            if last_was_sep {
                continue;
            }
            last_was_sep = true;
        } else {
            last_was_sep = false;
        }
        out.push(ch);
    }
    out
}

/// Drop `.` segments and fold `..` segments of an absolute path.
fn normalize_absolute(path: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            other => stack.push(other),
        }
    }
    format!("/{}", stack.join("/"))
}

impl PathOps for StringPaths {
    fn join(&self, parts: &[&str]) -> String {
        let joined = parts
            .iter()
            .filter(|p| !p.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("/");
        if joined.is_empty() {
            return ".".to_string();
        }
        collapse_separators(&joined)
    }

    fn dirname(&self, path: &str) -> String {
        let path = trim_trailing(path);
        if path == "/" {
            return "/".to_string();
        }
        match path.rfind('/') {
            None => ".".to_string(),
            Some(0) => "/".to_string(),
            Some(idx) => trim_trailing(&path[..idx]).to_string(),
        }
    }

    fn basename(&self, path: &str) -> String {
        let path = trim_trailing(path);
        if path == "/" {
            return String::new();
        }
        match path.rfind('/') {
            Some(idx) => path[idx + 1..].to_string(),
            None => path.to_string(),
        }
    }

    fn resolve(&self, segments: &[&str]) -> String {
        let mut resolved = String::new();
        for segment in segments.iter().copied().filter(|s| !s.is_empty()) {
            if segment.starts_with('/') || resolved.is_empty() {
                resolved = segment.to_string();
            } else {
                resolved = self.join(&[resolved.as_str(), segment]);
            }
        }

        if !resolved.starts_with('/') {
            resolved = self.join(&[self.cwd.as_str(), resolved.as_str()]);
        }
        normalize_absolute(&resolved)
    }

    fn is_absolute(&self, path: &str) -> bool {
        path.starts_with('/')
    }
}

/// Path operations backed by `std::path`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativePaths;

fn lossy(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn normalize_components(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

impl PathOps for NativePaths {
    fn join(&self, parts: &[&str]) -> String {
        let mut buf = PathBuf::new();
        for part in parts.iter().copied().filter(|p| !p.is_empty()) {
            buf.push(part);
        }
        if buf.as_os_str().is_empty() {
            return ".".to_string();
        }
        lossy(&buf)
    }

    fn dirname(&self, path: &str) -> String {
        match Path::new(path).parent() {
            Some(parent) if parent.as_os_str().is_empty() => ".".to_string(),
            Some(parent) => lossy(parent),
            None if path.is_empty() => ".".to_string(),
            None => path.to_string(),
        }
    }

    fn basename(&self, path: &str) -> String {
        Path::new(path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn resolve(&self, segments: &[&str]) -> String {
        let mut buf = PathBuf::new();
        for segment in segments.iter().copied().filter(|s| !s.is_empty()) {
            buf.push(segment);
        }
        let base = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        lossy(&normalize_components(&base.join(buf)))
    }

    fn is_absolute(&self, path: &str) -> bool {
        Path::new(path).is_absolute()
    }
}
