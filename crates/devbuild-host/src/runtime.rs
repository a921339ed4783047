//! Host detection and capability wiring.
//!
//! The build logic only talks to a [`Runtime`]. Which filesystem and path
//! providers sit behind it is decided once, at startup, from the host signal.

use std::rc::Rc;
use std::sync::OnceLock;

use crate::fs::{FileSystem, NativeFs};
use crate::module::{Exports, ModuleLoader};
use crate::path::{NativePaths, PathOps, StringPaths};
use crate::Result;

/// Environment variable carrying the host signal.
pub const HOST_ENV_VAR: &str = "DEVBUILD_HOST";

/// The execution environment the build runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    /// Full standard library available.
    Native,
    /// Only low-level OS primitives; everything else is synthesized.
    Embedded,
}

impl HostKind {
    /// Map a raw host signal to a host kind.
    pub fn from_signal(signal: Option<&str>) -> Self {
        match signal.map(str::trim) {
            None | Some("") | Some("native") => HostKind::Native,
            Some("embedded") => HostKind::Embedded,
            Some(other) => {
                tracing::warn!(signal = other, "unrecognized host signal, using native host");
                HostKind::Native
            }
        }
    }

    /// Inspect the host signal. The environment is only read on the first call.
    pub fn detect() -> Self {
        static DETECTED: OnceLock<HostKind> = OnceLock::new();
        *DETECTED.get_or_init(|| {
            let signal = std::env::var(HOST_ENV_VAR).ok();
            let kind = HostKind::from_signal(signal.as_deref());
            tracing::debug!(?kind, "detected host");
            kind
        })
    }
}

/// Invocation arguments: executable, build script, inputs, output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    argv: Vec<String>,
}

impl Invocation {
    pub fn new(
        executable: impl Into<String>,
        script: impl Into<String>,
        paths: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let mut argv = vec![executable.into(), script.into()];
        argv.extend(paths.into_iter().map(Into::into));
        Self { argv }
    }

    /// Build the invocation from the host's own argument vector, where the
    /// first entry is the running binary and everything after it is a path.
    pub fn from_host_args(kind: HostKind, paths: &dyn PathOps, args: Vec<String>) -> Self {
        let mut args = args.into_iter();
        let executable = args.next().unwrap_or_else(|| "devbuild".to_string());
        let script = match kind {
            HostKind::Native => std::env::current_exe()
                .map(|exe| exe.to_string_lossy().into_owned())
                .unwrap_or_else(|_| paths.resolve(&[executable.as_str()])),
            HostKind::Embedded => embedded_script(paths, &executable),
        };
        Self::new(executable, script, args)
    }

    pub fn executable(&self) -> &str {
        &self.argv[0]
    }

    pub fn script(&self) -> &str {
        &self.argv[1]
    }

    /// The last argument, if any path follows the script.
    pub fn output_dir(&self) -> Option<&str> {
        if self.argv.len() > 2 {
            self.argv.last().map(String::as_str)
        } else {
            None
        }
    }

    /// Every argument between the script and the output directory.
    pub fn inputs(&self) -> &[String] {
        if self.argv.len() > 2 {
            &self.argv[2..self.argv.len() - 1]
        } else {
            &[]
        }
    }
}

/// The host capabilities handed to the build.
pub struct Runtime {
    kind: HostKind,
    fs: Rc<dyn FileSystem>,
    paths: Rc<dyn PathOps>,
    loader: ModuleLoader,
    invocation: Invocation,
}

impl Runtime {
    /// Detect the host and install its providers.
    pub fn detect(args: Vec<String>) -> Self {
        Self::install(HostKind::detect(), args)
    }

    /// Install the providers for `kind`, synthesizing the invocation from `args`.
    pub fn install(kind: HostKind, args: Vec<String>) -> Self {
        let paths = paths_for(kind);
        let invocation = Invocation::from_host_args(kind, paths.as_ref(), args);
        Self::assemble(kind, paths, invocation)
    }

    /// Install the providers for `kind` with an explicit invocation.
    pub fn with_invocation(kind: HostKind, invocation: Invocation) -> Self {
        Self::assemble(kind, paths_for(kind), invocation)
    }

    fn assemble(kind: HostKind, paths: Rc<dyn PathOps>, invocation: Invocation) -> Self {
        let fs = fs_for(kind);
        let loader = ModuleLoader::new(Rc::clone(&fs), Rc::clone(&paths));
        Self {
            kind,
            fs,
            paths,
            loader,
            invocation,
        }
    }

    pub fn kind(&self) -> HostKind {
        self.kind
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    pub fn paths(&self) -> &dyn PathOps {
        self.paths.as_ref()
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    /// Directory containing the build script.
    pub fn script_dir(&self) -> String {
        self.paths.dirname(self.invocation.script())
    }

    /// Load a module, resolving relative specifiers against `requesting_dir`.
    pub fn require(&mut self, specifier: &str, requesting_dir: &str) -> Result<Rc<Exports>> {
        self.loader.load(specifier, requesting_dir)
    }

    pub fn loader(&self) -> &ModuleLoader {
        &self.loader
    }
}

/// A bare `argv[0]` was found through `PATH`, so it says nothing about the
/// binary's location. Ask the kernel instead.
fn embedded_script(paths: &dyn PathOps, executable: &str) -> String {
    if executable.contains('/') {
        return paths.resolve(&[executable]);
    }
    running_executable().unwrap_or_else(|| paths.resolve(&[executable]))
}

#[cfg(unix)]
fn running_executable() -> Option<String> {
    match rustix::fs::readlinkat(rustix::fs::CWD, "/proc/self/exe", Vec::new()) {
        Ok(target) => Some(target.to_string_lossy().into_owned()),
        Err(e) => {
            tracing::debug!(error = %e, "cannot read /proc/self/exe");
            None
        }
    }
}

#[cfg(not(unix))]
fn running_executable() -> Option<String> {
    None
}

fn paths_for(kind: HostKind) -> Rc<dyn PathOps> {
    match kind {
        HostKind::Native => Rc::new(NativePaths),
        HostKind::Embedded => Rc::new(StringPaths::new(working_dir())),
    }
}

#[cfg(unix)]
fn fs_for(kind: HostKind) -> Rc<dyn FileSystem> {
    match kind {
        HostKind::Native => Rc::new(NativeFs),
        HostKind::Embedded => Rc::new(crate::fs::EmbeddedFs),
    }
}

#[cfg(not(unix))]
fn fs_for(kind: HostKind) -> Rc<dyn FileSystem> {
    if kind == HostKind::Embedded {
        tracing::warn!("embedded filesystem unavailable on this platform, using native adapter");
    }
    Rc::new(NativeFs)
}

#[cfg(unix)]
fn working_dir() -> String {
    match rustix::process::getcwd(Vec::new()) {
        Ok(cwd) => cwd.to_string_lossy().into_owned(),
        Err(e) => {
            tracing::warn!(error = %e, "getcwd failed, anchoring paths at /");
            "/".to_string()
        }
    }
}

#[cfg(not(unix))]
fn working_dir() -> String {
    std::env::current_dir()
        .map(|dir| dir.to_string_lossy().replace('\\', "/"))
        .unwrap_or_else(|_| "/".to_string())
}
