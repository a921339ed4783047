/// Integration tests for the build driver

use std::path::Path;

use devbuild_compiler::{
    BuildError, BuildOptions, Builder, EngineFailure, PluginList, TransformEngine, Transformed,
};
use devbuild_host::{HostKind, Invocation, Runtime};
use tempfile::TempDir;

const SCRIPT_NAME: &str = "devbuild";

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Build `files` (relative to `dir`) into `out` on the given host.
fn build_on(
    kind: HostKind,
    dir: &TempDir,
    files: &[&str],
    out: &str,
) -> devbuild_compiler::Result<devbuild_compiler::BuildReport> {
    let script = path_str(&dir.path().join(SCRIPT_NAME));
    let mut paths: Vec<String> = files.iter().map(|f| path_str(&dir.path().join(f))).collect();
    paths.push(path_str(&dir.path().join(out)));

    let invocation = Invocation::new(SCRIPT_NAME, script, paths);
    let options = BuildOptions::from_invocation(&invocation)?;
    Builder::new(Runtime::with_invocation(kind, invocation), options).build()
}

fn write(dir: &TempDir, rel: &str, contents: &str) {
    let path = dir.path().join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

#[test]
fn test_two_files_into_new_directory() {
    for kind in [HostKind::Native, HostKind::Embedded] {
        let dir = TempDir::new().unwrap();
        write(&dir, "src/a.js", "const a = [1, 2];\r\n");
        write(&dir, "src/b.js", "function b() { return 1; }\n");

        let report = build_on(kind, &dir, &["src/a.js", "src/b.js"], "build/gen/out").unwrap();

        let out = dir.path().join("build/gen/out");
        assert!(out.is_dir());
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 2);
        assert_eq!(
            std::fs::read_to_string(out.join("a.js")).unwrap(),
            "const a = [1, 2];\n"
        );
        assert_eq!(
            std::fs::read_to_string(out.join("b.js")).unwrap(),
            "function b() { return 1; }\n"
        );

        assert_eq!(report.dependencies.len(), 4);
        assert_eq!(report.dependencies[0], path_str(&dir.path().join(SCRIPT_NAME)));
        assert!(report.dependencies[1].ends_with("transform-config.json"));
        assert!(report.dependencies[2].ends_with("src/a.js"));
        assert!(report.dependencies[3].ends_with("src/b.js"));
        assert_eq!(report.outputs.len(), 2);

        let rendered = report.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|line| line.starts_with("dep:")));
    }
}

#[test]
fn test_no_inputs_still_creates_directory() {
    let dir = TempDir::new().unwrap();
    let report = build_on(HostKind::Native, &dir, &[], "out").unwrap();
    assert!(dir.path().join("out").is_dir());
    assert_eq!(report.dependencies.len(), 2);
    assert!(report.outputs.is_empty());
}

#[test]
fn test_existing_output_directory_is_reused() {
    let dir = TempDir::new().unwrap();
    write(&dir, "out/keep.txt", "kept");
    write(&dir, "a.js", "a();\n");

    build_on(HostKind::Native, &dir, &["a.js"], "out").unwrap();
    assert_eq!(std::fs::read_to_string(dir.path().join("out/keep.txt")).unwrap(), "kept");
    assert!(dir.path().join("out/a.js").is_file());
}

#[test]
fn test_first_failure_aborts_without_rollback() {
    for kind in [HostKind::Native, HostKind::Embedded] {
        let dir = TempDir::new().unwrap();
        write(&dir, "good.js", "ok();\n");
        write(&dir, "bad.js", "broken(;\n}\n");
        write(&dir, "later.js", "later();\n");

        let err = build_on(kind, &dir, &["good.js", "bad.js", "later.js"], "out").unwrap_err();

        match &err {
            BuildError::Transform { path, .. } => assert!(path.ends_with("bad.js")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("bad.js"));

        let out = dir.path().join("out");
        assert!(out.join("good.js").is_file());
        assert!(!out.join("bad.js").exists());
        assert!(!out.join("later.js").exists());
    }
}

#[test]
fn test_missing_input_is_read_error() {
    let dir = TempDir::new().unwrap();
    let err = build_on(HostKind::Embedded, &dir, &["nope.js"], "out").unwrap_err();
    assert!(matches!(err, BuildError::Read { .. }), "got {err:?}");
}

#[test]
fn test_output_directory_blocked_by_file() {
    let dir = TempDir::new().unwrap();
    write(&dir, "blocker", "file");
    write(&dir, "a.js", "a();\n");
    let err = build_on(HostKind::Native, &dir, &["a.js"], "blocker/out").unwrap_err();
    assert!(matches!(err, BuildError::DirectoryCreate { .. }), "got {err:?}");
}

#[test]
fn test_same_base_name_last_write_wins() {
    let dir = TempDir::new().unwrap();
    write(&dir, "one/index.js", "first();\n");
    write(&dir, "two/index.js", "second();\n");

    let report =
        build_on(HostKind::Native, &dir, &["one/index.js", "two/index.js"], "out").unwrap();
    assert_eq!(report.dependencies.len(), 4);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("out/index.js")).unwrap(),
        "second();\n"
    );
}

#[test]
fn test_debugger_sources_lose_debugger_statements() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "devtools/client/debugger/src/pause.js",
        "function pause() {\n  debugger;\n}\n",
    );
    write(&dir, "devtools/client/shared/keep.js", "debugger;\n");

    build_on(
        HostKind::Native,
        &dir,
        &[
            "devtools/client/debugger/src/pause.js",
            "devtools/client/shared/keep.js",
        ],
        "out",
    )
    .unwrap();

    assert_eq!(
        std::fs::read_to_string(dir.path().join("out/pause.js")).unwrap(),
        "function pause() {\n\n}\n"
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("out/keep.js")).unwrap(),
        "debugger;\n"
    );
}

#[test]
fn test_configuration_module_changes_default_plugins() {
    let dir = TempDir::new().unwrap();
    write(&dir, "transform-config.json", r#"{"plugins": ["trim-trailing-whitespace"]}"#);
    write(&dir, "a.js", "a();   \r\n");

    let report = build_on(HostKind::Embedded, &dir, &["a.js"], "out").unwrap();
    assert_eq!(
        report.dependencies[1],
        path_str(&dir.path().join("transform-config.json"))
    );
    // No line ending normalization with the configured list.
    assert_eq!(
        std::fs::read_to_string(dir.path().join("out/a.js")).unwrap(),
        "a();   \r\n"
    );
}

/// Prefixes every file with a banner.
struct BannerEngine;

impl TransformEngine for BannerEngine {
    fn transform(&self, source: &str, plugins: &PluginList) -> Result<Transformed, EngineFailure> {
        Ok(Transformed {
            code: format!("// plugins: {plugins}\n{source}"),
        })
    }
}

#[test]
fn test_custom_engine() {
    let dir = TempDir::new().unwrap();
    write(&dir, "a.js", "a();\n");

    let script = path_str(&dir.path().join(SCRIPT_NAME));
    let invocation = Invocation::new(
        SCRIPT_NAME,
        script,
        [path_str(&dir.path().join("a.js")), path_str(&dir.path().join("out"))],
    );
    let options = BuildOptions::from_invocation(&invocation).unwrap();
    let runtime = Runtime::with_invocation(HostKind::Native, invocation);

    Builder::with_engine(runtime, options, Box::new(BannerEngine))
        .build()
        .unwrap();

    assert_eq!(
        std::fs::read_to_string(dir.path().join("out/a.js")).unwrap(),
        "// plugins: [check-delimiters, normalize-line-endings]\na();\n"
    );
}
