use std::{fs, path::Path};

use tempfile::{TempDir, tempdir};

use lintmap::LintmapError;
use lintmap_cli::{Args, run};

fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

/// A small project: one module with an inheritance and a composition, one
/// module with a malformed class header and one excluded directory.
fn sample_project() -> TempDir {
    let dir = tempdir().expect("Failed to create temp directory");
    write(
        dir.path(),
        "zoo/animals.py",
        "class Animal:\n    pass\n\n\nclass Tail:\n    pass\n\n\nclass Dog(Animal):\n    def __init__(self):\n        self.tail = Tail()\n",
    );
    write(dir.path(), "zoo/broken.py", "class Broken(Animal)\n    pass\n");
    write(dir.path(), "zoo/build/generated.py", "class Generated:\n    pass\n");
    write(
        dir.path(),
        "lint.txt",
        "************* Module zoo.animals\n\
         zoo/animals.py:9: [C0115(missing-class-docstring), Dog] Missing class docstring\n\
         zoo/animals.py:1: [R0903(too-few-public-methods), Animal] Too few public methods\n\
         zoo/animals.py:1: [C0114(missing-module-docstring), ] Missing module docstring\n",
    );
    dir
}

fn args(dir: &TempDir) -> Args {
    Args {
        projects: vec![dir.path().join("zoo").to_string_lossy().to_string()],
        exclude: vec!["build".to_string()],
        lint: Some(dir.path().join("lint.txt").to_string_lossy().to_string()),
        ignored: None,
        output: dir.path().join("out.txt").to_string_lossy().to_string(),
        config: None,
        timeout: 60,
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_smoke_test_sample_project() {
    let dir = sample_project();
    let args = args(&dir);

    run(&args).expect("Sample project should render");

    let report = fs::read_to_string(&args.output).unwrap();
    assert!(report.contains("classes: 3"), "{report}");
    assert!(report.contains("connectors: 2"), "{report}");
    assert!(report.contains("Animal -> Dog head=empty tail=none"), "{report}");
    assert!(report.contains("Dog -> Tail head=diamond tail=none"), "{report}");
    assert!(report.contains("extraction errors: 1"), "{report}");
    assert!(
        report.contains("lint: attached=2 filtered=0 ignored=0 unresolved=1 module_errors=1"),
        "{report}"
    );
    assert!(!report.contains("Generated"), "{report}");
}

#[test]
fn e2e_config_and_ignored_findings_filter_lint() {
    let dir = sample_project();
    write(dir.path(), "config.toml", "[lint]\ndisabled_categories = [\"refactor\"]\n");
    write(
        dir.path(),
        "ignored.toml",
        "[[files.\"zoo/animals.py\"]]\ncode = \"C0115\"\nobject = \"Dog\"\n",
    );

    let mut args = args(&dir);
    args.config = Some(dir.path().join("config.toml").to_string_lossy().to_string());
    args.ignored = Some(dir.path().join("ignored.toml").to_string_lossy().to_string());

    run(&args).expect("Sample project should render");

    let report = fs::read_to_string(&args.output).unwrap();
    assert!(report.contains("lint: attached=0 filtered=1 ignored=1 unresolved=1"), "{report}");
}

#[test]
fn e2e_missing_project_fails() {
    let dir = tempdir().unwrap();
    let mut args = args(&dir);
    args.projects = vec![dir.path().join("absent").to_string_lossy().to_string()];
    args.lint = None;

    let result = run(&args);
    assert!(matches!(result, Err(LintmapError::Extraction(_))));
    assert!(!dir.path().join("out.txt").exists());
}
