//! Lint reporting onto the diagram.
//!
//! A lint pass clears every error marker, attaches each reported finding to
//! the class it names, then re-renders the boxes so their markers show.
//!
//! ```text
//! LintPass::begin  ->  report(finding)*  ->  finish(canvas)
//! ```
//!
//! Modules that could not be scanned travel the same way: each one is
//! reported as a text message and returned with the pass summary.
//!
//! Findings are dropped before they reach a node when their category or
//! code is disabled in [`LintConfig`], or when the user chose to ignore them
//! (see [`IgnoredFindings`]).

use std::{
    collections::{BTreeMap, BTreeSet},
    fs, io,
    path::{Path, PathBuf},
};

use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use lintmap_core::semantic::ExtractionError;
use lintmap_parser::Finding;

use crate::{
    LintmapError,
    canvas::Canvas,
    config::LintConfig,
    registry::{ErrorMarker, Registry},
};

/// A finding the user asked not to see again.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub struct IgnoredFinding {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
}

/// Per-file set of ignored `(code, object)` pairs.
///
/// Persisted as TOML:
///
/// ```toml
/// [[files."pkg/shapes.py"]]
/// code = "C0111"
/// object = "Shape"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct IgnoredFindings {
    #[serde(default)]
    files: BTreeMap<PathBuf, BTreeSet<IgnoredFinding>>,
}

impl IgnoredFindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the store from `path`; a missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, LintmapError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path:? = path; "No ignored findings file");
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };
        let store: Self = toml::from_str(&content)
            .map_err(|err| LintmapError::Config(format!("{}: {err}", path.display())))?;
        info!(path:? = path, files = store.files.len(); "Loaded ignored findings");
        Ok(store)
    }

    pub fn save(&self, path: &Path) -> Result<(), LintmapError> {
        let content = toml::to_string(self)
            .map_err(|err| LintmapError::Config(format!("{}: {err}", path.display())))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Ignores `code` on `object` in `filepath`; returns `false` if it
    /// already was.
    pub fn ignore(
        &mut self,
        filepath: impl Into<PathBuf>,
        code: impl Into<String>,
        object: Option<String>,
    ) -> bool {
        self.files.entry(filepath.into()).or_default().insert(IgnoredFinding {
            code: code.into(),
            object,
        })
    }

    pub fn unignore(&mut self, filepath: &Path, code: &str, object: Option<&str>) -> bool {
        let Some(entries) = self.files.get_mut(filepath) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| !(entry.code == code && entry.object.as_deref() == object));
        let removed = entries.len() != before;
        if entries.is_empty() {
            self.files.remove(filepath);
        }
        removed
    }

    pub fn is_ignored(&self, finding: &Finding) -> bool {
        self.files.get(&finding.filepath).is_some_and(|entries| {
            entries.iter().any(|entry| {
                entry.code == finding.code && entry.object.as_deref() == finding.object.as_deref()
            })
        })
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// What became of a reported finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStatus {
    /// Attached to a class node.
    Attached,
    /// Category or code disabled by configuration.
    Filtered,
    Ignored,
    /// No class on the diagram owns the finding.
    Unresolved,
}

/// Counts of a finished lint pass, plus the messages of modules that
/// failed to scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintSummary {
    pub attached: usize,
    pub filtered: usize,
    pub ignored: usize,
    pub unresolved: usize,
    pub module_errors: Vec<String>,
}

impl LintSummary {
    fn record(&mut self, status: ReportStatus) {
        match status {
            ReportStatus::Attached => self.attached += 1,
            ReportStatus::Filtered => self.filtered += 1,
            ReportStatus::Ignored => self.ignored += 1,
            ReportStatus::Unresolved => self.unresolved += 1,
        }
    }
}

/// One round of lint results applied to the registry.
#[derive(Debug)]
pub struct LintPass<'a> {
    registry: &'a Registry,
    config: &'a LintConfig,
    ignored: &'a IgnoredFindings,
    summary: LintSummary,
}

impl<'a> LintPass<'a> {
    /// Starts a pass, clearing every marker in `registry`.
    pub fn begin(registry: &'a Registry, config: &'a LintConfig, ignored: &'a IgnoredFindings) -> Self {
        registry.clear_all_errors();
        Self {
            registry,
            config,
            ignored,
            summary: LintSummary::default(),
        }
    }

    pub fn report(&mut self, finding: &Finding) -> ReportStatus {
        let status = self.attach(finding);
        trace!(code = finding.code.as_str(), status:? = status; "Reported finding");
        self.summary.record(status);
        status
    }

    pub fn report_all<'f>(&mut self, findings: impl IntoIterator<Item = &'f Finding>) {
        for finding in findings {
            self.report(finding);
        }
    }

    /// Reports a module the extractor had to skip.
    pub fn report_extraction_error(&mut self, error: &ExtractionError) {
        let message = match error.line() {
            Some(line) => format!("{}:{line}: {}", error.filepath().display(), error.message()),
            None => error.to_string(),
        };
        debug!(message = message.as_str(); "Reported module error");
        self.summary.module_errors.push(message);
    }

    pub fn report_extraction_errors<'e>(&mut self, errors: impl IntoIterator<Item = &'e ExtractionError>) {
        for error in errors {
            self.report_extraction_error(error);
        }
    }

    fn attach(&self, finding: &Finding) -> ReportStatus {
        if !self.config.is_enabled(finding.kind, &finding.code) {
            return ReportStatus::Filtered;
        }
        if self.ignored.is_ignored(finding) {
            return ReportStatus::Ignored;
        }
        let Some(object) = finding.object.as_deref() else {
            return ReportStatus::Unresolved;
        };
        let key = self
            .registry
            .find_file(&finding.filepath)
            .and_then(|filepath| self.registry.resolve_object(&filepath, object));
        let Some(key) = key else {
            return ReportStatus::Unresolved;
        };

        let marker = ErrorMarker::new(finding.kind, &finding.code, finding.line, &finding.message);
        if self.registry.add_error(&key, marker) {
            ReportStatus::Attached
        } else {
            ReportStatus::Unresolved
        }
    }

    /// Ends the pass and re-renders every node.
    pub fn finish(self, canvas: &mut Canvas) -> Result<LintSummary, LintmapError> {
        for node in self.registry.all_entries() {
            canvas.render_node(&node)?;
        }
        info!(
            attached = self.summary.attached,
            filtered = self.summary.filtered,
            ignored = self.summary.ignored,
            unresolved = self.summary.unresolved,
            module_errors = self.summary.module_errors.len();
            "Lint pass finished"
        );
        Ok(self.summary)
    }
}

#[cfg(test)]
mod tests {
    use lintmap_core::{geometry::Size, identifier::EntityKey, semantic::MessageKind};

    use super::*;
    use crate::registry::ClassNode;

    fn finding(code: &str, object: Option<&str>) -> Finding {
        Finding {
            filepath: PathBuf::from("pkg/shapes.py"),
            line: 4,
            code: code.to_string(),
            kind: MessageKind::from_code(code).unwrap(),
            symbol: None,
            object: object.map(str::to_string),
            message: "Something is off".to_string(),
        }
    }

    fn registry_with_shape() -> (Registry, EntityKey) {
        let registry = Registry::new();
        let key = EntityKey::new("pkg/shapes.py", "Shape");
        registry.register(key.clone(), ClassNode::new(key.clone(), "Shape", 1, Size::new(90.0, 64.0)));
        (registry, key)
    }

    #[test]
    fn test_pass_attaches_and_filters() {
        let (registry, key) = registry_with_shape();
        let config = LintConfig::new(vec![MessageKind::Refactor], vec!["W0612".to_string()]);
        let mut ignored = IgnoredFindings::new();
        ignored.ignore("pkg/shapes.py", "C0103", Some("Shape".to_string()));

        let mut pass = LintPass::begin(&registry, &config, &ignored);
        assert_eq!(pass.report(&finding("C0111", Some("Shape.area"))), ReportStatus::Attached);
        assert_eq!(pass.report(&finding("R0903", Some("Shape"))), ReportStatus::Filtered);
        assert_eq!(pass.report(&finding("W0612", Some("Shape"))), ReportStatus::Filtered);
        assert_eq!(pass.report(&finding("C0103", Some("Shape"))), ReportStatus::Ignored);
        assert_eq!(pass.report(&finding("C0114", None)), ReportStatus::Unresolved);
        assert_eq!(pass.report(&finding("E1101", Some("helper"))), ReportStatus::Unresolved);

        let summary = pass.finish(&mut Canvas::default()).unwrap();
        assert_eq!(
            summary,
            LintSummary {
                attached: 1,
                filtered: 2,
                ignored: 1,
                unresolved: 2,
                module_errors: Vec::new(),
            }
        );
        assert_eq!(registry.lookup(&key).unwrap().errors().len(), 1);
    }

    #[test]
    fn test_pass_carries_module_errors() {
        let (registry, key) = registry_with_shape();
        let config = LintConfig::default();
        let ignored = IgnoredFindings::new();
        let errors = [
            ExtractionError::new("pkg/broken.py", "Invalid class header").with_line(3),
            ExtractionError::new("pkg/binary.py", "Not valid UTF-8"),
        ];

        let mut pass = LintPass::begin(&registry, &config, &ignored);
        pass.report_extraction_errors(&errors);
        let summary = pass.finish(&mut Canvas::default()).unwrap();

        assert_eq!(
            summary.module_errors,
            vec![
                "pkg/broken.py:3: Invalid class header".to_string(),
                "pkg/binary.py: Not valid UTF-8".to_string(),
            ]
        );
        assert_eq!(summary.attached + summary.unresolved, 0);
        assert!(registry.lookup(&key).unwrap().errors().is_empty());
    }

    #[test]
    fn test_begin_clears_previous_markers() {
        let (registry, key) = registry_with_shape();
        let config = LintConfig::default();
        let ignored = IgnoredFindings::new();

        let mut pass = LintPass::begin(&registry, &config, &ignored);
        pass.report(&finding("C0111", Some("Shape")));
        pass.finish(&mut Canvas::default()).unwrap();

        LintPass::begin(&registry, &config, &ignored)
            .finish(&mut Canvas::default())
            .unwrap();
        assert!(registry.lookup(&key).unwrap().errors().is_empty());
    }

    #[test]
    fn test_ignored_findings_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ignored.toml");

        let mut ignored = IgnoredFindings::load(&path).unwrap();
        assert!(ignored.is_empty());
        assert!(ignored.ignore("pkg/shapes.py", "C0111", Some("Shape".to_string())));
        assert!(!ignored.ignore("pkg/shapes.py", "C0111", Some("Shape".to_string())));
        ignored.ignore("pkg/shapes.py", "C0114", None);
        ignored.save(&path).unwrap();

        let loaded = IgnoredFindings::load(&path).unwrap();
        assert_eq!(loaded, ignored);
        assert!(loaded.is_ignored(&finding("C0114", None)));
        assert!(!loaded.is_ignored(&finding("C0114", Some("Shape"))));

        let mut loaded = loaded;
        assert!(loaded.unignore(Path::new("pkg/shapes.py"), "C0114", None));
        assert!(!loaded.unignore(Path::new("pkg/shapes.py"), "C0114", None));
    }
}
