//! Application context.
//!
//! [`AppContext`] owns the long-lived state shared by scanning, lint
//! reporting and navigation: the class registry, the exclusion list, the
//! ignored-findings store and the configuration. Components receive it (or
//! the parts they need) explicitly.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use log::debug;

use lintmap_core::semantic::Extractor;
use lintmap_parser::outline::is_excluded;

use crate::{
    config::AppConfig,
    registry::Registry,
    reporting::{IgnoredFindings, LintPass},
    scan::ScanPipeline,
};

/// Paths left out of every scan.
///
/// An entry excludes itself, everything below it, and, when it is a bare
/// name such as `tests`, any file or directory with that name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionList {
    paths: Vec<PathBuf>,
}

impl ExclusionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `path`; returns `false` if it was already listed.
    pub fn add(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if self.paths.contains(&path) {
            return false;
        }
        debug!(path:? = path; "Excluding path");
        self.paths.push(path);
        true
    }

    pub fn remove(&mut self, path: &Path) -> bool {
        let before = self.paths.len();
        self.paths.retain(|listed| listed != path);
        self.paths.len() != before
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.iter().any(|listed| listed == path)
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        is_excluded(path, &self.paths)
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for ExclusionList {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let mut list = Self::new();
        for path in iter {
            list.add(path);
        }
        list
    }
}

/// Long-lived application state.
#[derive(Debug, Clone, Default)]
pub struct AppContext {
    registry: Registry,
    exclusions: ExclusionList,
    ignored: IgnoredFindings,
    config: AppConfig,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_exclusions(mut self, exclusions: ExclusionList) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn with_ignored(mut self, ignored: IgnoredFindings) -> Self {
        self.ignored = ignored;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn exclusions(&self) -> &ExclusionList {
        &self.exclusions
    }

    pub fn exclusions_mut(&mut self) -> &mut ExclusionList {
        &mut self.exclusions
    }

    pub fn ignored(&self) -> &IgnoredFindings {
        &self.ignored
    }

    pub fn ignored_mut(&mut self) -> &mut IgnoredFindings {
        &mut self.ignored
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Starts a lint pass over this context's registry.
    pub fn lint_pass(&self) -> LintPass<'_> {
        LintPass::begin(&self.registry, self.config.lint(), &self.ignored)
    }

    /// Builds a scan pipeline feeding this context's registry.
    pub fn scan_pipeline(&self, extractor: Arc<dyn Extractor>) -> ScanPipeline {
        ScanPipeline::new(extractor, self.registry.clone(), &self.config)
    }
}
