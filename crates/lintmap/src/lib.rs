//! Lintmap - lint results overlaid on a live UML class diagram.
//!
//! A project is scanned in the background into classes and associations,
//! laid out with a force-directed engine and drawn as boxes joined by
//! connectors whose ends stay on the box borders. Lint findings are then
//! attached to the classes they concern.

pub mod canvas;
pub mod config;
pub mod connection;
pub mod context;
pub mod layout;
pub mod navigation;
pub mod registry;
pub mod reporting;
pub mod scan;
pub mod solver;
pub mod surface;

mod error;

pub use lintmap_core::{draw, geometry, identifier, semantic};

pub use error::LintmapError;

use std::{path::PathBuf, sync::Arc, time::Duration};

use log::{debug, info};

use lintmap_parser::Finding;

use canvas::Canvas;
use context::AppContext;
use reporting::LintSummary;
use scan::{ScanOutcome, ScanPipeline};
use semantic::{ExtractionError, Extractor};

/// A diagram together with the state needed to keep it current.
///
/// This bundles an [`AppContext`], the [`Canvas`] and a [`ScanPipeline`]
/// for callers that drive scans synchronously, such as the command-line
/// tool.
///
/// # Examples
///
/// ```rust,no_run
/// use std::{path::PathBuf, sync::Arc, time::Duration};
///
/// use lintmap::{DiagramSession, context::AppContext};
/// use lintmap_parser::OutlineExtractor;
///
/// let mut session = DiagramSession::new(AppContext::default(), Arc::new(OutlineExtractor::new()));
/// let outcome = session
///     .scan(&[PathBuf::from("my_project")], Duration::from_secs(30))
///     .expect("Failed to scan");
/// println!("{} classes", outcome.added);
/// ```
#[derive(Debug)]
pub struct DiagramSession {
    context: AppContext,
    canvas: Canvas,
    pipeline: ScanPipeline,
    module_errors: Vec<ExtractionError>,
}

impl DiagramSession {
    pub fn new(context: AppContext, extractor: Arc<dyn Extractor>) -> Self {
        let pipeline = context.scan_pipeline(extractor);
        Self {
            context,
            canvas: Canvas::default(),
            pipeline,
            module_errors: Vec::new(),
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut AppContext {
        &mut self.context
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    /// Scans `project_paths` and waits for the result to be reconciled.
    ///
    /// # Errors
    ///
    /// Returns [`LintmapError::Timeout`] (after cancelling the run) when no
    /// result arrives within `timeout`, or the error of the failed run.
    pub fn scan(
        &mut self,
        project_paths: &[PathBuf],
        timeout: Duration,
    ) -> Result<ScanOutcome, LintmapError> {
        info!(paths = project_paths.len(); "Scanning project");
        self.pipeline
            .request_scan(project_paths, self.context.exclusions())?;
        match self.pipeline.wait_timeout(&mut self.canvas, timeout) {
            Some(result) => {
                let outcome = result?;
                self.module_errors = outcome.errors.clone();
                Ok(outcome)
            }
            None => {
                self.pipeline.cancel();
                Err(LintmapError::Timeout(timeout))
            }
        }
    }

    /// Runs a lint pass with `findings` and re-renders the diagram.
    ///
    /// Modules skipped by the latest scan are reported in the same pass.
    pub fn apply_lint(&mut self, findings: &[Finding]) -> Result<LintSummary, LintmapError> {
        debug!(findings = findings.len(); "Applying lint findings");
        let mut pass = self.context.lint_pass();
        pass.report_all(findings);
        pass.report_extraction_errors(&self.module_errors);
        pass.finish(&mut self.canvas)
    }
}
