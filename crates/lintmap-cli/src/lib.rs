//! CLI logic for the Lintmap diagram tool.
//!
//! This module contains the core CLI logic: scan the projects, overlay lint
//! findings and write a textual report of the resulting diagram.

pub mod error_adapter;

mod args;
mod config;
mod report;

pub use args::Args;

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use log::{info, warn};

use lintmap::{
    DiagramSession, LintmapError,
    context::{AppContext, ExclusionList},
    reporting::IgnoredFindings,
};
use lintmap_parser::{OutlineExtractor, parse_lint_output};

use report::DiagramReport;

/// Run the Lintmap CLI application
///
/// This function scans the project paths, applies the lint output if one
/// was given, and writes the diagram report to the output file.
///
/// # Errors
///
/// Returns `LintmapError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Missing project paths or a cancelled scan
/// - Layout errors
pub fn run(args: &Args) -> Result<(), LintmapError> {
    info!(
        projects:? = args.projects,
        output_path = args.output;
        "Building lint diagram"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let exclusions: ExclusionList = args.exclude.iter().map(PathBuf::from).collect();
    let ignored = match &args.ignored {
        Some(path) => IgnoredFindings::load(Path::new(path))?,
        None => IgnoredFindings::default(),
    };
    let context = AppContext::new(app_config)
        .with_exclusions(exclusions)
        .with_ignored(ignored);

    let mut session = DiagramSession::new(context, Arc::new(OutlineExtractor::new()));
    let projects: Vec<PathBuf> = args.projects.iter().map(PathBuf::from).collect();
    let outcome = session.scan(&projects, Duration::from_secs(args.timeout))?;
    for error in &outcome.errors {
        warn!(err:% = error; "Module skipped");
    }

    let lint = match &args.lint {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            let report = parse_lint_output(&text);
            for error in &report.errors {
                warn!(line = error.line(), text = error.text(); "Unrecognized lint output line");
            }
            Some(session.apply_lint(&report.findings)?)
        }
        None => None,
    };

    let report = DiagramReport::new(&session, &outcome, lint.as_ref()).to_string();
    fs::write(&args.output, report)?;

    info!(output_file = args.output; "Diagram report written");

    Ok(())
}
