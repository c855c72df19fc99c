//! Error adapter for converting LintmapError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use lintmap::{LintmapError, semantic::ExtractError};

/// Adapter giving a [`LintmapError`] a diagnostic code and, where one
/// helps, a hint.
pub struct ErrorAdapter<'a>(pub &'a LintmapError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            LintmapError::Io(_) => "lintmap::io",
            LintmapError::Extraction(_) => "lintmap::extraction",
            LintmapError::Layout(_) => "lintmap::layout",
            LintmapError::UnknownEndpoint(_) => "lintmap::connection",
            LintmapError::UnknownStyle(_) => "lintmap::style",
            LintmapError::Solver(_) => "lintmap::solver",
            LintmapError::Config(_) => "lintmap::config",
            LintmapError::Timeout(_) => "lintmap::timeout",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.0 {
            LintmapError::Extraction(ExtractError::MissingPath(_)) => {
                "check that every project path exists"
            }
            LintmapError::Timeout(_) => "raise --timeout or exclude large directories",
            LintmapError::Config(_) => "see the [layout], [node] and [lint] sections",
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

/// Convert a [`LintmapError`] into a list of reportable errors.
pub fn to_reportables(err: &LintmapError) -> Vec<ErrorAdapter<'_>> {
    vec![ErrorAdapter(err)]
}

#[cfg(test)]
mod tests {
    use std::{path::PathBuf, time::Duration};

    use super::*;

    #[test]
    fn test_codes_follow_variant() {
        let err = LintmapError::Layout("non-finite position".to_string());
        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);
        assert_eq!(reportables[0].to_string(), "Layout error: non-finite position");
        assert_eq!(
            reportables[0].code().map(|code| code.to_string()).as_deref(),
            Some("lintmap::layout")
        );
        assert!(reportables[0].help().is_none());
    }

    #[test]
    fn test_missing_path_has_help() {
        let err = LintmapError::Extraction(ExtractError::MissingPath(PathBuf::from("nowhere")));
        let adapter = ErrorAdapter(&err);
        assert!(adapter.help().is_some());

        let err = LintmapError::Timeout(Duration::from_secs(1));
        assert_eq!(
            ErrorAdapter(&err).code().map(|code| code.to_string()).as_deref(),
            Some("lintmap::timeout")
        );
    }
}
