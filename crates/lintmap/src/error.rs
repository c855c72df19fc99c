//! Error types for Lintmap operations.
//!
//! This module provides the main error type [`LintmapError`] which wraps the
//! failures of every stage from extraction to connection building.

use std::{io, time::Duration};

use thiserror::Error;

use lintmap_core::{draw::DecorationParseError, identifier::EntityKey, semantic::ExtractError};

use crate::solver::SolverError;

/// The main error type for Lintmap operations.
///
/// Per-module extraction failures are not errors at this level; they are
/// carried in the scan outcome. Only failures that stop a whole operation
/// surface here.
#[derive(Debug, Error)]
pub enum LintmapError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Layout error: {0}")]
    Layout(String),

    #[error("Connector endpoint is not on the canvas: {0}")]
    UnknownEndpoint(EntityKey),

    #[error(transparent)]
    UnknownStyle(#[from] DecorationParseError),

    #[error("Constraint solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scan did not finish within {0:?}")]
    Timeout(Duration),
}
