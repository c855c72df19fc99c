//! # Lintmap Parser
//!
//! Source-facing collaborators for Lintmap:
//!
//! - [`outline::OutlineExtractor`]: an [`Extractor`](lintmap_core::semantic::Extractor)
//!   that outlines Python source trees into classes, modules and associations
//! - [`lint_output`]: a parser for pylint's `parseable` message format
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::PathBuf;
//!
//! use lintmap_core::semantic::{CancellationToken, Extractor};
//! use lintmap_parser::OutlineExtractor;
//!
//! let extraction = OutlineExtractor::new()
//!     .extract(&[PathBuf::from("my_project")], &[], &CancellationToken::new())
//!     .expect("project should exist");
//! println!("{} classes", extraction.classes.len());
//! ```

pub mod error;
pub mod lint_output;
pub mod outline;

pub use error::{LintOutputError, OutlineError};
pub use lint_output::{Finding, LintReport, parse_lint_output};
pub use outline::OutlineExtractor;
