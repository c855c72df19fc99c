use thiserror::Error;

/// Failure to outline a single source module.
///
/// The extractor converts these into per-module
/// [`ExtractionError`](lintmap_core::semantic::ExtractionError)s, so one bad
/// file never aborts a scan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutlineError {
    /// A `class` statement whose header could not be parsed.
    #[error("Invalid class header at line {line}: `{text}`")]
    InvalidHeader { line: u32, text: String },

    /// The file could not be read.
    #[error("Unable to read module: {0}")]
    Unreadable(String),
}

impl OutlineError {
    /// The 1-based line the error was detected on, if known.
    pub fn line(&self) -> Option<u32> {
        match self {
            Self::InvalidHeader { line, .. } => Some(*line),
            Self::Unreadable(_) => None,
        }
    }
}

/// A line of lint output that is not a recognizable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unrecognized lint message at line {line}: `{text}`")]
pub struct LintOutputError {
    line: usize,
    text: String,
}

impl LintOutputError {
    pub(crate) fn new(line: usize, text: impl Into<String>) -> Self {
        Self {
            line,
            text: text.into(),
        }
    }

    /// 1-based line within the lint output.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
