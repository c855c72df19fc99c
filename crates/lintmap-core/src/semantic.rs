//! Semantic model exchanged with the extraction collaborator.
//!
//! An [`Extractor`] turns a set of project paths into an [`Extraction`]: the
//! classes and modules it discovered, the associations between classes, and
//! the per-module failures it recovered from. Everything downstream (layout,
//! connection building, reconciliation) consumes these descriptors.

use std::{
    fmt,
    path::{Path, PathBuf},
    str,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{draw::Decoration, identifier::EntityKey};

/// Kind of a discovered entity.
///
/// Only classes are diagrammed; modules are extracted but filtered out
/// before layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Class,
    Module,
}

/// A class (or module) discovered by an extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDescriptor {
    key: EntityKey,
    title: String,
    line_number: u32,
    kind: EntityKind,
}

impl ClassDescriptor {
    /// Creates a class descriptor whose title is its qualified name.
    pub fn class(key: EntityKey, line_number: u32) -> Self {
        let title = key.qualified_name().to_string();
        Self {
            key,
            title,
            line_number,
            kind: EntityKind::Class,
        }
    }

    /// Creates a module descriptor.
    pub fn module(key: EntityKey) -> Self {
        let title = key.qualified_name().to_string();
        Self {
            key,
            title,
            line_number: 0,
            kind: EntityKind::Module,
        }
    }

    /// Overrides the display title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// 1-based line of the declaration; 0 for modules.
    pub fn line_number(&self) -> u32 {
        self.line_number
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn is_class(&self) -> bool {
        self.kind == EntityKind::Class
    }
}

/// A directed relation between two classes.
///
/// The `arrowhead` decoration is drawn at the head end of the connector and
/// the `arrowtail` decoration at the tail end.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssociationDescriptor {
    head: EntityKey,
    tail: EntityKey,
    arrowhead: Decoration,
    arrowtail: Decoration,
}

impl AssociationDescriptor {
    pub fn new(
        head: EntityKey,
        tail: EntityKey,
        arrowhead: Decoration,
        arrowtail: Decoration,
    ) -> Self {
        Self {
            head,
            tail,
            arrowhead,
            arrowtail,
        }
    }

    /// Inheritance: an empty diamond at the base class.
    pub fn inheritance(base: EntityKey, subclass: EntityKey) -> Self {
        Self::new(base, subclass, Decoration::Empty, Decoration::None)
    }

    /// Composition: a filled diamond at the owning class.
    pub fn composition(owner: EntityKey, part: EntityKey) -> Self {
        Self::new(owner, part, Decoration::Diamond, Decoration::None)
    }

    pub fn head(&self) -> &EntityKey {
        &self.head
    }

    pub fn tail(&self) -> &EntityKey {
        &self.tail
    }

    pub fn arrowhead(&self) -> Decoration {
        self.arrowhead
    }

    pub fn arrowtail(&self) -> Decoration {
        self.arrowtail
    }
}

/// A module that could not be parsed or introspected.
///
/// Recorded and skipped; a failing module never aborts the whole scan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {message}", filepath.display())]
pub struct ExtractionError {
    filepath: PathBuf,
    line: Option<u32>,
    message: String,
}

impl ExtractionError {
    pub fn new(filepath: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            filepath: filepath.into(),
            line: None,
            message: message.into(),
        }
    }

    /// Attaches the 1-based line the failure was detected on.
    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn filepath(&self) -> &Path {
        &self.filepath
    }

    pub fn line(&self) -> Option<u32> {
        self.line
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result of a successful (possibly partial) extraction.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub classes: Vec<ClassDescriptor>,
    pub associations: Vec<AssociationDescriptor>,
    pub errors: Vec<ExtractionError>,
}

/// A failure that prevents extraction from producing any result.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Project path does not exist: {}", .0.display())]
    MissingPath(PathBuf),

    #[error("I/O error while scanning {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Extraction cancelled")]
    Cancelled,
}

/// Cooperative cancellation flag shared between a scan request and its worker.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; the worker notices at its next check.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The AST/introspection collaborator.
///
/// Implementations run on a background worker thread and therefore must be
/// `Send + Sync`.
pub trait Extractor: Send + Sync {
    /// Extracts classes and associations below `project_paths`, skipping
    /// anything matched by `exclude_paths`.
    ///
    /// # Errors
    ///
    /// Per-module failures belong in [`Extraction::errors`]; only failures
    /// that leave nothing to diagram are returned as [`ExtractError`].
    fn extract(
        &self,
        project_paths: &[PathBuf],
        exclude_paths: &[PathBuf],
        cancel: &CancellationToken,
    ) -> Result<Extraction, ExtractError>;
}

/// Category of a lint message, taken from the first letter of its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Error,
    Warning,
    Convention,
    Info,
    Refactor,
    Fatal,
}

impl MessageKind {
    /// Returns the category for a message code such as `"C0111"`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.chars().next()? {
            'E' => Some(Self::Error),
            'W' => Some(Self::Warning),
            'C' => Some(Self::Convention),
            'I' => Some(Self::Info),
            'R' => Some(Self::Refactor),
            'F' => Some(Self::Fatal),
            _ => None,
        }
    }

    /// Whether the category is rendered as an error rather than a warning.
    pub fn is_severe(self) -> bool {
        matches!(self, Self::Error | Self::Fatal)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Convention => "convention",
            Self::Info => "info",
            Self::Refactor => "refactor",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl str::FromStr for MessageKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(Self::Error),
            "warning" => Ok(Self::Warning),
            "convention" => Ok(Self::Convention),
            "info" => Ok(Self::Info),
            "refactor" => Ok(Self::Refactor),
            "fatal" => Ok(Self::Fatal),
            _ => Err("Invalid message kind"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_descriptor_title_defaults_to_name() {
        let descriptor = ClassDescriptor::class(EntityKey::new("a.py", "Outer.Inner"), 3);
        assert_eq!(descriptor.title(), "Outer.Inner");
        assert!(descriptor.is_class());
    }

    #[test]
    fn test_module_descriptor_is_not_class() {
        let descriptor = ClassDescriptor::module(EntityKey::new("a.py", "a"));
        assert!(!descriptor.is_class());
        assert_eq!(descriptor.line_number(), 0);
    }

    #[test]
    fn test_message_kind_from_code() {
        assert_eq!(MessageKind::from_code("C0111"), Some(MessageKind::Convention));
        assert_eq!(MessageKind::from_code("E1101"), Some(MessageKind::Error));
        assert_eq!(MessageKind::from_code("X0001"), None);
        assert_eq!(MessageKind::from_code(""), None);
    }

    #[test]
    fn test_cancellation_token_shared() {
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_extraction_error_display() {
        let err = ExtractionError::new("pkg/broken.py", "invalid class header").with_line(4);
        assert_eq!(err.to_string(), "pkg/broken.py: invalid class header");
        assert_eq!(err.line(), Some(4));
    }
}
