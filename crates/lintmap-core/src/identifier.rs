//! Identity keys of scanned entities.
//!
//! An [`EntityKey`] is the `(filepath, qualified-name)` pair that identifies a
//! class across rescans. The diagram registry, the lint reporters and the
//! navigation layer all address class boxes through it.

use std::{
    fmt,
    path::{Path, PathBuf},
};

/// Identity of a scanned entity: the file it lives in plus its dotted name
/// within that file.
///
/// Keys order by filepath first, then by qualified name, which gives layout
/// and reports a stable iteration order.
///
/// # Examples
///
/// ```
/// use lintmap_core::identifier::EntityKey;
///
/// let key = EntityKey::new("pkg/shapes.py", "Shape.Corner");
/// assert_eq!(key.simple_name(), "Corner");
/// assert_eq!(key.to_string(), "pkg/shapes.py::Shape.Corner");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    filepath: PathBuf,
    qualified_name: String,
}

impl EntityKey {
    /// Creates a key from a file path and a dotted name.
    pub fn new(filepath: impl Into<PathBuf>, qualified_name: impl Into<String>) -> Self {
        Self {
            filepath: filepath.into(),
            qualified_name: qualified_name.into(),
        }
    }

    /// The file that declares the entity.
    pub fn filepath(&self) -> &Path {
        &self.filepath
    }

    /// The dotted name of the entity within its file.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// The last component of the qualified name.
    pub fn simple_name(&self) -> &str {
        self.qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.qualified_name)
    }

    /// Creates the key of an entity nested inside this one.
    ///
    /// # Examples
    ///
    /// ```
    /// use lintmap_core::identifier::EntityKey;
    ///
    /// let outer = EntityKey::new("a.py", "Outer");
    /// assert_eq!(outer.create_nested("Inner").qualified_name(), "Outer.Inner");
    /// ```
    pub fn create_nested(&self, child: &str) -> Self {
        Self {
            filepath: self.filepath.clone(),
            qualified_name: format!("{}.{}", self.qualified_name, child),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.filepath.display(), self.qualified_name)
    }
}
