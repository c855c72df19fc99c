//! Diagram entity registry.
//!
//! The registry maps each class's [`EntityKey`] to its [`ClassNode`]. It is
//! shared between the thread that owns the canvas and any thread that
//! reports lint results, so every operation takes a single internal lock and
//! returns owned data.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use indexmap::IndexMap;
use log::{debug, warn};
use parking_lot::Mutex;

use lintmap_core::{
    geometry::{Point, Size},
    identifier::EntityKey,
    semantic::MessageKind,
};

use crate::canvas::HandleKey;

/// A lint message attached to a class box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMarker {
    pub kind: MessageKind,
    pub code: String,
    pub line: u32,
    pub message: String,
}

impl ErrorMarker {
    pub fn new(kind: MessageKind, code: impl Into<String>, line: u32, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            line,
            message: message.into(),
        }
    }
}

/// A class box on the diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassNode {
    key: EntityKey,
    title: String,
    line: u32,
    size: Size,
    position: Point,
    errors: Vec<ErrorMarker>,
    handles: Vec<HandleKey>,
}

impl ClassNode {
    pub fn new(key: EntityKey, title: impl Into<String>, line: u32, size: Size) -> Self {
        Self {
            key,
            title: title.into(),
            line,
            size,
            position: Point::default(),
            errors: Vec::new(),
            handles: Vec::new(),
        }
    }

    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Declared source line of the class.
    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Center of the box in canvas coordinates.
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn errors(&self) -> &[ErrorMarker] {
        &self.errors
    }

    /// Connector endpoints attached to this box.
    pub fn handles(&self) -> &[HandleKey] {
        &self.handles
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_line(&mut self, line: u32) {
        self.line = line;
    }

    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub fn add_handle(&mut self, handle: HandleKey) {
        self.handles.push(handle);
    }

    pub fn retain_handles(&mut self, keep: impl FnMut(&HandleKey) -> bool) {
        self.handles.retain(keep);
    }

    pub fn clear_handles(&mut self) {
        self.handles.clear();
    }

    pub fn add_error(&mut self, marker: ErrorMarker) {
        self.errors.push(marker);
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }
}

/// Keyed, lock-guarded store of class nodes.
///
/// Cloning a `Registry` yields another handle to the same store.
/// Iteration follows insertion order.
///
/// # Examples
///
/// ```
/// # use lintmap::registry::{ClassNode, Registry};
/// # use lintmap_core::{geometry::Size, identifier::EntityKey};
/// let registry = Registry::new();
/// let key = EntityKey::new("shapes.py", "Shape");
///
/// assert!(registry.register(key.clone(), ClassNode::new(key.clone(), "Shape", 1, Size::new(90.0, 64.0))).is_none());
/// assert_eq!(registry.lookup(&key).map(|n| n.line()), Some(1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Arc<Mutex<IndexMap<EntityKey, ClassNode>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the node stored under `key`, returning the
    /// previous node.
    pub fn register(&self, key: EntityKey, node: ClassNode) -> Option<ClassNode> {
        let previous = self.entries.lock().insert(key, node);
        if let Some(previous) = &previous {
            warn!(key:% = previous.key(); "Registry key registered twice, keeping the latest node");
        }
        previous
    }

    pub fn lookup(&self, key: &EntityKey) -> Option<ClassNode> {
        self.entries.lock().get(key).cloned()
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        self.entries.lock().contains_key(key)
    }

    /// Applies `update` to the node under `key`; returns `false` if absent.
    pub fn update(&self, key: &EntityKey, update: impl FnOnce(&mut ClassNode)) -> bool {
        match self.entries.lock().get_mut(key) {
            Some(node) => {
                update(node);
                true
            }
            None => false,
        }
    }

    pub fn evict(&self, key: &EntityKey) -> Option<ClassNode> {
        self.entries.lock().shift_remove(key)
    }

    /// Keeps only the nodes for which `keep` returns `true` and returns the
    /// evicted ones.
    pub fn retain(&self, mut keep: impl FnMut(&EntityKey) -> bool) -> Vec<ClassNode> {
        let mut entries = self.entries.lock();
        let mut evicted = Vec::new();
        entries.retain(|key, node| {
            if keep(key) {
                true
            } else {
                evicted.push(node.clone());
                false
            }
        });
        evicted
    }

    /// Removes every error marker from every node.
    pub fn clear_all_errors(&self) {
        let mut entries = self.entries.lock();
        for node in entries.values_mut() {
            node.clear_errors();
        }
        debug!(nodes = entries.len(); "Cleared error markers");
    }

    /// Attaches a marker to the node under `key`.
    ///
    /// Unknown keys are ignored and reported as `false`.
    pub fn add_error(&self, key: &EntityKey, marker: ErrorMarker) -> bool {
        self.update(key, |node| node.add_error(marker))
    }

    /// Snapshot of every node in insertion order.
    pub fn all_entries(&self) -> Vec<ClassNode> {
        self.entries.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// The registered file that `path` names.
    ///
    /// An exact match wins; otherwise the first registered file whose path
    /// ends with `path` is returned, so relative lint paths still resolve.
    pub fn find_file(&self, path: &Path) -> Option<PathBuf> {
        let entries = self.entries.lock();
        if entries.keys().any(|key| key.filepath() == path) {
            return Some(path.to_path_buf());
        }
        entries
            .keys()
            .map(EntityKey::filepath)
            .find(|file| file.ends_with(path))
            .map(Path::to_path_buf)
    }

    /// Finds the class in `filepath` that owns the dotted lint `object`.
    ///
    /// The longest dotted prefix of `object` that names a registered class
    /// wins, so `Outer.Inner.method` resolves to `Outer.Inner` when both
    /// `Outer` and `Outer.Inner` are registered.
    pub fn resolve_object(&self, filepath: &Path, object: &str) -> Option<EntityKey> {
        let entries = self.entries.lock();
        let mut candidate = object;
        loop {
            let key = EntityKey::new(filepath, candidate);
            if entries.contains_key(&key) {
                return Some(key);
            }
            let (parent, _) = candidate.rsplit_once('.')?;
            candidate = parent;
        }
    }
}
