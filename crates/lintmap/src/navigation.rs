//! Source navigation.
//!
//! Double-clicking a class box yields a [`NavigationTarget`]; a [`Navigator`]
//! opens it. [`EditorSessions`] is the in-process navigator that keeps at
//! most one session per file.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, info};

use crate::{LintmapError, registry::ClassNode};

/// A source location to open.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NavigationTarget {
    pub filepath: PathBuf,
    pub line: u32,
}

impl NavigationTarget {
    pub fn new(filepath: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            filepath: filepath.into(),
            line,
        }
    }

    /// Declaration site of `node`.
    pub fn for_node(node: &ClassNode) -> Self {
        Self::new(node.key().filepath(), node.line())
    }
}

/// Opens source locations.
pub trait Navigator {
    fn open(&mut self, target: &NavigationTarget) -> Result<(), LintmapError>;
}

/// An open editor on one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSession {
    id: usize,
    filepath: PathBuf,
    line: u32,
}

impl EditorSession {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn filepath(&self) -> &Path {
        &self.filepath
    }

    /// Line the cursor was last moved to.
    pub fn line(&self) -> u32 {
        self.line
    }
}

/// Registry of editor sessions, one per file.
#[derive(Debug, Default)]
pub struct EditorSessions {
    sessions: IndexMap<PathBuf, EditorSession>,
    next_id: usize,
}

impl EditorSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens `target`, reusing the session already open on its file.
    ///
    /// Returns the session and whether it was newly created.
    pub fn open_session(&mut self, target: &NavigationTarget) -> (&EditorSession, bool) {
        let created = !self.sessions.contains_key(&target.filepath);
        let next_id = &mut self.next_id;
        let session = self
            .sessions
            .entry(target.filepath.clone())
            .or_insert_with(|| {
                let id = *next_id;
                *next_id += 1;
                info!(session = id, path:? = target.filepath; "Opening editor session");
                EditorSession {
                    id,
                    filepath: target.filepath.clone(),
                    line: target.line,
                }
            });
        session.line = target.line;
        debug!(session = session.id, line = target.line; "Moved editor cursor");
        (&*session, created)
    }

    pub fn get(&self, filepath: &Path) -> Option<&EditorSession> {
        self.sessions.get(filepath)
    }

    /// Unregisters the session on `filepath`.
    pub fn close(&mut self, filepath: &Path) -> Option<EditorSession> {
        let closed = self.sessions.shift_remove(filepath);
        if let Some(session) = &closed {
            debug!(session = session.id; "Closed editor session");
        }
        closed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Navigator for EditorSessions {
    fn open(&mut self, target: &NavigationTarget) -> Result<(), LintmapError> {
        self.open_session(target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_session_per_file() {
        let mut sessions = EditorSessions::new();
        let (first, created) = sessions.open_session(&NavigationTarget::new("a.py", 3));
        let first_id = first.id();
        assert!(created);

        let (again, created) = sessions.open_session(&NavigationTarget::new("a.py", 12));
        assert!(!created);
        assert_eq!(again.id(), first_id);
        assert_eq!(again.line(), 12);

        sessions.open(&NavigationTarget::new("b.py", 1)).unwrap();
        assert_eq!(sessions.len(), 2);
    }

    #[test]
    fn test_close_then_reopen_creates_new_session() {
        let mut sessions = EditorSessions::new();
        let id = sessions.open_session(&NavigationTarget::new("a.py", 1)).0.id();
        assert!(sessions.close(Path::new("a.py")).is_some());
        assert!(sessions.close(Path::new("a.py")).is_none());
        assert!(sessions.is_empty());

        let (session, created) = sessions.open_session(&NavigationTarget::new("a.py", 1));
        assert!(created);
        assert_ne!(session.id(), id);
    }
}
