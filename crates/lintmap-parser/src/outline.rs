//! Python class outline extraction.
//!
//! [`OutlineExtractor`] is the reference implementation of the
//! [`Extractor`] collaborator. It reads Python sources line by line rather
//! than importing them, which keeps extraction free of side effects:
//!
//! - every `class` statement becomes a [`ClassDescriptor`], nested classes
//!   qualified by their enclosing classes (`Outer.Inner`)
//! - every file becomes a module descriptor
//! - base classes become inheritance associations
//! - `self.attr = Cls(...)` inside a method becomes a composition association
//!
//! A module that cannot be read or contains a malformed class header is
//! reported as an [`ExtractionError`] and skipped.

mod grammar;

use std::{
    fs,
    path::{Path, PathBuf},
};

use indexmap::IndexSet;
use log::{debug, info, warn};

use lintmap_core::{
    identifier::EntityKey,
    semantic::{
        AssociationDescriptor, CancellationToken, ClassDescriptor, ExtractError, Extraction,
        ExtractionError, Extractor,
    },
};

use crate::error::OutlineError;

const SOURCE_EXTENSION: &str = "py";
const TAB_WIDTH: usize = 8;

/// Extracts classes and their relations from Python source trees.
#[derive(Debug, Clone, Default)]
pub struct OutlineExtractor {
    _private: (),
}

impl OutlineExtractor {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A source file selected for outlining.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SourceFile {
    path: PathBuf,
    module_name: String,
}

/// Classes and unresolved relation names found in one module.
#[derive(Debug, Default)]
struct ModuleOutline {
    classes: Vec<ClassDescriptor>,
    bases: Vec<(EntityKey, String)>,
    parts: Vec<(EntityKey, String)>,
}

#[derive(Debug)]
enum Scope {
    Class(EntityKey),
    Opaque,
}

impl Extractor for OutlineExtractor {
    fn extract(
        &self,
        project_paths: &[PathBuf],
        exclude_paths: &[PathBuf],
        cancel: &CancellationToken,
    ) -> Result<Extraction, ExtractError> {
        let mut sources = Vec::new();
        for root in project_paths {
            collect_sources(root, exclude_paths, &mut sources)?;
        }
        debug!(count = sources.len(); "Collected source files");

        let mut extraction = Extraction::default();
        let mut bases = Vec::new();
        let mut parts = Vec::new();

        for source in &sources {
            if cancel.is_cancelled() {
                info!("Extraction cancelled");
                return Err(ExtractError::Cancelled);
            }

            let outline = fs::read(&source.path)
                .map_err(|err| OutlineError::Unreadable(err.to_string()))
                .and_then(|bytes| {
                    String::from_utf8(bytes)
                        .map_err(|_| OutlineError::Unreadable("not valid UTF-8".to_string()))
                })
                .and_then(|text| outline_module(&source.path, &text));

            match outline {
                Ok(outline) => {
                    debug!(
                        path:? = source.path,
                        classes = outline.classes.len();
                        "Outlined module"
                    );
                    extraction.classes.push(ClassDescriptor::module(EntityKey::new(
                        source.path.clone(),
                        source.module_name.clone(),
                    )));
                    extraction.classes.extend(outline.classes);
                    bases.extend(outline.bases);
                    parts.extend(outline.parts);
                }
                Err(err) => {
                    warn!(path:? = source.path, err:% = err; "Skipping module");
                    let mut error = ExtractionError::new(source.path.clone(), err.to_string());
                    if let Some(line) = err.line() {
                        error = error.with_line(line);
                    }
                    extraction.errors.push(error);
                }
            }
        }

        extraction.associations = resolve_associations(&extraction.classes, &sources, bases, parts);

        info!(
            modules = sources.len(),
            classes = extraction.classes.iter().filter(|c| c.is_class()).count(),
            associations = extraction.associations.len(),
            errors = extraction.errors.len();
            "Extraction finished"
        );
        Ok(extraction)
    }
}

/// Whether `path` is matched by an exclusion entry.
///
/// An entry matches the exact path, any path below it, or any file or
/// directory with the same base name when the entry is a bare name.
pub fn is_excluded(path: &Path, exclude_paths: &[PathBuf]) -> bool {
    exclude_paths.iter().any(|excluded| {
        if path.starts_with(excluded) {
            return true;
        }
        excluded.components().count() == 1
            && path.file_name().is_some_and(|name| name == excluded.as_os_str())
    })
}

fn collect_sources(
    root: &Path,
    exclude_paths: &[PathBuf],
    sources: &mut Vec<SourceFile>,
) -> Result<(), ExtractError> {
    if !root.exists() {
        return Err(ExtractError::MissingPath(root.to_path_buf()));
    }
    if is_excluded(root, exclude_paths) {
        return Ok(());
    }

    if root.is_file() {
        if has_source_extension(root) {
            let module_name = root
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            sources.push(SourceFile {
                path: root.to_path_buf(),
                module_name,
            });
        }
        return Ok(());
    }

    let mut pending = vec![root.to_path_buf()];
    let mut files = Vec::new();
    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir).map_err(|source| ExtractError::Io {
            path: dir.clone(),
            source,
        })?;
        for entry in entries {
            let path = entry
                .map_err(|source| ExtractError::Io {
                    path: dir.clone(),
                    source,
                })?
                .path();
            if is_excluded(&path, exclude_paths) {
                debug!(path:? = path; "Excluded");
                continue;
            }
            if path.is_dir() {
                pending.push(path);
            } else if has_source_extension(&path) {
                files.push(path);
            }
        }
    }
    files.sort();

    sources.extend(files.into_iter().map(|path| {
        let module_name = module_name(root, &path);
        SourceFile { path, module_name }
    }));
    Ok(())
}

fn has_source_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION)
}

/// Dotted module name of `path` relative to the project `root`.
///
/// `pkg/mod.py` becomes `pkg.mod` and `pkg/__init__.py` becomes `pkg`.
fn module_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path).with_extension("");
    let mut parts: Vec<String> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.last().is_some_and(|last| last == "__init__") {
        parts.pop();
    }
    if parts.is_empty() {
        return root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    parts.join(".")
}

fn indentation(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

/// Returns the delimiter of a triple-quoted string left open by `line`.
fn unterminated_string(line: &str) -> Option<&'static str> {
    ["\"\"\"", "'''"]
        .into_iter()
        .find(|delimiter| line.matches(delimiter).count() % 2 == 1)
}

/// Innermost class whose method body encloses the current line.
fn method_owner(scopes: &[(usize, Scope)]) -> Option<&EntityKey> {
    let class_index = scopes
        .iter()
        .rposition(|(_, scope)| matches!(scope, Scope::Class(_)))?;
    if class_index + 1 == scopes.len() {
        return None;
    }
    match &scopes[class_index].1 {
        Scope::Class(key) => Some(key),
        Scope::Opaque => None,
    }
}

fn outline_module(path: &Path, text: &str) -> Result<ModuleOutline, OutlineError> {
    let lines: Vec<&str> = text.lines().collect();
    let mut outline = ModuleOutline::default();
    let mut scopes: Vec<(usize, Scope)> = Vec::new();
    let mut open_string: Option<&str> = None;

    let mut index = 0;
    while index < lines.len() {
        let line = lines[index];
        let line_number = (index + 1) as u32;
        index += 1;

        if let Some(delimiter) = open_string {
            if line.matches(delimiter).count() % 2 == 1 {
                open_string = None;
            }
            continue;
        }

        let stripped = line.trim_start();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }
        open_string = unterminated_string(stripped);

        let indent = indentation(line);
        while scopes.last().is_some_and(|(level, _)| *level >= indent) {
            scopes.pop();
        }

        if grammar::is_class_statement(stripped) {
            let mut header = stripped.to_string();
            while grammar::header_is_open(&header) && index < lines.len() {
                header.push('\n');
                header.push_str(lines[index]);
                index += 1;
            }

            let parsed =
                grammar::parse_class_header(&header).map_err(|_| OutlineError::InvalidHeader {
                    line: line_number,
                    text: stripped.to_string(),
                })?;

            let visible = scopes
                .iter()
                .all(|(_, scope)| matches!(scope, Scope::Class(_)));
            if !visible {
                scopes.push((indent, Scope::Opaque));
                continue;
            }

            let key = match scopes.last() {
                Some((_, Scope::Class(parent))) => parent.create_nested(parsed.name),
                _ => EntityKey::new(path, parsed.name),
            };
            outline
                .bases
                .extend(parsed.bases.iter().map(|base| (key.clone(), base.to_string())));
            outline
                .classes
                .push(ClassDescriptor::class(key.clone(), line_number));
            scopes.push((indent, Scope::Class(key)));
        } else if grammar::is_function_statement(stripped) {
            scopes.push((indent, Scope::Opaque));
        } else if let Some(class_name) = grammar::self_assignment(stripped) {
            if let Some(owner) = method_owner(&scopes) {
                outline.parts.push((owner.clone(), class_name.to_string()));
            }
        }
    }

    Ok(outline)
}

/// Looks up project classes by simple name or dotted suffix.
struct ClassIndex<'a> {
    entries: Vec<(String, &'a EntityKey)>,
}

impl<'a> ClassIndex<'a> {
    fn new(classes: &'a [ClassDescriptor], sources: &[SourceFile]) -> Self {
        let entries = classes
            .iter()
            .filter(|class| class.is_class())
            .map(|class| {
                let key = class.key();
                let module = sources
                    .iter()
                    .find(|source| source.path == key.filepath())
                    .map(|source| source.module_name.as_str())
                    .unwrap_or_default();
                (format!("{module}.{}", key.qualified_name()), key)
            })
            .collect();
        Self { entries }
    }

    /// Resolves `name` as referenced from `from`, preferring classes in the
    /// same file.
    fn resolve(&self, name: &str, from: &EntityKey) -> Option<&'a EntityKey> {
        let suffix = format!(".{name}");
        let matches = |(full, key): &&(String, &'a EntityKey)| {
            key.qualified_name() == name || full == name || full.ends_with(&suffix)
        };
        let mut candidates = self.entries.iter().filter(matches).peekable();
        let first = candidates.peek().map(|(_, key)| *key);
        candidates
            .find(|(_, key)| key.filepath() == from.filepath())
            .map(|(_, key)| *key)
            .or(first)
    }
}

fn resolve_associations(
    classes: &[ClassDescriptor],
    sources: &[SourceFile],
    bases: Vec<(EntityKey, String)>,
    parts: Vec<(EntityKey, String)>,
) -> Vec<AssociationDescriptor> {
    let index = ClassIndex::new(classes, sources);
    let mut associations = IndexSet::new();

    for (subclass, base_name) in bases {
        match index.resolve(&base_name, &subclass) {
            Some(base) if *base != subclass => {
                associations.insert(AssociationDescriptor::inheritance(base.clone(), subclass));
            }
            Some(_) => {}
            None => debug!(class:% = subclass, base = base_name; "Unresolved base class"),
        }
    }

    for (owner, part_name) in parts {
        if let Some(part) = index.resolve(&part_name, &owner) {
            associations.insert(AssociationDescriptor::composition(owner, part.clone()));
        }
    }

    associations.into_iter().collect()
}
