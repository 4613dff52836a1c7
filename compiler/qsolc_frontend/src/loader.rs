// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! The module loader resolves `use` imports into one ordered list of sources: imports
//! first, in depth-first post-order, then the root module. A module path `a.b.c` maps to
//! the file `a/b/c.qsol`, resolved first against the importing file's directory and then
//! against the process working directory. The `stdlib.*` tree is packaged with the
//! compiler and never touches the filesystem.


use crate::compile::{SourceContents, SourceMap, SourceName};
use miette::Diagnostic;
use qsolc_ast::ast::ItemKind;
use qsolc_data_structures::span::Span;
use rustc_hash::FxHashSet;
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;

/// The packaged standard library, keyed by module path.
const STDLIB: &[(&str, &str)] = &[(
    "stdlib.constraints",
    include_str!("../../../library/std/constraints.qsol"),
)];

#[derive(Clone, Debug, Diagnostic, Error)]
pub enum Error {
    #[error("import cycle through module `{0}`")]
    #[diagnostic(code("QSOL2101"))]
    Cycle(String, #[label("imported again here")] Span),

    #[error("imported module `{0}` declares a problem")]
    #[diagnostic(code("QSOL2101"))]
    #[diagnostic(help(
        "only `use`, `unknown`, `predicate`, and `function` items may appear in imported modules"
    ))]
    ProblemInImport(String, #[label("problem declared here")] Span),

    #[error("cannot read module `{0}`: {1}")]
    #[diagnostic(code("QSOL4003"))]
    Read(String, String, #[label("imported here")] Span),
}

impl Error {
    fn with_offset(self, offset: u32) -> Self {
        match self {
            Self::Cycle(name, span) => Self::Cycle(name, span + offset),
            Self::ProblemInImport(name, span) => Self::ProblemInImport(name, span + offset),
            Self::Read(name, message, span) => Self::Read(name, message, span + offset),
        }
    }
}

type ReadFile = dyn FnMut(&Path) -> io::Result<Arc<str>>;

/// Loads the transitive closure of a root module's imports into a [`SourceMap`].
pub struct Loader {
    read: Box<ReadFile>,
    visited: FxHashSet<String>,
    in_progress: Vec<String>,
    ordered: Vec<(SourceName, SourceContents)>,
    // Errors keyed by the source name their span is relative to; rebased to global
    // offsets once the final source order is known.
    errors: Vec<(String, Error)>,
}

impl Loader {
    /// A loader backed by the filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::with_reader(Box::new(|path| fs::read_to_string(path).map(Arc::from)))
    }

    /// A loader with a custom file reader, used by tests and embedders.
    #[must_use]
    pub fn with_reader(read: Box<ReadFile>) -> Self {
        Self {
            read,
            visited: FxHashSet::default(),
            in_progress: Vec::new(),
            ordered: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Loads a root module given directly as text, resolving its imports relative to
    /// `dir` when provided. Returns the assembled source map, imports first, and any
    /// loader errors with spans relative to the map.
    #[must_use]
    pub fn load_root(
        mut self,
        name: impl Into<SourceName>,
        contents: impl Into<SourceContents>,
        dir: Option<&Path>,
    ) -> (SourceMap, Vec<Error>) {
        let name = name.into();
        let contents = contents.into();
        self.visited.insert(name.to_string());
        self.in_progress.push(name.to_string());
        self.load_imports(&name, &contents, dir, true);
        self.in_progress.pop();
        self.ordered.push((name, contents));

        let mut map = SourceMap::default();
        for (name, contents) in self.ordered {
            map.add(name, contents);
        }
        let errors = self
            .errors
            .into_iter()
            .map(|(source, error)| {
                let base = map.file_named(&source).map_or(0, |file| file.base);
                error.with_offset(base)
            })
            .collect();
        (map, errors)
    }

    /// Parses a module's items and recursively loads its imports. `source_name` is the
    /// name this module will carry in the final source map.
    fn load_imports(&mut self, source_name: &str, contents: &str, dir: Option<&Path>, is_root: bool) {
        // Parse errors are not reported here; the compile stage parses the same text
        // again and reports them with proper offsets.
        let (items, _) = qsolc_parse::items(contents);
        for item in &items {
            match &*item.kind {
                ItemKind::Use(path) => {
                    let module = path.joined();
                    self.load_module(source_name, &module, dir, path.span);
                }
                ItemKind::Problem(_) if !is_root => {
                    let module = self
                        .in_progress
                        .last()
                        .expect("in-progress stack should not be empty")
                        .clone();
                    self.errors
                        .push((source_name.to_string(), Error::ProblemInImport(module, item.span)));
                }
                _ => {}
            }
        }
    }

    fn load_module(&mut self, importer: &str, module: &str, dir: Option<&Path>, span: Span) {
        if self.in_progress.iter().any(|m| m == module) {
            self.errors
                .push((importer.to_string(), Error::Cycle(module.to_string(), span)));
            return;
        }
        if self.visited.contains(module) {
            return;
        }

        let (name, contents, module_dir) = if let Some(contents) = stdlib_module(module) {
            (format!("<{module}>"), contents, None)
        } else {
            let relative = module_file(module);
            let mut candidates = Vec::new();
            if let Some(dir) = dir {
                candidates.push(dir.join(&relative));
            }
            candidates.push(relative);

            let mut found = None;
            let mut last_error = String::from("file not found");
            for candidate in candidates {
                match (self.read)(&candidate) {
                    Ok(contents) => {
                        found = Some((candidate, contents));
                        break;
                    }
                    Err(error) => last_error = error.to_string(),
                }
            }
            match found {
                Some((path, contents)) => {
                    let module_dir = path.parent().map(Path::to_path_buf);
                    (path.to_string_lossy().into_owned(), contents, module_dir)
                }
                None => {
                    self.errors.push((
                        importer.to_string(),
                        Error::Read(module.to_string(), last_error, span),
                    ));
                    return;
                }
            }
        };

        self.visited.insert(module.to_string());
        self.in_progress.push(module.to_string());
        self.load_imports(&name, &contents, module_dir.as_deref(), false);
        self.in_progress.pop();
        self.ordered.push((name.into(), contents));
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads a program from a root file on disk.
#[must_use]
pub fn load_file(path: &Path) -> (SourceMap, Vec<Error>) {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let dir = path.parent().map(Path::to_path_buf);
            Loader::new().load_root(
                path.to_string_lossy().into_owned(),
                contents,
                dir.as_deref(),
            )
        }
        Err(error) => {
            let mut map = SourceMap::default();
            map.add(path.to_string_lossy().into_owned().into(), "".into());
            (
                map,
                vec![Error::Read(
                    path.to_string_lossy().into_owned(),
                    error.to_string(),
                    Span::default(),
                )],
            )
        }
    }
}

fn stdlib_module(module: &str) -> Option<SourceContents> {
    STDLIB
        .iter()
        .find(|(name, _)| *name == module)
        .map(|(_, contents)| Arc::from(*contents))
}

fn module_file(module: &str) -> PathBuf {
    let mut path = PathBuf::new();
    for part in module.split('.') {
        path.push(part);
    }
    path.set_extension("qsol");
    path
}
