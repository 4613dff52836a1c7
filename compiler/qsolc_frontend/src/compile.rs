// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

#[cfg(test)]
mod tests;

use crate::{elaborate, loader, resolve, typeck, validate};
use miette::{Diagnostic, MietteError, MietteSpanContents, SourceCode, SourceSpan, SpanContents};
use qsolc_ast::{
    assigner::Assigner,
    ast::{Item, Program},
    mut_visit::MutVisitor,
};
use qsolc_data_structures::{
    line_column::{position, Position},
    span::Span,
};
use std::sync::Arc;
use thiserror::Error;

/// The output of compiling one QSOL program: the elaborated AST, the name and type
/// tables, the sources the spans refer to, and the diagnostics collected by each stage.
/// Stages after the first failing stage do not run, so a unit with errors carries the
/// artifacts of the stages that completed.
#[derive(Debug, Default)]
pub struct CompileUnit {
    pub program: Program,
    pub names: resolve::Names,
    pub tys: typeck::Table,
    pub sources: SourceMap,
    pub errors: Vec<Error>,
}

pub type SourceName = Arc<str>;

pub type SourceContents = Arc<str>;

/// The source files of one compilation, packed into a single global offset space so a
/// span is just an integer pair. Names, texts, and base offsets are kept as parallel
/// columns; the base column is ascending, so offset lookups are a binary search.
///
/// Each file owns the inclusive offset range `[base, base + len]`. The extra offset at
/// the end keeps EOF spans attributable to the file they terminate and separates the
/// file from the next one's first byte.
#[derive(Clone, Debug, Default)]
pub struct SourceMap {
    names: Vec<SourceName>,
    texts: Vec<SourceContents>,
    bases: Vec<u32>,
}

/// A borrowed view of one file in a [`SourceMap`].
#[derive(Clone, Copy, Debug)]
pub struct SourceFile<'a> {
    /// The file's name as given to the loader.
    pub name: &'a str,
    /// The file's text.
    pub text: &'a str,
    /// The global offset of the file's first byte.
    pub base: u32,
}

impl SourceMap {
    pub fn new(sources: impl IntoIterator<Item = (SourceName, SourceContents)>) -> Self {
        let mut map = Self::default();
        for (name, contents) in sources {
            map.add(name, contents);
        }
        map
    }

    /// Appends a file and returns its base offset.
    pub fn add(&mut self, name: SourceName, contents: SourceContents) -> u32 {
        let base = match (self.bases.last(), self.texts.last()) {
            (Some(&base), Some(text)) => {
                base + u32::try_from(text.len()).expect("source should fit into u32") + 1
            }
            _ => 0,
        };
        self.names.push(name);
        self.texts.push(contents);
        self.bases.push(base);
        base
    }

    /// The file containing the given global offset.
    #[must_use]
    pub fn file_at(&self, offset: u32) -> Option<SourceFile<'_>> {
        self.index_of(offset).map(|index| self.file(index))
    }

    /// The file with the given name.
    #[must_use]
    pub fn file_named(&self, name: &str) -> Option<SourceFile<'_>> {
        let index = self.names.iter().position(|n| n.as_ref() == name)?;
        Some(self.file(index))
    }

    /// All files, in load order.
    pub fn files(&self) -> impl Iterator<Item = SourceFile<'_>> {
        (0..self.names.len()).map(|index| self.file(index))
    }

    /// Resolves a global offset to its file and 1-based position within it.
    #[must_use]
    pub fn locate(&self, offset: u32) -> Option<(SourceFile<'_>, Position)> {
        let file = self.file_at(offset)?;
        let at = position(file.text, offset - file.base);
        Some((file, at))
    }

    fn index_of(&self, offset: u32) -> Option<usize> {
        self.bases
            .partition_point(|&base| base <= offset)
            .checked_sub(1)
    }

    fn file(&self, index: usize) -> SourceFile<'_> {
        SourceFile {
            name: &self.names[index],
            text: &self.texts[index],
            base: self.bases[index],
        }
    }
}

impl SourceCode for SourceMap {
    fn read_span<'a>(
        &'a self,
        span: &SourceSpan,
        context_lines_before: usize,
        context_lines_after: usize,
    ) -> Result<Box<dyn SpanContents<'a> + 'a>, MietteError> {
        let offset = u32::try_from(span.offset()).map_err(|_| MietteError::OutOfBounds)?;
        let index = self.index_of(offset).ok_or(MietteError::OutOfBounds)?;
        let base = self.bases[index] as usize;
        let local = SourceSpan::new((span.offset() - base).into(), span.len());
        let contents =
            self.texts[index].read_span(&local, context_lines_before, context_lines_after)?;
        let global = SourceSpan::new(
            (contents.span().offset() + base).into(),
            contents.span().len(),
        );
        Ok(Box::new(MietteSpanContents::new_named(
            self.names[index].to_string(),
            contents.data(),
            global,
            contents.line(),
            contents.column(),
            contents.line_count(),
        )))
    }
}

#[derive(Clone, Debug, Diagnostic, Error)]
#[diagnostic(transparent)]
#[error(transparent)]
pub struct Error(pub(super) ErrorKind);

#[derive(Clone, Debug, Diagnostic, Error)]
#[diagnostic(transparent)]
pub(super) enum ErrorKind {
    #[error("syntax error")]
    Parse(#[from] qsolc_parse::Error),
    #[error("module error")]
    Loader(#[from] loader::Error),
    #[error("elaboration error")]
    Elaborate(#[from] elaborate::Error),
    #[error("name error")]
    Resolve(#[from] resolve::Error),
    #[error("type error")]
    Type(#[from] typeck::Error),
    #[error("validation error")]
    Validate(#[from] validate::Error),
}

impl From<loader::Error> for Error {
    fn from(error: loader::Error) -> Self {
        Error(ErrorKind::Loader(error))
    }
}

/// Compiles the sources of one program. Stages run in order and the pipeline stops at
/// the first stage that reports errors; `pre_errors` carries diagnostics produced before
/// compilation proper (module loading), which also stop the pipeline after parsing.
#[must_use]
pub fn compile(sources: SourceMap, pre_errors: Vec<Error>) -> CompileUnit {
    let (mut program, parse_errors) = parse_all(&sources);

    let mut errors: Vec<Error> = pre_errors;
    errors.extend(
        parse_errors
            .into_iter()
            .map(|e| Error(ErrorKind::Parse(e))),
    );
    if !errors.is_empty() {
        return CompileUnit {
            program,
            sources,
            errors,
            ..CompileUnit::default()
        };
    }

    let mut assigner = Assigner::new();
    assigner.visit_program(&mut program);

    let elab_errors = elaborate::elaborate(&mut program, &mut assigner);
    if !elab_errors.is_empty() {
        return CompileUnit {
            program,
            sources,
            errors: collect(elab_errors, ErrorKind::Elaborate),
            ..CompileUnit::default()
        };
    }

    let (names, resolve_errors) = resolve::resolve(&program);
    if !resolve_errors.is_empty() {
        return CompileUnit {
            program,
            names,
            sources,
            errors: collect(resolve_errors, ErrorKind::Resolve),
            ..CompileUnit::default()
        };
    }

    let (tys, ty_errors) = typeck::check(&program, &names);
    if !ty_errors.is_empty() {
        return CompileUnit {
            program,
            names,
            tys,
            sources,
            errors: collect(ty_errors, ErrorKind::Type),
        };
    }

    let validate_errors = validate::validate(&program, &names, &tys);
    let errors = collect(validate_errors, ErrorKind::Validate);
    CompileUnit {
        program,
        names,
        tys,
        sources,
        errors,
    }
}

fn collect<E>(errors: Vec<E>, wrap: impl Fn(E) -> ErrorKind) -> Vec<Error> {
    errors.into_iter().map(|e| Error(wrap(e))).collect()
}

fn parse_all(sources: &SourceMap) -> (Program, Vec<qsolc_parse::Error>) {
    let mut items: Vec<Item> = Vec::new();
    let mut errors = Vec::new();
    for file in sources.files() {
        let (mut file_items, file_errors) = qsolc_parse::items(file.text);
        let mut offsetter = Offsetter(file.base);
        for item in &mut file_items {
            offsetter.visit_item(item);
        }
        items.extend(file_items);
        errors.extend(file_errors.into_iter().map(|e| e.with_offset(file.base)));
    }

    (
        Program {
            id: qsolc_ast::ast::NodeId::default(),
            items: items.into_boxed_slice(),
        },
        errors,
    )
}

pub(super) struct Offsetter(pub(super) u32);

impl MutVisitor for Offsetter {
    fn visit_span(&mut self, span: &mut Span) {
        span.lo += self.0;
        span.hi += self.0;
    }
}
