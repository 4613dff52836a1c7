// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! Diagnostics that outlive their compilation unit. Instead of keeping whole source
//! files alive, [`Reported`] resolves every labeled span against the source map at
//! wrap time and captures just the covering lines, so the error can be rendered (or
//! serialized) long after the unit is gone.


use crate::compile::SourceMap;
use miette::{Diagnostic, MietteError, MietteSpanContents, SourceCode, SourceSpan, SpanContents};
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    sync::Arc,
};

/// An error detached from its compilation unit, carrying the captured source context
/// of each labeled span.
#[derive(Clone, Debug)]
pub struct Reported<E> {
    error: E,
    snippets: Vec<Snippet>,
}

/// The captured context of one labeled span: the file it points into, the source
/// lines covering the span, and where those lines sit in the global offset space.
#[derive(Clone, Debug)]
struct Snippet {
    file: Arc<str>,
    lines: Arc<str>,
    /// Global offset of the first captured byte.
    base: u32,
    /// Zero-based line number of the first captured line.
    first_line: u32,
}

impl<E: Diagnostic> Reported<E> {
    /// Wraps an error, capturing the lines behind each of its labels.
    pub fn new(sources: &SourceMap, error: E) -> Self {
        let mut snippets: Vec<Snippet> = Vec::new();
        for label in error.labels().into_iter().flatten() {
            let Ok(lo) = u32::try_from(label.offset()) else {
                continue;
            };
            let Ok(hi) = u32::try_from(label.offset() + label.len()) else {
                continue;
            };
            if snippets
                .iter()
                .any(|snippet| snippet.contains(lo) && snippet.contains(hi))
            {
                continue;
            }
            if let Some(snippet) = capture(sources, lo, hi) {
                snippets.push(snippet);
            }
        }
        Self { error, snippets }
    }

    /// The wrapped error.
    pub fn error(&self) -> &E {
        &self.error
    }
}

impl Snippet {
    fn contains(&self, offset: u32) -> bool {
        offset >= self.base && (offset - self.base) as usize <= self.lines.len()
    }
}

/// Captures the source lines covering the global range `[lo, hi)`.
fn capture(sources: &SourceMap, lo: u32, hi: u32) -> Option<Snippet> {
    let file = sources.file_at(lo)?;
    let text = file.text;
    let local_lo = ((lo - file.base) as usize).min(text.len());
    let local_hi = (hi.saturating_sub(file.base) as usize).clamp(local_lo, text.len());

    let start = text[..local_lo].rfind('\n').map_or(0, |at| at + 1);
    let end = text[local_hi..]
        .find('\n')
        .map_or(text.len(), |at| local_hi + at);
    let first_line = u32::try_from(text[..start].matches('\n').count())
        .expect("line count should fit into u32");

    Some(Snippet {
        file: Arc::from(file.name),
        lines: Arc::from(&text[start..end]),
        base: file.base + u32::try_from(start).expect("offset should fit into u32"),
        first_line,
    })
}

impl<E: Diagnostic> Error for Reported<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.error.source()
    }
}

impl<E: Display> Display for Reported<E> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(&self.error, f)
    }
}

impl<E: Diagnostic + Send + Sync> Diagnostic for Reported<E> {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        self.error.code()
    }

    fn severity(&self) -> Option<miette::Severity> {
        self.error.severity()
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        self.error.help()
    }

    fn url<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        self.error.url()
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        self.error.labels()
    }

    fn related<'a>(&'a self) -> Option<Box<dyn Iterator<Item = &'a dyn Diagnostic> + 'a>> {
        self.error.related()
    }

    fn diagnostic_source(&self) -> Option<&dyn Diagnostic> {
        self.error.diagnostic_source()
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(self)
    }
}

impl<E: Diagnostic + Send + Sync> SourceCode for Reported<E> {
    fn read_span<'a>(
        &'a self,
        span: &SourceSpan,
        _context_lines_before: usize,
        _context_lines_after: usize,
    ) -> Result<Box<dyn SpanContents<'a> + 'a>, MietteError> {
        let offset = u32::try_from(span.offset()).map_err(|_| MietteError::OutOfBounds)?;
        let snippet = self
            .snippets
            .iter()
            .find(|snippet| snippet.contains(offset))
            .ok_or(MietteError::OutOfBounds)?;

        // Serve the whole captured snippet; the requested span falls inside it.
        Ok(Box::new(MietteSpanContents::new_named(
            snippet.file.to_string(),
            snippet.lines.as_bytes(),
            SourceSpan::new((snippet.base as usize).into(), snippet.lines.len()),
            snippet.first_line as usize,
            0,
            snippet.lines.matches('\n').count() + 1,
        )))
    }
}
