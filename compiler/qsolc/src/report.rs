// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! Serializable diagnostic reports. `explain.json` carries every diagnostic of a run
//! in a stable shape: severity, code, message, resolved span (file, byte range, line,
//! column), notes, and help.


use miette::{Diagnostic, SpanContents as _};
use qsolc_data_structures::line_column::position;
use qsolc_frontend::compile::SourceMap;
use serde::Serialize;

/// A resolved source location.
#[derive(Clone, Debug, Serialize)]
pub struct SpanEntry {
    pub file: String,
    pub byte_start: u32,
    pub byte_end: u32,
    pub line: u32,
    pub col: u32,
}

/// One diagnostic in its serializable form.
#[derive(Clone, Debug, Serialize)]
pub struct DiagnosticEntry {
    pub severity: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<SpanEntry>,
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

/// The `explain.json` document.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ExplainFile {
    pub diagnostics: Vec<DiagnosticEntry>,
}

/// Converts a diagnostic, resolving its primary span against the source map.
#[must_use]
pub fn entry(diagnostic: &dyn Diagnostic, sources: &SourceMap) -> DiagnosticEntry {
    let severity = match diagnostic.severity() {
        Some(miette::Severity::Warning) => "warning",
        Some(miette::Severity::Advice) => "info",
        _ => "error",
    };

    let span = diagnostic.labels().and_then(|mut labels| {
        let label = labels.next()?;
        let start = u32::try_from(label.offset()).ok()?;
        let end = u32::try_from(label.offset() + label.len()).ok()?;

        // Prefer the source context the diagnostic itself carries (errors that
        // escaped their compilation unit); fall back to the caller's source map.
        let source_span = miette::SourceSpan::from(label.offset()..label.offset() + label.len());
        if let Some(resolved) = diagnostic
            .source_code()
            .and_then(|code| code.read_span(&source_span, 0, 0).ok())
        {
            // The resolved contents start at a line boundary at or before the label;
            // walk the remaining distance to the label within them.
            let data_base = u32::try_from(resolved.span().offset()).ok()?;
            let text = std::str::from_utf8(resolved.data()).ok()?;
            let within = position(text, start.saturating_sub(data_base));
            let line = u32::try_from(resolved.line()).unwrap_or(0) + within.line;
            let col = if within.line == 1 {
                u32::try_from(resolved.column()).unwrap_or(0) + within.column
            } else {
                within.column
            };
            return Some(SpanEntry {
                file: resolved.name().unwrap_or("<unknown>").to_string(),
                byte_start: start,
                byte_end: end,
                line,
                col,
            });
        }

        let (file, at) = sources.locate(start)?;
        Some(SpanEntry {
            file: file.name.to_string(),
            byte_start: start - file.base,
            byte_end: end - file.base,
            line: at.line,
            col: at.column,
        })
    });

    let notes = diagnostic
        .labels()
        .into_iter()
        .flatten()
        .skip(1)
        .filter_map(|label| label.label().map(ToString::to_string))
        .collect();

    DiagnosticEntry {
        severity,
        code: diagnostic.code().map(|code| code.to_string()),
        message: diagnostic.to_string(),
        span,
        notes,
        help: diagnostic.help().map(|help| help.to_string()),
    }
}

/// A single-line rendering for the textual log: `error[CODE]: message --> file:line:col`.
#[must_use]
pub fn render_line(entry: &DiagnosticEntry) -> String {
    let mut line = String::new();
    line.push_str(entry.severity);
    if let Some(code) = &entry.code {
        line.push_str(&format!("[{code}]"));
    }
    line.push_str(": ");
    line.push_str(&entry.message);
    if let Some(span) = &entry.span {
        line.push_str(&format!(" --> {}:{}:{}", span.file, span.line, span.col));
    }
    line
}
