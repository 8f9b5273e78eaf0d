use std::fmt;
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use thiserror::Error;

/// What went wrong. Errors of the first four kinds abort the page; the
/// directive kinds are only ever reported as warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed, unterminated or incomplete front matter.
    MetadataParse,
    /// A code fence or callout that is never closed.
    UnterminatedBlock,
    /// A reference-style link with no matching definition.
    UnresolvedReference,
    /// Two definitions for the same label under a strict policy.
    DuplicateDefinition,
    MalformedDirective,
    UnknownDirective,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MetadataParse => "metadata-parse",
            ErrorKind::UnterminatedBlock => "unterminated-block",
            ErrorKind::UnresolvedReference => "unresolved-reference",
            ErrorKind::DuplicateDefinition => "duplicate-definition",
            ErrorKind::MalformedDirective => "malformed-directive",
            ErrorKind::UnknownDirective => "unknown-directive",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse errors with source location information.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Range<usize>,
    /// 1-based line of `span.start`.
    pub line: usize,
    pub file_id: usize,
    pub severity: Severity,
    pub notes: Vec<String>,
}

impl ParseError {
    pub fn error(
        kind: ErrorKind,
        message: impl Into<String>,
        span: Range<usize>,
        line: usize,
        file_id: usize,
    ) -> Self {
        ParseError {
            kind,
            message: message.into(),
            span,
            line,
            file_id,
            severity: Severity::Error,
            notes: Vec::new(),
        }
    }

    pub fn warning(
        kind: ErrorKind,
        message: impl Into<String>,
        span: Range<usize>,
        line: usize,
        file_id: usize,
    ) -> Self {
        ParseError {
            severity: Severity::Warning,
            ..ParseError::error(kind, message, span, line, file_id)
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::new(self.severity)
            .with_code(self.kind.as_str())
            .with_message(&self.message)
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
            .with_notes(self.notes.clone())
    }
}

/// Convert a byte offset in `source` to a 1-based line number.
pub fn line_of(source: &str, offset: usize) -> usize {
    source.as_bytes()[..offset.min(source.len())]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}
