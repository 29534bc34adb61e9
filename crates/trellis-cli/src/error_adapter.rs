//! Error adapter for converting TrellisError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error
//! types and miette's rich diagnostic formatting used in the CLI. Parse
//! errors carry source spans and render with a source snippet; other
//! errors render plainly.

use std::{error::Error as _, fmt};

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use trellis::TrellisError;
use trellis_parser::{ParseError, Span};

/// Adapter for a parse error with its source text.
pub struct ParseErrorAdapter<'a> {
    err: &'a ParseError,
    src: &'a str,
}

impl<'a> ParseErrorAdapter<'a> {
    /// Create a new parse error adapter.
    pub fn new(err: &'a ParseError, src: &'a str) -> Self {
        Self { err, src }
    }

    fn label_message(&self) -> String {
        match self.err {
            ParseError::Syntax { rule, .. } => format!("could not match {rule} here"),
            ParseError::InvalidState { .. } | ParseError::QuoteDecode { .. } => {
                "triggered here".to_string()
            }
        }
    }
}

impl fmt::Debug for ParseErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseErrorAdapter")
            .field("err", &self.err)
            .finish()
    }
}

impl fmt::Display for ParseErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.err)
    }
}

impl std::error::Error for ParseErrorAdapter<'_> {}

impl MietteDiagnostic for ParseErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self.err {
            ParseError::Syntax { .. } => "trellis::syntax",
            ParseError::InvalidState { .. } => "trellis::invalid_state",
            ParseError::QuoteDecode { .. } => "trellis::quote_decode",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        None
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.err.span()?;
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.err.span()?;
        let label = LabeledSpan::new_primary_with_span(
            Some(self.label_message()),
            span_to_miette(span),
        );
        Some(Box::new(std::iter::once(label)))
    }
}

/// Adapter for non-parse [`TrellisError`] variants.
pub struct ErrorAdapter<'a>(pub &'a TrellisError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match &self.0 {
            TrellisError::Io(_) => Some(Box::new("trellis::io")),
            TrellisError::Parse { .. } => None,
        }
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A parse error with source location information.
    Parse(ParseErrorAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Parse(p) => fmt::Display::fmt(p, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Parse(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Parse(p) => p.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Parse(p) => p.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Parse(p) => p.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Parse(p) => p.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Convert a [`Span`] to a miette [`SourceSpan`].
fn span_to_miette(span: Span) -> SourceSpan {
    SourceSpan::new(span.start().into(), span.len())
}

/// Convert a [`TrellisError`] into a list of reportable errors.
pub fn to_reportables(err: &TrellisError) -> Vec<Reportable<'_>> {
    match err.as_parse_error() {
        Some((parse_err, src)) => vec![Reportable::Parse(ParseErrorAdapter::new(parse_err, src))],
        None => vec![Reportable::Error(ErrorAdapter(err))],
    }
}
