//! Error types for Trellis operations.
//!
//! [`TrellisError`] wraps the error conditions of the full pipeline. The
//! `Parse` variant keeps the source text alongside the structured
//! [`ParseError`] so that callers (the CLI in particular) can render rich
//! reports with source snippets.

use std::io;

use thiserror::Error;

use trellis_parser::ParseError;

/// The main error type for Trellis operations.
#[derive(Debug, Error)]
pub enum TrellisError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },
}

impl TrellisError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }

    /// The underlying parse error and its source, when this is one.
    pub fn as_parse_error(&self) -> Option<(&ParseError, &str)> {
        match self {
            TrellisError::Parse { err, src } => Some((err, src)),
            TrellisError::Io(_) => None,
        }
    }
}
