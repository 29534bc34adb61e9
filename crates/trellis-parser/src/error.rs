//! Parse error types.
//!
//! Three kinds of failure can end a parse:
//!
//! - [`ParseError::Syntax`] — the grammar could not match the full input.
//!   Carries the rightmost-reaching failed span, its translated position,
//!   and a rendered source window bracketing the unmatched region.
//! - [`ParseError::InvalidState`] — a semantic action ran out of its
//!   required context (a column with no open table). An input-contract
//!   violation, not a grammar failure; no window is rendered.
//! - [`ParseError::QuoteDecode`] — a quoted key or value failed to
//!   un-escape. Same unrecoverable category as `InvalidState`.
//!
//! No partial diagram ever escapes a failed parse, and there is no retry
//! logic anywhere in this crate.

use thiserror::Error;

use crate::span::Span;

/// Error type for the parsing lifecycle.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The input does not conform to the grammar.
    #[error("syntax error near {rule} at line {line}, column {column}")]
    Syntax {
        /// Name of the rightmost-reaching failed rule.
        rule: &'static str,
        /// The attempted span of that rule.
        span: Span,
        /// Byte offset of the greatest endpoint reached by any attempt.
        offset: usize,
        /// 1-based line of `offset`.
        line: usize,
        /// 1-based column of `offset`.
        column: usize,
        /// The rendered source window (see [`crate::position::window`]).
        window: String,
    },

    /// A semantic action executed out of its required context.
    #[error("invalid state: {message}")]
    InvalidState {
        message: String,
        /// The capture that triggered the action, when known.
        span: Option<Span>,
    },

    /// A quoted string failed to un-escape.
    #[error("malformed quoted string: {message}")]
    QuoteDecode {
        message: String,
        /// The quoted capture, when known.
        span: Option<Span>,
    },
}

impl ParseError {
    /// The source span associated with this error, if any.
    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::Syntax { span, .. } => Some(*span),
            ParseError::InvalidState { span, .. } | ParseError::QuoteDecode { span, .. } => *span,
        }
    }

    /// The rendered error window. Only syntax errors carry one.
    pub fn window(&self) -> Option<&str> {
        match self {
            ParseError::Syntax { window, .. } => Some(window),
            _ => None,
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, ParseError::Syntax { .. })
    }
}

/// A type alias for `Result<T, ParseError>`.
pub type Result<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_display_carries_position() {
        let err = ParseError::Syntax {
            rule: "relation",
            span: Span::new(0..10),
            offset: 10,
            line: 1,
            column: 11,
            window: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "syntax error near relation at line 1, column 11"
        );
        assert!(err.is_syntax());
    }

    #[test]
    fn test_only_syntax_errors_render_a_window() {
        let err = ParseError::InvalidState {
            message: "column with no open table".to_string(),
            span: None,
        };
        assert!(err.window().is_none());
        assert!(!err.is_syntax());
    }
}
