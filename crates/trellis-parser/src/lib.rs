//! # Trellis Parser
//!
//! Parser for the Trellis entity-relationship diagram language. This crate
//! provides the pipeline from source text to the semantic diagram model
//! defined in [`trellis_core`].
//!
//! Parsing runs in two phases:
//!
//! 1. **Recognize** — a backtracking grammar matcher walks the source and
//!    records every successful rule match as a flat, depth-tagged capture
//!    sequence. Failed alternatives are fully undone; only the rightmost
//!    attempt is remembered, for error reporting.
//! 2. **Build** — the semantic builder replays the captures in match order
//!    and assembles the [`Diagram`](trellis_core::Diagram), tracking the
//!    open table, the staged attribute pair, and the relation under
//!    construction.
//!
//! ## Usage
//!
//! ```
//! let source = "\
//! [Person]
//! *name
//! height
//!
//! [Location]
//! *id
//!
//! Person *--1 Location
//! ";
//!
//! let diagram = trellis_parser::parse(source).unwrap();
//! assert_eq!(diagram.table_count(), 2);
//! assert_eq!(diagram.relations().len(), 1);
//! ```

mod builder;
mod captures;
mod forest;
mod grammar;
pub mod position;

pub mod error;
mod span;

pub use error::ParseError;
pub use span::Span;

use trellis_core::Diagram;

use crate::grammar::Matcher;

/// Parse source text into a frozen diagram model.
///
/// On success the returned model is complete and sealed: the isolation
/// list is computed and nothing mutates it afterwards. On failure no
/// partial model escapes.
///
/// # Errors
///
/// - [`ParseError::Syntax`] when the grammar cannot match the full input;
///   the error carries the rightmost-reaching failed span and a rendered
///   source window.
/// - [`ParseError::InvalidState`] when a semantic action runs outside its
///   required context (e.g. a column line with no open table).
/// - [`ParseError::QuoteDecode`] when a quoted key or value holds a
///   malformed escape sequence.
pub fn parse(source: &str) -> Result<Diagram, ParseError> {
    // Phase 1: recognize.
    let recognition = Matcher::new(source).run();
    if let Some(failure) = recognition.failure {
        let at = position::locate(source, failure.offset);
        log::debug!(
            rule = failure.rule.name(),
            line = at.line,
            column = at.column;
            "recognition failed"
        );
        return Err(ParseError::Syntax {
            rule: failure.rule.name(),
            span: failure.span,
            offset: failure.offset,
            line: at.line,
            column: at.column,
            window: position::window(source, failure.offset),
        });
    }

    // Phase 2: replay captures into the model.
    let diagram = builder::Builder::new(source).build(recognition.store.records())?;
    log::debug!(
        tables = diagram.table_count(),
        relations = diagram.relations().len();
        "parse complete"
    );
    Ok(diagram)
}

/// Render the reconstructed parse forest of a document, for debugging
/// grammar behavior. Works on malformed input too (the unmatched tail
/// shows up as trailing text). The output format is not a stable contract.
pub fn syntax_tree(source: &str) -> String {
    let recognition = Matcher::new(source).run();
    let nodes = forest::reconstruct(recognition.store.records());
    forest::pretty(&nodes, source)
}
