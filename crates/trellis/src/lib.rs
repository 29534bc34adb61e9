//! # Trellis
//!
//! A small language for describing entity-relationship diagrams, compiled
//! to Graphviz dot. This crate ties the pipeline together:
//!
//! 1. **Parse** — [`trellis_parser`] turns source text into the frozen
//!    [`Diagram`] model.
//! 2. **Render** — [`render_dot`] (behind the `graphviz` feature) turns
//!    the model into dot source for Graphviz to lay out.
//!
//! ## Usage
//!
//! ```
//! # fn main() -> Result<(), trellis::TrellisError> {
//! let source = "\
//! [Customer]
//! *id
//! name
//!
//! [Order]
//! *id
//! +customer_id
//!
//! Customer 1--* Order
//! ";
//!
//! let diagram = trellis::parse(source)?;
//! assert_eq!(diagram.table_count(), 2);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
#[cfg(feature = "graphviz")]
pub mod export;

pub use config::AppConfig;
pub use error::TrellisError;

pub use trellis_core::{
    Cardinality, Column, Declaration, Diagram, Relation, Table, TableId, Title,
};
pub use trellis_parser::ParseError;

/// Parse source text into a frozen diagram model.
///
/// Thin wrapper over [`trellis_parser::parse`] that keeps the source text
/// alongside a failure, so callers can render reports with snippets.
///
/// # Errors
///
/// Returns [`TrellisError::Parse`] wrapping the structured
/// [`ParseError`] on any syntax, invalid-state, or quote-decoding failure.
pub fn parse(source: &str) -> Result<Diagram, TrellisError> {
    trellis_parser::parse(source).map_err(|err| TrellisError::new_parse_error(err, source))
}

/// Render a frozen diagram as Graphviz dot source.
#[cfg(feature = "graphviz")]
pub fn render_dot(diagram: &Diagram, config: &AppConfig) -> String {
    export::dot::render(diagram, config)
}
