//! Diagram exporters.
//!
//! The only exporter is [`dot`]: layout itself is delegated to Graphviz,
//! which consumes the emitted graph description.

pub mod dot;
