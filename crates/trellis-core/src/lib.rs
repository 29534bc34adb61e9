//! Trellis Core Types and Definitions
//!
//! This crate provides the foundational types for the Trellis
//! entity-relationship diagram language. It includes:
//!
//! - **Identifiers**: Sanitized table identifiers ([`identifier::TableId`])
//! - **Diagram**: The semantic diagram model ([`diagram`] module) — tables,
//!   columns, relations, the title block, and the color palette

pub mod diagram;
pub mod identifier;

pub use diagram::{Cardinality, Column, Declaration, Diagram, Relation, Table, Title};
pub use identifier::TableId;
