//! The semantic diagram model.
//!
//! This module contains the in-memory representation of an
//! entity-relationship diagram after parsing: the optional title block,
//! tables with their columns and free-form attributes, relations between
//! tables, the named color palette, and the derived isolation list.
//!
//! The model is assembled incrementally by the parser's semantic builder
//! and frozen once parsing completes; renderers only ever see the frozen
//! form.

use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::identifier::TableId;

/// Free-form `key: value` attributes, in first-write order.
///
/// Writing an existing key again keeps its position and replaces the value.
pub type Attributes = IndexMap<String, String>;

/// Relation multiplicity on one side of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    /// `0` — exactly zero.
    Zero,
    /// `1` — exactly one.
    One,
    /// `*` — zero or more.
    ZeroOrMore,
    /// `+` — one or more.
    OneOrMore,
}

impl Cardinality {
    /// The source-level spelling of this cardinality.
    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinality::Zero => "0",
            Cardinality::One => "1",
            Cardinality::ZeroOrMore => "*",
            Cardinality::OneOrMore => "+",
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cardinality {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" => Ok(Cardinality::Zero),
            "1" => Ok(Cardinality::One),
            "*" => Ok(Cardinality::ZeroOrMore),
            "+" => Ok(Cardinality::OneOrMore),
            _ => Err("cardinality must be one of `0`, `1`, `*`, `+`"),
        }
    }
}

/// The document title block and its attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Title {
    text: String,
    attributes: Attributes,
}

impl Title {
    /// The title text. Empty when the document has no title block.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The title attributes, in first-write order.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Set or replace a title attribute.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }
}

/// A column owned by exactly one [`Table`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    title: String,
    attributes: Attributes,
}

impl Column {
    /// Create a column with the given display title and no attributes.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            attributes: Attributes::new(),
        }
    }

    /// The column's display title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The column attributes, in first-write order.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Set or replace a column attribute.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }
}

/// A table in the diagram.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    id: TableId,
    title: String,
    attributes: Attributes,
    columns: Vec<Column>,
    connected: bool,
}

impl Table {
    /// Create an empty table from its display title.
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id: TableId::sanitize(&title),
            title,
            attributes: Attributes::new(),
            columns: Vec::new(),
            connected: false,
        }
    }

    /// The sanitized identifier keying this table in the lookup map.
    pub fn id(&self) -> &TableId {
        &self.id
    }

    /// The display title as written in the source.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The table attributes, in first-write order.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Set or replace a table attribute.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// The columns in document order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Append a column, making it the table's most recent column.
    pub fn push_column(&mut self, column: Column) {
        self.columns.push(column);
    }

    /// The most recently appended column, if any.
    pub fn last_column_mut(&mut self) -> Option<&mut Column> {
        self.columns.last_mut()
    }

    /// Whether any relation references this table.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Mark this table as referenced by a relation.
    pub fn connect(&mut self) {
        self.connected = true;
    }
}

/// A relation between two tables.
///
/// The table names are stored in sanitized form and are not required to
/// refer to declared tables: a relation may name a table the document never
/// declares, in which case no table entry is created for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    left_table: TableId,
    left_cardinality: Cardinality,
    right_table: TableId,
    right_cardinality: Cardinality,
    attributes: Attributes,
}

impl Relation {
    /// Create a relation between two table identifiers.
    pub fn new(
        left_table: TableId,
        left_cardinality: Cardinality,
        right_table: TableId,
        right_cardinality: Cardinality,
        attributes: Attributes,
    ) -> Self {
        Self {
            left_table,
            left_cardinality,
            right_table,
            right_cardinality,
            attributes,
        }
    }

    /// The sanitized identifier on the left-hand side.
    pub fn left_table(&self) -> &TableId {
        &self.left_table
    }

    /// The multiplicity on the left-hand side.
    pub fn left_cardinality(&self) -> Cardinality {
        self.left_cardinality
    }

    /// The sanitized identifier on the right-hand side.
    pub fn right_table(&self) -> &TableId {
        &self.right_table
    }

    /// The multiplicity on the right-hand side.
    pub fn right_cardinality(&self) -> Cardinality {
        self.right_cardinality
    }

    /// The relation attributes, in first-write order.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

/// One `[Title]` header in declaration order.
///
/// The declaration list is kept separately from the table lookup map
/// because two declared titles may sanitize to the same identifier; the
/// lookup map then holds only the most recent declaration while this list
/// retains both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Declaration {
    id: TableId,
    title: String,
}

impl Declaration {
    /// The sanitized identifier of the declared table.
    pub fn id(&self) -> &TableId {
        &self.id
    }

    /// The display title as written in the source.
    pub fn title(&self) -> &str {
        &self.title
    }
}

/// The complete entity-relationship diagram model.
///
/// A `Diagram` is built incrementally by the parser and frozen with
/// [`Diagram::freeze`] once parsing completes; the isolation list is only
/// meaningful on a frozen diagram.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagram {
    title: Title,
    tables: IndexMap<TableId, Table>,
    declarations: Vec<Declaration>,
    relations: Vec<Relation>,
    palette: IndexMap<String, String>,
    isolated: Vec<TableId>,
}

impl Diagram {
    /// Create an empty diagram.
    pub fn new() -> Self {
        Self::default()
    }

    /// The title block view.
    pub fn title(&self) -> &Title {
        &self.title
    }

    /// Mutable access to the title block.
    pub fn title_mut(&mut self) -> &mut Title {
        &mut self.title
    }

    /// Declare a table, returning its sanitized identifier.
    ///
    /// A later declaration whose title sanitizes to an existing identifier
    /// replaces that entry in the lookup map; the declaration list retains
    /// both titles.
    pub fn add_table(&mut self, title: &str) -> TableId {
        let table = Table::new(title);
        let id = table.id().clone();
        self.declarations.push(Declaration {
            id: id.clone(),
            title: title.to_string(),
        });
        self.tables.insert(id.clone(), table);
        id
    }

    /// Look up a table by sanitized identifier.
    pub fn table(&self, id: &str) -> Option<&Table> {
        self.tables.get(id)
    }

    /// Mutable lookup by sanitized identifier.
    pub fn table_mut(&mut self, id: &str) -> Option<&mut Table> {
        self.tables.get_mut(id)
    }

    /// The tables in the lookup map, in first-declaration order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// Number of distinct table identifiers.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Every `[Title]` header in declaration order, collisions included.
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Mark the named table as referenced by a relation.
    ///
    /// Unknown identifiers are ignored: relations may reference tables the
    /// document never declares.
    pub fn connect(&mut self, id: &str) {
        if let Some(table) = self.tables.get_mut(id) {
            table.connect();
        }
    }

    /// Append a completed relation.
    pub fn push_relation(&mut self, relation: Relation) {
        self.relations.push(relation);
    }

    /// The relations in document order.
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// Define a named color in the palette.
    pub fn define_color(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.palette.insert(name.into(), value.into());
    }

    /// Look up a named color.
    pub fn color(&self, name: &str) -> Option<&str> {
        self.palette.get(name).map(String::as_str)
    }

    /// The full palette, in definition order.
    pub fn palette(&self) -> &IndexMap<String, String> {
        &self.palette
    }

    /// Tables never referenced by any relation, in declaration order.
    ///
    /// Empty until [`Diagram::freeze`] has run.
    pub fn isolated(&self) -> &[TableId] {
        &self.isolated
    }

    /// Compute the isolation list and seal the model.
    ///
    /// Walks the declarations in order and collects every identifier whose
    /// table was never marked connected. Identifiers declared more than
    /// once are collected once.
    pub fn freeze(&mut self) {
        self.isolated.clear();
        for declaration in &self.declarations {
            if self.isolated.contains(declaration.id()) {
                continue;
            }
            if let Some(table) = self.tables.get(declaration.id()) {
                if !table.is_connected() {
                    self.isolated.push(declaration.id().clone());
                }
            }
        }
        log::debug!(
            tables = self.tables.len(),
            relations = self.relations.len(),
            isolated = self.isolated.len();
            "Diagram frozen"
        );
    }
}
