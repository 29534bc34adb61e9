//! Sanitized table identifiers.
//!
//! Table identifiers are derived from the display title written in the
//! source document: every character outside `[A-Za-z0-9_]` is replaced
//! with an underscore. The sanitized form is what keys the table lookup
//! map and what relations refer to.

use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Serialize};

/// A sanitized table identifier.
///
/// Sanitization is a pure function of the display title and is idempotent:
/// sanitizing an already-sanitized identifier returns it unchanged.
///
/// # Examples
///
/// ```
/// use trellis_core::TableId;
///
/// let id = TableId::sanitize("Person");
/// assert_eq!(id, "Person");
///
/// let id = TableId::sanitize("order-line.item");
/// assert_eq!(id, "order_line_item");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(String);

impl TableId {
    /// Derive an identifier from a display title.
    ///
    /// Every character outside `[A-Za-z0-9_]` is replaced with `_`.
    pub fn sanitize(title: &str) -> Self {
        Self(
            title
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
                .collect(),
        )
    }

    /// View the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for TableId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for TableId {
    /// Allows direct comparison with string slices: `id == "string"`
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TableId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
