//! The semantic builder.
//!
//! Replays the finished capture store in match order and assembles the
//! diagram model. Order alone is sufficient: the grammar guarantees that
//! the records of a key and its value precede the record that commits
//! them, and that every part of a relation precedes the record that
//! flushes the relation.
//!
//! All mutable "current context" — the open table, the staged key/value
//! pair, the relation under construction — lives in the builder instance
//! passed through the replay by exclusive ownership.

use trellis_core::{Cardinality, Column, Diagram, Relation, TableId, diagram::Attributes};

use crate::{
    captures::{MatchRecord, Rule},
    error::{ParseError, Result},
    span::Span,
};

/// A relation being assembled; flushed atomically by its closing record.
#[derive(Debug, Default)]
struct RelationDraft {
    left_table: Option<TableId>,
    left_cardinality: Option<Cardinality>,
    right_table: Option<TableId>,
    right_cardinality: Option<Cardinality>,
    attributes: Attributes,
}

impl RelationDraft {
    fn finish(&mut self, span: Span) -> Result<Relation> {
        let draft = std::mem::take(self);
        match (
            draft.left_table,
            draft.left_cardinality,
            draft.right_table,
            draft.right_cardinality,
        ) {
            (Some(left), Some(left_card), Some(right), Some(right_card)) => Ok(Relation::new(
                left,
                left_card,
                right,
                right_card,
                draft.attributes,
            )),
            _ => Err(ParseError::InvalidState {
                message: "relation committed before both sides were set".to_string(),
                span: Some(span),
            }),
        }
    }
}

/// Replays captures into a [`Diagram`].
pub(crate) struct Builder<'src> {
    src: &'src str,
    diagram: Diagram,
    current_table: Option<TableId>,
    key: String,
    value: String,
    relation: RelationDraft,
}

impl<'src> Builder<'src> {
    pub(crate) fn new(src: &'src str) -> Self {
        Self {
            src,
            diagram: Diagram::new(),
            current_table: None,
            key: String::new(),
            value: String::new(),
            relation: RelationDraft::default(),
        }
    }

    /// Consume the records in capture order and freeze the result.
    ///
    /// The first invalid action aborts the whole build: no partially
    /// assembled diagram is ever returned.
    pub(crate) fn build(mut self, records: &[MatchRecord]) -> Result<Diagram> {
        for record in records {
            self.apply(record)?;
        }
        self.diagram.freeze();
        Ok(self.diagram)
    }

    fn apply(&mut self, record: &MatchRecord) -> Result<()> {
        let text = record.span.text(self.src);
        match record.rule {
            Rule::BlankLine => {
                self.current_table = None;
            }
            Rule::TableTitle => {
                let id = self.diagram.add_table(text);
                log::trace!(table = id.as_str(); "opened table");
                self.current_table = Some(id);
            }
            Rule::ColumnName => {
                let Some(table) = self.current_table_mut() else {
                    return Err(ParseError::InvalidState {
                        message: format!("column `{text}` appears outside any table block"),
                        span: Some(record.span),
                    });
                };
                table.push_column(Column::new(text));
            }
            Rule::AttributeKey => {
                self.key = decode(text, record.span)?;
            }
            Rule::BareValue | Rule::QuotedValue => {
                self.value = decode(text, record.span)?;
            }
            Rule::TitleAttribute => {
                let (key, value) = self.take_pair();
                self.diagram.title_mut().set_attribute(key, value);
            }
            Rule::TableAttribute => {
                let (key, mut value) = self.take_pair();
                // Attribute values whose key mentions a color are resolved
                // through the palette; unknown names pass through verbatim.
                if key.contains("color") {
                    if let Some(resolved) = self.diagram.color(&value) {
                        value = resolved.to_string();
                    }
                }
                let Some(table) = self.current_table_mut() else {
                    return Err(ParseError::InvalidState {
                        message: format!("table attribute `{key}` with no open table"),
                        span: Some(record.span),
                    });
                };
                table.set_attribute(key, value);
            }
            Rule::ColumnAttribute => {
                let (key, value) = self.take_pair();
                let column = self
                    .current_table_mut()
                    .and_then(|table| table.last_column_mut());
                let Some(column) = column else {
                    return Err(ParseError::InvalidState {
                        message: format!("column attribute `{key}` with no open column"),
                        span: Some(record.span),
                    });
                };
                column.set_attribute(key, value);
            }
            Rule::RelationAttribute => {
                let (key, value) = self.take_pair();
                self.relation.attributes.insert(key, value);
            }
            Rule::ColorEntry => {
                let (key, value) = self.take_pair();
                self.diagram.define_color(key, value);
            }
            Rule::RelationLeft => {
                let id = TableId::sanitize(text);
                self.diagram.connect(id.as_str());
                self.relation.left_table = Some(id);
            }
            Rule::RelationRight => {
                let id = TableId::sanitize(text);
                self.diagram.connect(id.as_str());
                self.relation.right_table = Some(id);
            }
            Rule::CardinalityLeft => {
                self.relation.left_cardinality = Some(cardinality(text, record.span)?);
            }
            Rule::CardinalityRight => {
                self.relation.right_cardinality = Some(cardinality(text, record.span)?);
            }
            Rule::Relation => {
                let relation = self.relation.finish(record.span)?;
                self.diagram.push_relation(relation);
            }
            // Structural records carry no builder action.
            Rule::Document
            | Rule::TrailingText
            | Rule::CommentLine
            | Rule::ColorBlock
            | Rule::TitleBlock
            | Rule::TableBlock
            | Rule::TableColumn => {}
        }
        Ok(())
    }

    fn current_table_mut(&mut self) -> Option<&mut trellis_core::Table> {
        let id = self.current_table.as_ref()?;
        self.diagram.table_mut(id.as_str())
    }

    /// Flush the staged key/value pair.
    fn take_pair(&mut self) -> (String, String) {
        (std::mem::take(&mut self.key), std::mem::take(&mut self.value))
    }
}

fn cardinality(text: &str, span: Span) -> Result<Cardinality> {
    text.parse().map_err(|message: &str| ParseError::InvalidState {
        message: message.to_string(),
        span: Some(span),
    })
}

/// Decode a captured key or value: quoted text is un-escaped, bare text is
/// taken verbatim with no transformation.
fn decode(text: &str, span: Span) -> Result<String> {
    if text.starts_with('"') {
        unquote(text, span)
    } else {
        Ok(text.to_string())
    }
}

/// Un-escape a quoted string, surrounding quotes included.
///
/// Supported escapes: `\n \r \t \b \f \\ \/ \' \" \0` and `\u{…}` with one
/// to six hex digits. Anything else is a decode error.
fn unquote(text: &str, span: Span) -> Result<String> {
    let inner = text
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or_else(|| ParseError::QuoteDecode {
            message: "missing surrounding quotes".to_string(),
            span: Some(span),
        })?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = chars.next().ok_or_else(|| ParseError::QuoteDecode {
            message: "trailing backslash".to_string(),
            span: Some(span),
        })?;
        match escaped {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0C}'),
            '\\' => out.push('\\'),
            '/' => out.push('/'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            '0' => out.push('\0'),
            'u' => {
                if chars.next() != Some('{') {
                    return Err(ParseError::QuoteDecode {
                        message: "expected `{` after `\\u`".to_string(),
                        span: Some(span),
                    });
                }
                let mut digits = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(d) if d.is_ascii_hexdigit() && digits.len() < 6 => digits.push(d),
                        _ => {
                            return Err(ParseError::QuoteDecode {
                                message: "malformed unicode escape".to_string(),
                                span: Some(span),
                            });
                        }
                    }
                }
                let decoded = u32::from_str_radix(&digits, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| ParseError::QuoteDecode {
                        message: format!("invalid unicode escape `\\u{{{digits}}}`"),
                        span: Some(span),
                    })?;
                out.push(decoded);
            }
            other => {
                return Err(ParseError::QuoteDecode {
                    message: format!("unknown escape `\\{other}`"),
                    span: Some(span),
                });
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unquoted(text: &str) -> Result<String> {
        unquote(text, Span::new(0..text.len()))
    }

    #[test]
    fn test_unquote_plain() {
        assert_eq!(unquoted("\"test\"").unwrap(), "test");
    }

    #[test]
    fn test_unquote_escaped_quote() {
        assert_eq!(unquoted("\"a\\\"b\"").unwrap(), "a\"b");
    }

    #[test]
    fn test_unquote_common_escapes() {
        assert_eq!(unquoted("\"a\\nb\\tc\\\\d\"").unwrap(), "a\nb\tc\\d");
    }

    #[test]
    fn test_unquote_unicode_escape() {
        assert_eq!(unquoted("\"\\u{41}\"").unwrap(), "A");
        assert_eq!(unquoted("\"\\u{1F602}\"").unwrap(), "😂");
    }

    #[test]
    fn test_unquote_unknown_escape_fails() {
        let err = unquoted("\"a\\xb\"").unwrap_err();
        assert!(matches!(err, ParseError::QuoteDecode { .. }));
    }

    #[test]
    fn test_unquote_invalid_codepoint_fails() {
        assert!(unquoted("\"\\u{110000}\"").is_err());
        assert!(unquoted("\"\\u{}\"").is_err());
    }

    #[test]
    fn test_decode_bare_is_verbatim() {
        // A bare value receives no escape processing at all.
        assert_eq!(decode("a\\nb", Span::new(0..4)).unwrap(), "a\\nb");
    }
}
