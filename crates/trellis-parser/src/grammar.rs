//! The grammar match engine.
//!
//! A hand-written backtracking recognizer for the ER-diagram language. One
//! method per grammar rule; alternatives are ordered choice, first match
//! wins. Every rule evaluation snapshots `{cursor, capture count, depth}`
//! on entry and restores all three on failure, so a failed alternative
//! leaves no trace beyond the furthest-attempt marker used for error
//! reporting.
//!
//! The engine recognizes only. It appends [`MatchRecord`]s to a
//! [`CaptureStore`]; interpreting them is the job of the
//! [`builder`](crate::builder).
//!
//! Grammar sketch (ordered choice, `/` binds looser than sequence):
//!
//! ```text
//! document    := expression end-of-text        (falls back to capturing
//!                                               the unmatched tail)
//! expression  := (title-block / colors-block / relation / table-block
//!                 / comment-line / blank-line)*
//! table-block := '[' title ']' attr-block? line-end (column / blank-line)*
//! relation    := name cardinality '--' cardinality name attr-block? line-end
//! attr-block  := '{' (key ':' value sep?)* '}'
//! ```

use crate::{
    captures::{CaptureStore, FurthestAttempt, MatchRecord, Rule},
    span::Span,
};

/// Marker error for a failed rule attempt. Carries no data: everything a
/// failure needs to undo is in the snapshot, and everything a report needs
/// is in the store's furthest-attempt marker.
pub(crate) struct Backtrack;

type MatchResult = Result<(), Backtrack>;

/// Outcome of recognizing a document.
pub(crate) struct Recognition {
    pub store: CaptureStore,
    /// Present when the grammar did not cover the full input.
    pub failure: Option<Failure>,
}

/// Where recognition gave up.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Failure {
    /// The rule of the rightmost-reaching attempt.
    pub rule: Rule,
    /// The attempted span of that rule.
    pub span: Span,
    /// The single offset the error report points at: the greatest endpoint
    /// reached among all attempts.
    pub offset: usize,
}

#[derive(Clone, Copy)]
struct Snapshot {
    pos: usize,
    captured: usize,
    depth: u32,
}

/// The matcher: a cursor over the source plus the capture store.
pub(crate) struct Matcher<'src> {
    src: &'src str,
    pos: usize,
    depth: u32,
    store: CaptureStore,
}

impl<'src> Matcher<'src> {
    pub(crate) fn new(src: &'src str) -> Self {
        Self {
            src,
            pos: 0,
            depth: 0,
            store: CaptureStore::new(),
        }
    }

    /// Recognize a whole document.
    ///
    /// This cannot fail as a match: when the grammar does not cover the
    /// full input, the unmatched tail is captured as [`Rule::TrailingText`]
    /// so that even malformed input yields an error location instead of an
    /// unstructured engine failure.
    pub(crate) fn run(mut self) -> Recognition {
        let len = self.src.len();

        self.depth = 1;
        self.expression();

        let failure = if self.at_end() {
            None
        } else {
            let trailing = Span::new(self.pos..len);
            // Snapshot the furthest attempt before the diagnostic records
            // below shadow it.
            let failure = match self.store.furthest() {
                Some(FurthestAttempt { rule, span }) if span.end() >= trailing.start() => Failure {
                    rule,
                    span,
                    offset: span.end(),
                },
                _ => Failure {
                    rule: Rule::TrailingText,
                    span: trailing,
                    offset: trailing.start(),
                },
            };
            self.store.push(MatchRecord {
                rule: Rule::TrailingText,
                span: trailing,
                depth: 1,
            });
            self.pos = len;
            Some(failure)
        };

        self.depth = 0;
        self.store.push(MatchRecord {
            rule: Rule::Document,
            span: Span::new(0..len),
            depth: 0,
        });

        Recognition {
            store: self.store,
            failure,
        }
    }

    // ------------------------------------------------------------------
    // Rules
    // ------------------------------------------------------------------

    /// `expression := (title / colors / relation / table / comment / blank)*`
    ///
    /// The order is load-bearing: a comment line must be tried before the
    /// blank-line fallthrough because `#` is otherwise untyped text, and
    /// relations must be tried before table columns ever come into play.
    fn expression(&mut self) {
        while !self.at_end() {
            if self.title_block().is_ok() {
                continue;
            }
            if self.color_block().is_ok() {
                continue;
            }
            if self.relation().is_ok() {
                continue;
            }
            if self.table_block().is_ok() {
                continue;
            }
            if self.comment_line().is_ok() {
                continue;
            }
            if self.blank_line().is_ok() {
                continue;
            }
            break;
        }
    }

    /// `blank_line := ws+` — any run of spaces, tabs, and line breaks.
    fn blank_line(&mut self) -> MatchResult {
        self.recorded(Rule::BlankLine, |m| m.ws1())
    }

    /// `comment_line := space* '#' (!line-break .)* newline`
    fn comment_line(&mut self) -> MatchResult {
        self.recorded(Rule::CommentLine, |m| {
            m.space0();
            m.eat_char('#')?;
            m.skip_to_line_break();
            m.newline()
        })
    }

    /// `title_block := "title" ws* '{' ws* (attr ws* sep? ws*)* ws* '}' newline`
    fn title_block(&mut self) -> MatchResult {
        self.recorded(Rule::TitleBlock, |m| {
            m.eat_str("title")?;
            m.attribute_block_spread(Rule::TitleAttribute)?;
            m.newline()
        })
    }

    /// `color_block := "colors" ws* '{' ws* (entry ws* sep? ws*)* ws* '}' newline`
    fn color_block(&mut self) -> MatchResult {
        self.recorded(Rule::ColorBlock, |m| {
            m.eat_str("colors")?;
            m.attribute_block_spread(Rule::ColorEntry)?;
            m.newline()
        })
    }

    /// The brace block shared by `title` and `colors`: whitespace (line
    /// breaks included) may appear anywhere between entries.
    fn attribute_block_spread(&mut self, commit: Rule) -> MatchResult {
        self.ws0();
        self.eat_char('{')?;
        self.ws0();
        while self.attribute_pair(commit).is_ok() {
            self.ws0();
            let _ = self.attribute_sep();
            self.ws0();
        }
        self.ws0();
        self.eat_char('}')
    }

    /// `table_block := '[' title ']' attrs? line-end (column / blank_line)*`
    ///
    /// Blank lines after the columns are consumed here, inside the block;
    /// they end the open table scope when the builder replays them.
    fn table_block(&mut self) -> MatchResult {
        self.recorded(Rule::TableBlock, |m| {
            m.eat_char('[')?;
            m.recorded(Rule::TableTitle, Matcher::bare_string)?;
            m.eat_char(']')?;
            let _ = m.attempt(|m| {
                m.space0();
                m.eat_char('{')?;
                m.ws0();
                while m.attribute_pair(Rule::TableAttribute).is_ok() {
                    m.ws0();
                    let _ = m.attribute_sep();
                }
                m.ws0();
                m.eat_char('}')?;
                m.space0();
                Ok(())
            });
            m.newline_or_end()?;
            loop {
                if m.table_column().is_ok() {
                    continue;
                }
                if m.blank_line().is_ok() {
                    continue;
                }
                break;
            }
            Ok(())
        })
    }

    /// `table_column := space* name attrs? line-end`
    fn table_column(&mut self) -> MatchResult {
        self.recorded(Rule::TableColumn, |m| {
            m.space0();
            m.recorded(Rule::ColumnName, Matcher::bare_string)?;
            let _ = m.attempt(|m| {
                m.space0();
                m.eat_char('{')?;
                m.ws0();
                while m.attribute_pair(Rule::ColumnAttribute).is_ok() {
                    m.ws0();
                    let _ = m.attribute_sep();
                }
                m.ws0();
                m.eat_char('}')?;
                m.space0();
                Ok(())
            });
            m.newline_or_end()
        })
    }

    /// `relation := space* name space* card '--' card space* name attrs? line-end`
    fn relation(&mut self) -> MatchResult {
        self.recorded(Rule::Relation, |m| {
            m.space0();
            m.recorded(Rule::RelationLeft, Matcher::bare_string)?;
            m.space0();
            m.recorded(Rule::CardinalityLeft, Matcher::cardinality)?;
            m.eat_str("--")?;
            m.recorded(Rule::CardinalityRight, Matcher::cardinality)?;
            m.space0();
            m.recorded(Rule::RelationRight, Matcher::bare_string)?;
            let _ = m.attempt(|m| {
                m.ws0();
                m.eat_char('{')?;
                m.ws0();
                while m.attribute_pair(Rule::RelationAttribute).is_ok() {
                    m.ws0();
                    let _ = m.attribute_sep();
                    m.ws0();
                }
                m.ws0();
                m.eat_char('}')?;
                Ok(())
            });
            m.newline_or_end()
        })
    }

    /// `attribute_pair := key space* ':' space* value`, recorded under the
    /// context-specific commit rule of the enclosing block.
    fn attribute_pair(&mut self, commit: Rule) -> MatchResult {
        self.recorded(commit, |m| {
            m.recorded(Rule::AttributeKey, Matcher::bare_string)?;
            m.space0();
            m.eat_char(':')?;
            m.space0();
            m.attribute_value()
        })
    }

    /// `attribute_value := bare_value / quoted_value`
    fn attribute_value(&mut self) -> MatchResult {
        if self.recorded(Rule::BareValue, Matcher::bare_string).is_ok() {
            return Ok(());
        }
        self.recorded(Rule::QuotedValue, Matcher::quoted_string)
    }

    /// `attribute_sep := space* ',' space*`
    fn attribute_sep(&mut self) -> MatchResult {
        self.attempt(|m| {
            m.space0();
            m.eat_char(',')?;
            m.space0();
            Ok(())
        })
    }

    // ------------------------------------------------------------------
    // Character-level rules (matched, never recorded)
    // ------------------------------------------------------------------

    /// A maximal run of characters excluding whitespace, the quote, and
    /// the structural delimiters `/ : , [ ] { }`.
    fn bare_string(&mut self) -> MatchResult {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(
                c,
                '"' | '\t' | '\r' | '\n' | '/' | ':' | ',' | '[' | ']' | '{' | '}' | ' '
            ) {
                break;
            }
            self.bump(c);
        }
        if self.pos == start { Err(Backtrack) } else { Ok(()) }
    }

    /// A double-quoted run with backslash escapes. The caller's record
    /// span includes the quotes; decoding happens in the builder.
    fn quoted_string(&mut self) -> MatchResult {
        self.eat_char('"')?;
        let mut content = 0usize;
        loop {
            let Some(c) = self.peek() else {
                return Err(Backtrack);
            };
            match c {
                '"' => break,
                '\t' | '\r' | '\n' => return Err(Backtrack),
                '\\' => {
                    self.bump(c);
                    let Some(escaped) = self.peek() else {
                        return Err(Backtrack);
                    };
                    if matches!(escaped, '\t' | '\r' | '\n') {
                        return Err(Backtrack);
                    }
                    self.bump(escaped);
                    content += 1;
                }
                _ => {
                    self.bump(c);
                    content += 1;
                }
            }
        }
        if content == 0 {
            return Err(Backtrack);
        }
        self.eat_char('"')
    }

    /// `cardinality := '0' / '1' / '*' / '+'`
    fn cardinality(&mut self) -> MatchResult {
        match self.peek() {
            Some(c @ ('0' | '1' | '*' | '+')) => {
                self.bump(c);
                Ok(())
            }
            _ => Err(Backtrack),
        }
    }

    /// `newline := CRLF / LF / CR`
    fn newline(&mut self) -> MatchResult {
        if self.eat_str("\r\n").is_ok() {
            return Ok(());
        }
        if self.eat_char('\n').is_ok() {
            return Ok(());
        }
        self.eat_char('\r')
    }

    fn newline_or_end(&mut self) -> MatchResult {
        if self.at_end() { Ok(()) } else { self.newline() }
    }

    /// Zero or more spaces/tabs.
    fn space0(&mut self) {
        while let Some(c @ (' ' | '\t')) = self.peek() {
            self.bump(c);
        }
    }

    /// Zero or more spaces, tabs, and line breaks.
    fn ws0(&mut self) {
        while let Some(c @ (' ' | '\t' | '\r' | '\n')) = self.peek() {
            self.bump(c);
        }
    }

    /// One or more spaces, tabs, and line breaks.
    fn ws1(&mut self) -> MatchResult {
        let start = self.pos;
        self.ws0();
        if self.pos == start { Err(Backtrack) } else { Ok(()) }
    }

    fn skip_to_line_break(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\r' || c == '\n' {
                break;
            }
            self.bump(c);
        }
    }

    // ------------------------------------------------------------------
    // Engine plumbing
    // ------------------------------------------------------------------

    /// Run `body` as a recorded rule: on success append one record whose
    /// span covers everything `body` consumed; on failure restore cursor,
    /// capture count, and depth, keeping only the furthest-attempt marker.
    fn recorded(
        &mut self,
        rule: Rule,
        body: impl FnOnce(&mut Self) -> MatchResult,
    ) -> MatchResult {
        let snapshot = self.snapshot();
        self.depth += 1;
        let result = body(self);
        self.depth -= 1;
        match result {
            Ok(()) => {
                self.store.push(MatchRecord {
                    rule,
                    span: Span::new(snapshot.pos..self.pos),
                    depth: self.depth,
                });
                Ok(())
            }
            Err(fail) => {
                self.store
                    .note_attempt(rule, Span::new(snapshot.pos..self.pos));
                self.restore(snapshot);
                Err(fail)
            }
        }
    }

    /// Run `body` with backtracking but no record — used for optional
    /// groups that are not rules of their own.
    fn attempt(&mut self, body: impl FnOnce(&mut Self) -> MatchResult) -> MatchResult {
        let snapshot = self.snapshot();
        let result = body(self);
        if result.is_err() {
            self.restore(snapshot);
        }
        result
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            pos: self.pos,
            captured: self.store.len(),
            depth: self.depth,
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.pos = snapshot.pos;
        self.depth = snapshot.depth;
        self.store.truncate(snapshot.captured);
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self, c: char) {
        self.pos += c.len_utf8();
    }

    fn eat_char(&mut self, expected: char) -> MatchResult {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump(c);
                Ok(())
            }
            _ => Err(Backtrack),
        }
    }

    fn eat_str(&mut self, expected: &str) -> MatchResult {
        if self.src[self.pos..].starts_with(expected) {
            self.pos += expected.len();
            Ok(())
        } else {
            Err(Backtrack)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules_of(src: &str) -> Vec<Rule> {
        let recognition = Matcher::new(src).run();
        assert!(
            recognition.failure.is_none(),
            "expected {src:?} to be recognized"
        );
        recognition
            .store
            .records()
            .iter()
            .map(|r| r.rule)
            .collect()
    }

    #[test]
    fn test_empty_document() {
        let recognition = Matcher::new("").run();
        assert!(recognition.failure.is_none());
        assert_eq!(recognition.store.records().len(), 1);
        assert_eq!(recognition.store.records()[0].rule, Rule::Document);
    }

    #[test]
    fn test_table_header_records_title_before_block() {
        let rules = rules_of("[Person]\n");
        let title = rules.iter().position(|r| *r == Rule::TableTitle).unwrap();
        let block = rules.iter().position(|r| *r == Rule::TableBlock).unwrap();
        assert!(title < block, "children must precede their parent");
    }

    #[test]
    fn test_column_capture_order() {
        let rules = rules_of("[Person]\n*name\nheight\n");
        let names: Vec<&Rule> = rules.iter().filter(|r| **r == Rule::ColumnName).collect();
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_relation_captures() {
        let rules = rules_of("Person *--1 Location\n");
        assert_eq!(
            rules,
            vec![
                Rule::RelationLeft,
                Rule::CardinalityLeft,
                Rule::CardinalityRight,
                Rule::RelationRight,
                Rule::Relation,
                Rule::Document,
            ]
        );
    }

    #[test]
    fn test_relation_requires_both_cardinalities() {
        let recognition = Matcher::new("Person *-- Location\n").run();
        assert!(recognition.failure.is_some());
    }

    #[test]
    fn test_comment_requires_line_break() {
        assert!(Matcher::new("# comment\n").run().failure.is_none());
        // A comment at end-of-input without a final newline is not a
        // comment line; it surfaces as a syntax error.
        assert!(Matcher::new("# comment").run().failure.is_some());
    }

    #[test]
    fn test_comment_tried_before_blank_line() {
        let rules = rules_of("  # indented comment\n");
        assert!(rules.contains(&Rule::CommentLine));
        assert!(!rules.contains(&Rule::BlankLine));
    }

    #[test]
    fn test_table_attribute_block() {
        let rules = rules_of("[T] {bgcolor: blue, size: \"20\"}\n");
        let commits = rules
            .iter()
            .filter(|r| **r == Rule::TableAttribute)
            .count();
        assert_eq!(commits, 2);
        assert!(rules.contains(&Rule::BareValue));
        assert!(rules.contains(&Rule::QuotedValue));
    }

    #[test]
    fn test_key_and_value_precede_commit() {
        let rules = rules_of("title {label: x}\n");
        let key = rules.iter().position(|r| *r == Rule::AttributeKey).unwrap();
        let value = rules.iter().position(|r| *r == Rule::BareValue).unwrap();
        let commit = rules
            .iter()
            .position(|r| *r == Rule::TitleAttribute)
            .unwrap();
        assert!(key < value && value < commit);
    }

    #[test]
    fn test_failed_alternative_leaves_no_records() {
        // `[x` fails as a table block; the recognizer must not leak the
        // partially captured table title.
        let recognition = Matcher::new("[x").run();
        assert!(recognition.failure.is_some());
        assert!(
            !recognition
                .store
                .records()
                .iter()
                .any(|r| r.rule == Rule::TableTitle)
        );
    }

    #[test]
    fn test_failure_offset_is_rightmost() {
        // The relation attempt reaches the bad cardinality at offset 10
        // before failing; later, shallower attempts stop at offset 0.
        let recognition = Matcher::new("Person *--X Location\n").run();
        let failure = recognition.failure.unwrap();
        assert_eq!(failure.offset, 10);
    }

    #[test]
    fn test_trailing_text_captured_on_failure() {
        let recognition = Matcher::new("[Person]\n???}\n").run();
        assert!(recognition.failure.is_some());
        assert!(
            recognition
                .store
                .records()
                .iter()
                .any(|r| r.rule == Rule::TrailingText)
        );
    }

    #[test]
    fn test_depth_increases_with_nesting() {
        let recognition = Matcher::new("[T] {k: v}\n").run();
        let records = recognition.store.records();
        let depth_of = |rule: Rule| records.iter().find(|r| r.rule == rule).unwrap().depth;
        assert_eq!(depth_of(Rule::Document), 0);
        assert_eq!(depth_of(Rule::TableBlock), 1);
        assert_eq!(depth_of(Rule::TableTitle), 2);
        assert_eq!(depth_of(Rule::TableAttribute), 2);
        assert_eq!(depth_of(Rule::AttributeKey), 3);
    }

    #[test]
    fn test_crlf_line_endings() {
        let rules = rules_of("[Person]\r\n*name\r\n");
        assert!(rules.contains(&Rule::ColumnName));
    }

    #[test]
    fn test_blank_line_inside_table_block() {
        let rules = rules_of("[Person]\n*name\n\nheight\n");
        // The blank line is consumed inside the table block, and the
        // following column still matches grammatically; rejecting it is
        // the builder's job, not the grammar's.
        assert!(rules.contains(&Rule::BlankLine));
        assert_eq!(
            rules.iter().filter(|r| **r == Rule::ColumnName).count(),
            2
        );
    }
}
