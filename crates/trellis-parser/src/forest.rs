//! Parse forest reconstruction.
//!
//! The match engine records a flat, depth-tagged sequence; this module
//! rebuilds the properly nested forest from it after the fact. Because
//! records are appended when their rule completes, children always precede
//! their parent, so a single pass with a stack suffices: each incoming
//! record adopts the completed nodes its span contains.
//!
//! Reconstruction is a pure function of the finished store — no engine
//! state — and running it twice yields an identical forest. Nothing in
//! the semantic pipeline depends on it; it exists for diagnostics (see
//! [`syntax_tree`](crate::syntax_tree)).

use std::fmt::Write as _;

use crate::captures::MatchRecord;

/// One node of the reconstructed forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ForestNode {
    pub record: MatchRecord,
    pub children: Vec<ForestNode>,
}

/// Rebuild the forest from a finished capture store.
pub(crate) fn reconstruct(records: &[MatchRecord]) -> Vec<ForestNode> {
    let mut stack: Vec<ForestNode> = Vec::new();
    for &record in records {
        if record.span.is_empty() {
            continue;
        }
        let mut first = stack.len();
        while first > 0 && record.span.contains(stack[first - 1].record.span) {
            first -= 1;
        }
        let children = stack.split_off(first);
        stack.push(ForestNode { record, children });
    }
    stack
}

/// Pretty-print a forest with source excerpts.
///
/// Sub-ranges of a parent not covered by any child are shown as `(gap)`
/// lines, so the print accounts for every character the parent matched.
pub(crate) fn pretty(nodes: &[ForestNode], src: &str) -> String {
    let mut out = String::new();
    for node in nodes {
        pretty_node(node, src, 0, &mut out);
    }
    out
}

fn pretty_node(node: &ForestNode, src: &str, indent: usize, out: &mut String) {
    let span = node.record.span;
    let _ = writeln!(
        out,
        "{:indent$}{} {:?}",
        "",
        node.record.rule.name(),
        span.text(src),
    );

    let mut cursor = span.start();
    for child in &node.children {
        gap(src, cursor, child.record.span.start(), indent + 2, out);
        pretty_node(child, src, indent + 2, out);
        cursor = child.record.span.end();
    }
    gap(src, cursor, span.end(), indent + 2, out);
}

fn gap(src: &str, from: usize, to: usize, indent: usize, out: &mut String) {
    if from < to {
        let _ = writeln!(out, "{:indent$}(gap) {:?}", "", &src[from..to]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captures::Rule;
    use crate::grammar::Matcher;

    fn forest_of(src: &str) -> Vec<ForestNode> {
        let recognition = Matcher::new(src).run();
        assert!(recognition.failure.is_none());
        reconstruct(recognition.store.records())
    }

    #[test]
    fn test_single_root() {
        let forest = forest_of("[Person]\n*name\n");
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].record.rule, Rule::Document);
    }

    #[test]
    fn test_nesting_follows_spans() {
        let forest = forest_of("[Person]\n*name\n");
        let document = &forest[0];
        assert_eq!(document.children.len(), 1);
        let table = &document.children[0];
        assert_eq!(table.record.rule, Rule::TableBlock);

        let rules: Vec<Rule> = table.children.iter().map(|c| c.record.rule).collect();
        assert_eq!(rules, vec![Rule::TableTitle, Rule::TableColumn]);

        let column = &table.children[1];
        assert_eq!(column.children[0].record.rule, Rule::ColumnName);
    }

    #[test]
    fn test_reconstruction_is_idempotent() {
        let recognition = Matcher::new("[A]\nx\ny\n\n[B]\nz\nA 1--* B\n").run();
        let records = recognition.store.records();
        assert_eq!(reconstruct(records), reconstruct(records));
    }

    #[test]
    fn test_pretty_accounts_for_gaps() {
        let forest = forest_of("[Person]\n");
        let rendered = pretty(&forest, "[Person]\n");
        // The brackets are matched by the table block but not by any
        // child, so they surface as gaps.
        assert!(rendered.contains("(gap) \"[\""));
        assert!(rendered.contains("table title \"Person\""));
    }

    #[test]
    fn test_parents_contain_children() {
        let forest = forest_of("title {label: x}\ncolors {c: \"#fff\"}\n[A]\n");
        fn check(node: &ForestNode) {
            for child in &node.children {
                assert!(node.record.span.contains(child.record.span));
                check(child);
            }
        }
        for root in &forest {
            check(root);
        }
    }
}
