//! Graphviz dot rendering of a frozen diagram.
//!
//! Emits an undirected graph: one node per declared table, labeled with an
//! HTML-like table (title row plus one row per column), and one edge per
//! relation, its cardinalities as tail and head labels. Isolated tables
//! are grouped into a same-rank subgraph so Graphviz lays them out side by
//! side instead of scattering them.

use dot_generator::*;
use dot_structures::*;
use graphviz_rust::printer::{DotPrinter, PrinterContext};

use trellis_core::{Diagram, Table, TableId};

use crate::config::AppConfig;

/// Render a frozen diagram as dot source.
pub fn render(diagram: &Diagram, config: &AppConfig) -> String {
    let mut stmts = Vec::new();

    stmts.push(Stmt::GAttribute(GraphAttributes::Graph(
        graph_attributes(diagram, config),
    )));
    stmts.push(Stmt::GAttribute(GraphAttributes::Node(vec![attr!(
        "shape",
        "plaintext"
    )])));
    stmts.push(Stmt::GAttribute(GraphAttributes::Edge(vec![
        quoted_attr("color", &config.graph.edge_color),
        quoted_attr("style", &config.graph.edge_style),
        attr!("minlen", "2"),
    ])));

    for table in diagram.tables() {
        stmts.push(Stmt::Node(table_node(table, config)));
    }

    if !diagram.isolated().is_empty() {
        stmts.push(Stmt::Subgraph(isolated_rank(diagram.isolated())));
    }

    for relation in diagram.relations() {
        let mut attributes = vec![
            quoted_attr("taillabel", relation.left_cardinality().as_str()),
            quoted_attr("headlabel", relation.right_cardinality().as_str()),
        ];
        for (key, value) in relation.attributes() {
            attributes.push(quoted_attr(key, value));
        }
        stmts.push(Stmt::Edge(Edge {
            ty: EdgeTy::Pair(
                Vertex::N(node_id(relation.left_table())),
                Vertex::N(node_id(relation.right_table())),
            ),
            attributes,
        }));
    }

    log::debug!(
        nodes = diagram.table_count(),
        edges = diagram.relations().len();
        "rendering dot"
    );
    let graph = Graph::Graph {
        id: Id::Plain("erd".to_string()),
        strict: false,
        stmts,
    };
    graph.print(&mut PrinterContext::default())
}

/// Graph-level attributes: renderer defaults, then the document's title
/// attributes verbatim, so the title block wins on conflicts.
fn graph_attributes(diagram: &Diagram, config: &AppConfig) -> Vec<Attribute> {
    let mut attributes = vec![
        quoted_attr("rankdir", &config.graph.rankdir),
        attr!("labeljust", "l"),
        attr!("nodesep", "0.5"),
        attr!("ranksep", "0.5"),
    ];
    for (key, value) in diagram.title().attributes() {
        attributes.push(quoted_attr(key, value));
    }
    attributes
}

/// One table as a plaintext node carrying an HTML-like label.
fn table_node(table: &Table, config: &AppConfig) -> Node {
    let mut attributes = vec![Attribute(
        Id::Plain("label".to_string()),
        Id::Html(html_label(table, config)),
    )];
    // Table attributes other than the header color pass through as plain
    // node attributes.
    for (key, value) in table.attributes() {
        if key == "bgcolor" {
            continue;
        }
        attributes.push(quoted_attr(key, value));
    }
    Node {
        id: node_id(table.id()),
        attributes,
    }
}

fn html_label(table: &Table, config: &AppConfig) -> String {
    let header_color = table
        .attributes()
        .get("bgcolor")
        .map(String::as_str)
        .unwrap_or("#d0d0d0");

    let mut rows = format!(
        "<TR><TD BGCOLOR=\"{}\" ALIGN=\"CENTER\"><B>{}</B></TD></TR>",
        html_escape(header_color),
        html_escape(table.title()),
    );
    for column in table.columns() {
        let cell_color = column
            .attributes()
            .get("bgcolor")
            .map(|c| format!(" BGCOLOR=\"{}\"", html_escape(c)))
            .unwrap_or_default();
        rows.push_str(&format!(
            "<TR><TD ALIGN=\"LEFT\"{}>{}</TD></TR>",
            cell_color,
            html_escape(column.title()),
        ));
    }

    format!(
        "<<FONT FACE=\"{}\"><TABLE BORDER=\"0\" CELLBORDER=\"1\" CELLPADDING=\"4\" \
         CELLSPACING=\"0\">{}</TABLE></FONT>>",
        html_escape(&config.graph.font),
        rows,
    )
}

/// Anonymous `rank=same` group for tables no relation touches.
fn isolated_rank(isolated: &[TableId]) -> Subgraph {
    let mut stmts = vec![Stmt::Attribute(attr!("rank", "same"))];
    for id in isolated {
        stmts.push(Stmt::Node(Node {
            id: node_id(id),
            attributes: Vec::new(),
        }));
    }
    Subgraph {
        id: Id::Anonymous(String::new()),
        stmts,
    }
}

fn node_id(id: &TableId) -> NodeId {
    NodeId(quoted_id(id.as_str()), None)
}

fn quoted_attr(key: &str, value: &str) -> Attribute {
    Attribute(Id::Plain(key.to_string()), quoted_id(value))
}

/// A double-quoted dot identifier; always quoting sidesteps dot keywords
/// and non-alphanumeric content.
fn quoted_id(value: &str) -> Id {
    Id::Escaped(format!("\"{}\"", value.replace('"', "\\\"")))
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_source(source: &str) -> String {
        let diagram = trellis_parser::parse(source).unwrap();
        render(&diagram, &AppConfig::default())
    }

    #[test]
    fn test_one_node_per_table() {
        let dot = render_source("[Person]\n*name\n\n[Location]\n*id\n");
        assert!(dot.contains("\"Person\""));
        assert!(dot.contains("\"Location\""));
    }

    #[test]
    fn test_edge_carries_cardinality_labels() {
        let dot = render_source("[A]\n\n[B]\n\nA *--1 B\n");
        assert!(dot.contains("taillabel"));
        assert!(dot.contains("\"*\""));
        assert!(dot.contains("headlabel"));
        assert!(dot.contains("--"));
    }

    #[test]
    fn test_isolated_tables_share_a_rank() {
        let dot = render_source("[A]\n\n[B]\n\n[C]\n\nA 1--1 A\n");
        assert!(dot.contains("same"));
    }

    #[test]
    fn test_no_rank_group_when_all_connected() {
        let dot = render_source("[A]\n\n[B]\n\nA 1--1 B\n");
        assert!(!dot.contains("same"));
    }

    #[test]
    fn test_title_attributes_reach_the_graph() {
        let dot = render_source("title {label: \"My Schema\"}\n[A]\n");
        assert!(dot.contains("My Schema"));
    }

    #[test]
    fn test_html_label_escapes_markup() {
        let dot = render_source("[a<b]\nx&y\n");
        assert!(dot.contains("a&lt;b"));
        assert!(dot.contains("x&amp;y"));
    }
}
