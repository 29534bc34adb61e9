//! Integration tests for the parse pipeline at the `trellis` crate level.

use trellis::{Cardinality, ParseError, TrellisError};

#[test]
fn pipeline_builds_the_reference_model() {
    let source = "\
title {label: \"People and places\"}

[Person]
*name
height

[Location]
*id

Person *--1 Location
";
    let diagram = trellis::parse(source).unwrap();

    assert_eq!(
        diagram.title().attributes().get("label").unwrap(),
        "People and places"
    );
    assert_eq!(diagram.table_count(), 2);
    assert_eq!(diagram.relations().len(), 1);
    assert_eq!(
        diagram.relations()[0].left_cardinality(),
        Cardinality::ZeroOrMore
    );
    assert!(diagram.isolated().is_empty());
}

#[test]
fn pipeline_keeps_source_with_parse_errors() {
    let source = "Person *--X Location\n";
    let err = trellis::parse(source).unwrap_err();
    let TrellisError::Parse { err, src } = &err else {
        panic!("expected a parse error");
    };
    assert_eq!(src, source);
    assert!(matches!(err, ParseError::Syntax { .. }));
    assert!(err.window().is_some());
}

#[cfg(feature = "graphviz")]
mod dot {
    #[test]
    fn pipeline_renders_dot() {
        let source = "[A]\n*id\n\n[B]\n*id\n\nA 1--* B\n";
        let diagram = trellis::parse(source).unwrap();
        let dot = trellis::render_dot(&diagram, &trellis::AppConfig::default());

        assert!(dot.contains("graph"));
        assert!(dot.contains("\"A\""));
        assert!(dot.contains("\"B\""));
        assert!(dot.contains("--"));
    }
}
