use alloc::string::ToString;

use rstest::rstest;

use crate::{Consumer, ProtocolError, SpanKind, TreeBuffer, TreeError, TreeOptions};

fn protocol(result: Result<(), TreeError>) -> ProtocolError {
    match result {
        Err(TreeError::Protocol(err)) => err,
        other => panic!("expected a protocol violation, got {other:?}"),
    }
}

#[rstest]
#[case::attribute(SpanKind::Attribute)]
#[case::document(SpanKind::Document)]
fn ends_without_a_begin(#[case] kind: SpanKind) {
    let mut tree = TreeBuffer::new();
    let result = match kind {
        SpanKind::Attribute => tree.end_attribute(),
        SpanKind::Document => tree.end_document(),
        SpanKind::Group => tree.end_group("g"),
    };
    assert_eq!(
        protocol(result),
        ProtocolError::UnexpectedEnd {
            expected: kind,
            found: None,
        }
    );
}

#[test]
fn ends_must_match_the_innermost_span() {
    let mut tree = TreeBuffer::new();
    tree.begin_document().unwrap();
    tree.begin_group("g", None).unwrap();
    assert_eq!(
        protocol(tree.end_document()),
        ProtocolError::UnexpectedEnd {
            expected: SpanKind::Document,
            found: Some(SpanKind::Group),
        }
    );

    tree.begin_attribute("k", None).unwrap();
    assert_eq!(
        protocol(tree.end_group("g")),
        ProtocolError::UnexpectedEnd {
            expected: SpanKind::Group,
            found: Some(SpanKind::Attribute),
        }
    );

    // Rejected calls leave the buffer usable.
    tree.end_attribute().unwrap();
    tree.end_group("g").unwrap();
    tree.end_document().unwrap();
    assert_eq!(tree.to_string(), r#"<g k=""/>"#);
}

#[test]
fn group_names_must_match() {
    let mut tree = TreeBuffer::new();
    tree.begin_group("open", None).unwrap();
    let err = protocol(tree.end_group("close"));
    assert_eq!(
        err,
        ProtocolError::MismatchedGroupName {
            expected: "open".into(),
            found: "close".into(),
        }
    );
    assert_eq!(
        err.to_string(),
        "end of group `close` requested but `open` is open"
    );
}

#[test]
fn illegal_nesting() {
    let mut tree = TreeBuffer::new();
    tree.begin_document().unwrap();
    assert_eq!(
        protocol(tree.begin_document()),
        ProtocolError::NestedDocument
    );

    tree.begin_group("g", None).unwrap();
    tree.begin_attribute("a", None).unwrap();
    assert_eq!(
        protocol(tree.begin_attribute("b", None)),
        ProtocolError::NestedAttribute
    );
    assert_eq!(
        protocol(tree.begin_group("h", None)),
        ProtocolError::BeginInsideAttribute(SpanKind::Group)
    );
    assert!(tree.has_open_spans());
}

#[test]
#[should_panic(expected = "attribute opened while another attribute is open")]
fn panic_on_error_panics_at_the_call() {
    let mut tree = TreeBuffer::with_options(TreeOptions {
        panic_on_error: true,
        ..TreeOptions::default()
    });
    tree.begin_group("g", None).unwrap();
    tree.begin_attribute("a", None).unwrap();
    let _ = tree.begin_attribute("b", None);
}

#[test]
fn corrupt_units_are_reported() {
    let mut tree = TreeBuffer::new();
    tree.write_int(1).unwrap();
    tree.write_int(2).unwrap();
    tree.gap.set(1, 0xF1FF);

    let err = tree.events().unwrap_err();
    assert!(err.is_invariant_failure());
    assert!(matches!(err, TreeError::Corrupt(_)), "{err:?}");
    assert!(matches!(tree.render(" "), Err(crate::ReplayError::Tree(TreeError::Corrupt(_)))));
}

#[test]
fn out_of_range_positions() {
    let mut tree = TreeBuffer::new();
    tree.write_str("ab").unwrap();
    assert_eq!(
        tree.get(2).unwrap_err(),
        TreeError::OutOfRange { index: 2, len: 2 }
    );
    assert_eq!(
        tree.create_pos(5, false).unwrap_err(),
        TreeError::OutOfRange { index: 5, len: 2 }
    );
    assert!(!tree.get(2).unwrap_err().is_invariant_failure());
}
