use alloc::{string::ToString, vec, vec::Vec};

use quickcheck::QuickCheck;
use rstest::rstest;

use super::{
    arbitrary::Forest,
    utils::{build, build_front_to_back, normalized, property_tests},
};
use crate::{Consumer, Event, Position, TreeBuffer};

/// Property: where the gap sat while each item was written does not show in
/// the replay, the rendering or the string value.
#[test]
fn insertion_order_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(forest: Forest) -> bool {
        let appended = build(&forest.events());
        let inserted = build_front_to_back(&forest.0);
        inserted.events().unwrap() == appended.events().unwrap()
            && inserted.to_string() == appended.to_string()
            && inserted.size().unwrap() == appended.size().unwrap()
            && inserted.string_value(Position::START).unwrap()
                == appended.string_value(Position::START).unwrap()
    }

    QuickCheck::new()
        .tests(property_tests())
        .quickcheck(prop as fn(Forest) -> bool);
}

#[test]
fn string_values_stop_at_the_gap() {
    let mut appended = TreeBuffer::new();
    appended.write_str("ab").unwrap();
    appended.begin_group("g", None).unwrap();
    appended.write_str("IN").unwrap();
    appended.end_group("g").unwrap();

    // The text run ends exactly where the gap starts; the group follows it.
    let mut inserted = TreeBuffer::new();
    inserted.begin_group("g", None).unwrap();
    inserted.write_str("IN").unwrap();
    inserted.end_group("g").unwrap();
    inserted.set_insertion_point(Position::START).unwrap();
    inserted.write_str("ab").unwrap();

    for tree in [&appended, &inserted] {
        assert_eq!(tree.string_value(Position::START).unwrap(), "ab");
        assert_eq!(tree.string_value(Position::before(2)).unwrap(), "IN");
    }
    assert_eq!(inserted.to_string(), appended.to_string());

    // A span that ends where the gap starts.
    let mut tree = TreeBuffer::new();
    tree.begin_group("g", None).unwrap();
    tree.write_str("IN").unwrap();
    tree.end_group("g").unwrap();
    tree.write_str("cd").unwrap();
    let after_group = tree.create_pos(1, false).unwrap();
    tree.set_insertion_point(after_group).unwrap();
    assert_eq!(tree.string_value(Position::START).unwrap(), "IN");
    assert_eq!(tree.string_value(after_group).unwrap(), "cd");
}

/// Property: growing the storage while the gap sits in front of existing
/// content keeps that content intact.
#[test]
fn growth_before_content_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(forest: Forest, fill: u16) -> bool {
        let mut tree = build(&forest.events());
        let mut expected = vec![Event::Text {
            value: ".".repeat(usize::from(fill % 600)),
        }];
        expected.extend(tree.events().unwrap());

        tree.set_insertion_point(Position::START).unwrap();
        for _ in 0..fill % 600 {
            tree.write_char('.').unwrap();
        }
        tree.events().unwrap() == normalized(&expected)
    }

    QuickCheck::new()
        .tests(property_tests())
        .quickcheck(prop as fn(Forest, u16) -> bool);
}

fn items() -> Vec<Vec<Event>> {
    let group = |name: &str, body: Vec<Event>| {
        let mut events = vec![Event::BeginGroup {
            name: name.into(),
            ty: None,
        }];
        events.extend(body);
        events.push(Event::EndGroup { name: name.into() });
        events
    };
    vec![
        group("a", vec![Event::Int { value: 1 }]),
        vec![Event::Text { value: "mid".into() }],
        group(
            "b",
            vec![
                Event::BeginAttribute {
                    name: "k".into(),
                    ty: None,
                },
                Event::Long { value: 9 },
                Event::EndAttribute,
                Event::Double { value: 0.5 },
            ],
        ),
    ]
}

#[rstest]
#[case::append(&[0, 1, 2])]
#[case::reverse(&[2, 1, 0])]
#[case::middle_first(&[1, 0, 2])]
fn insert_at_top_level_boundaries(#[case] order: &[usize]) {
    let items = items();
    let expected = build(&items.concat());

    // Each item goes in at the top-level position it has in the final tree,
    // counted among the items already written.
    let mut tree = TreeBuffer::new();
    let mut written: Vec<usize> = Vec::new();
    for &item in order {
        let mut records = 0;
        for &other in written.iter().filter(|&&other| other < item) {
            records += record_count(&items[other]);
        }
        let pos = if records == 0 {
            Position::START
        } else {
            tree.create_pos(records, true).unwrap()
        };
        tree.set_insertion_point(pos).unwrap();
        crate::feed_events(&items[item], &mut tree).unwrap();
        written.push(item);
    }

    assert_eq!(tree.events().unwrap(), expected.events().unwrap());
    assert_eq!(tree.to_string(), r#"<a>1</a>mid<b k="9">0.5</b>"#);
}

/// Top-level records an item occupies: one per character of text, one per
/// span or scalar.
fn record_count(item: &[Event]) -> usize {
    match item {
        [Event::Text { value }] => value.chars().count(),
        _ => 1,
    }
}

#[test]
fn insertion_inside_a_span_is_rejected() {
    let mut tree = build(&items().concat());
    // Logical index 1 is the second unit of the first group's begin record.
    let err = tree.set_insertion_point(Position::before(1)).unwrap_err();
    assert!(err.is_invariant_failure());

    tree.begin_group("open", None).unwrap();
    let err = tree.set_insertion_point(Position::START).unwrap_err();
    assert!(err.is_invariant_failure());
}
