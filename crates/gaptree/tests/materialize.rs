#![expect(missing_docs)]

use std::sync::Arc;

use gaptree::{
    Consumer, NamedAttribute, NamedGroup, ObjectRef, Position, PredicateKind, SeqPosition,
    TreeBuffer, Value,
};

mod common;

#[test]
fn groups_materialize_as_independent_trees() {
    let tree = common::catalog().unwrap();
    let catalog = tree.first_child_pos(Position::START).unwrap().unwrap();
    let book = tree.first_child_pos(catalog).unwrap().unwrap();

    let Value::Tree(copy) = tree.materialize(book).unwrap() else {
        panic!("expected a tree");
    };
    assert_eq!(
        copy.to_string(),
        r#"<book id="b1" lang="en"><title>Dune</title> <year>1965</year> <price>9.5</price></book>"#
    );
    assert_eq!(copy.size().unwrap(), 1);
    assert_eq!(copy.string_value(Position::START).unwrap(), "Dune19659.5");

    // The whole document is a single top-level record.
    let whole = tree.get(0).unwrap().into_tree().unwrap();
    assert_eq!(whole, tree);
}

#[test]
fn scalars_materialize_by_class() {
    let mut tree = TreeBuffer::new();
    let marker = ObjectRef::new("marker");
    tree.write_bool(true).unwrap();
    tree.write_byte(0xFF).unwrap();
    tree.write_char('€').unwrap();
    tree.write_int(-70_000).unwrap();
    tree.write_long(1 << 40).unwrap();
    tree.write_float(0.25).unwrap();
    tree.write_double(-2.5).unwrap();
    tree.write_object(&marker).unwrap();

    let values: Vec<Value> = (0..8).map(|n| tree.get(n).unwrap()).collect();
    assert_eq!(
        values,
        vec![
            Value::Bool(true),
            Value::Byte(0xFF),
            Value::Char('€'),
            Value::Int(-70_000),
            Value::Long(1 << 40),
            Value::Float(0.25),
            Value::Double(-2.5),
            Value::Object(marker.clone()),
        ]
    );
    assert!(values.iter().take(7).skip(3).all(Value::is_number));
    assert_eq!(
        values[7].as_object().unwrap().downcast_ref::<&str>(),
        Some(&"marker")
    );
    assert!(tree.materialize(Position::END).unwrap().is_eof());
}

#[test]
fn predicates_find_named_nodes() {
    let tree = common::catalog().unwrap();
    let limit = tree.capacity();

    let mut titles = Vec::new();
    let mut index = 0;
    while let Some(found) = tree
        .next_matching_child(index, &NamedGroup("title"), limit)
        .unwrap()
    {
        titles.push(tree.string_value(tree.data_index_to_pos(found)).unwrap());
        index = found;
    }
    assert_eq!(titles, ["Dune", "Solaris"]);

    let lang = tree
        .next_matching_child(0, &NamedAttribute("lang"), limit)
        .unwrap()
        .unwrap();
    assert_eq!(tree.string_value(tree.data_index_to_pos(lang)).unwrap(), "en");

    let attributes = std::iter::successors(
        tree.next_matching_child(0, &PredicateKind::Attribute, limit)
            .unwrap(),
        |&at| {
            tree.next_matching_child(at, &PredicateKind::Attribute, limit)
                .unwrap()
        },
    )
    .count();
    assert_eq!(attributes, 4);
}

#[test]
fn materialized_positions_share_their_sequence() {
    let target = Arc::new(common::catalog().unwrap());
    let mut tree = TreeBuffer::new();
    tree.consume_position(&SeqPosition::new(target.clone(), Position::START))
        .unwrap();

    let Value::Position(pos) = tree.get(0).unwrap() else {
        panic!("expected a position");
    };
    assert!(Arc::ptr_eq(&pos.sequence, &target));
    assert_eq!(pos.pos, Position::START);
    assert_eq!(
        tree.string_value(Position::START).unwrap(),
        target.string_value(Position::START).unwrap()
    );
}
