#![expect(missing_docs)]

use core::fmt::Write;

use gaptree::{NodeKind, Position, TreeBuffer};

mod common;

/// One line per child of the group at `pos`, as `kind name = string value`,
/// descending into groups whose first child is a group. A run of scalars
/// is listed once.
fn outline(tree: &TreeBuffer, pos: Position, depth: usize, out: &mut String) {
    let mut child = tree.first_child_pos(pos).unwrap();
    while let Some(pos) = child {
        if !tree.has_next(pos).unwrap() {
            break;
        }
        let kind = tree.next_kind(pos).unwrap();
        let name = tree.next_type_name(pos).unwrap();
        writeln!(
            out,
            "{:indent$}{:?} {} = {:?}",
            "",
            kind,
            name.as_deref().unwrap_or("-"),
            tree.string_value(pos).unwrap(),
            indent = depth * 2
        )
        .unwrap();

        if kind == NodeKind::Group {
            let first = tree.first_child_pos(pos).unwrap().unwrap();
            if tree.next_kind(first).unwrap() == NodeKind::Group {
                outline(tree, pos, depth + 1, out);
            }
            child = tree.next_pos(pos).unwrap();
        } else {
            let index = tree.pos_to_data_index(pos).unwrap();
            let next = tree.next_node_index(index, tree.capacity()).unwrap();
            child = Some(tree.data_index_to_pos(next));
        }
    }
}

#[test]
fn snapshot_rendering() {
    let tree = common::catalog().unwrap();

    insta::assert_snapshot!(tree.to_string(), @r#"<catalog version="2"><book id="b1" lang="en"><title>Dune</title> <year>1965</year> <price>9.5</price></book> <book id="b2"><title>Solaris</title> <flags>true false 7</flags></book>note: 3 items</catalog>"#);
    insta::assert_snapshot!(tree.render(", ").unwrap(), @r#"<catalog version="2"><book id="b1" lang="en"><title>Dune</title>, <year>1965</year>, <price>9.5</price></book>, <book id="b2"><title>Solaris</title>, <flags>true, false, 7</flags></book>note: 3 items</catalog>"#);
}

#[test]
fn snapshot_string_values() {
    let tree = common::catalog().unwrap();
    let catalog = tree.first_child_pos(Position::START).unwrap().unwrap();

    let mut out = String::new();
    outline(&tree, catalog, 0, &mut out);
    insta::assert_snapshot!(out, @r#"
    Group book = "Dune19659.5"
      Group title = "Dune"
      Group year = "1965"
      Group price = "9.5"
    Group book = "Solaristruefalse7"
      Group title = "Solaris"
      Group flags = "truefalse7"
    Char - = "note: 3 items"
    "#);
}

#[test]
fn snapshot_stats() {
    let tree = common::catalog().unwrap();
    let stats = tree.stats().unwrap();
    insta::assert_debug_snapshot!(stats, @r"
    NodeStats {
        documents: 1,
        groups: 8,
        attributes: 4,
        chars: 29,
        text_runs: 7,
        bools: 2,
        bytes: 1,
        ints: 2,
        longs: 1,
        floats: 0,
        doubles: 1,
        objects: 0,
        max_depth: 4,
        depth: 0,
    }
    ");
}
