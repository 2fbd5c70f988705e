use core::cmp::Ordering;

use quickcheck::QuickCheck;

use super::{
    arbitrary::Forest,
    utils::{build, build_front_to_back, property_tests},
};
use crate::{Consumer, Position, TreeBuffer};

fn check_order(tree: &TreeBuffer) -> bool {
    let size = tree.size().unwrap();
    let before = |n| tree.create_pos(n, false).unwrap();

    (0..size).all(|n| tree.compare(before(n), before(n)).unwrap() == Ordering::Equal)
        && (1..size).all(|n| tree.compare(before(n - 1), before(n)).unwrap() == Ordering::Less)
        && (1..size).all(|n| tree.compare(before(n), before(n - 1)).unwrap() == Ordering::Greater)
        && (0..size).all(|n| tree.compare(before(n), Position::END).unwrap() == Ordering::Less)
}

/// Property: before positions of successive top-level records are ordered,
/// wherever the gap sits.
#[test]
fn successive_records_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(forest: Forest) -> bool {
        check_order(&build(&forest.events())) && check_order(&build_front_to_back(&forest.0))
    }

    QuickCheck::new()
        .tests(property_tests())
        .quickcheck(prop as fn(Forest) -> bool);
}

#[test]
fn after_and_before_of_one_record() {
    let mut tree = TreeBuffer::new();
    tree.write_int(1).unwrap();
    tree.write_int(2).unwrap();

    // Same stored index, different flags: the after position sorts later.
    assert_eq!(
        tree.compare(Position::after(0), Position::before(1)).unwrap(),
        Ordering::Greater
    );
    assert_eq!(
        tree.compare(Position::before(1), Position::after(0)).unwrap(),
        Ordering::Less
    );
    assert_eq!(
        tree.compare(Position::after(0), Position::after(0)).unwrap(),
        Ordering::Equal
    );
}

#[test]
fn next_pos_walks_top_level_records() {
    let mut tree = TreeBuffer::new();
    tree.begin_group("g", None).unwrap();
    tree.write_str("inner").unwrap();
    tree.end_group("g").unwrap();
    tree.write_bool(true).unwrap();

    let first = tree.next_pos(Position::START).unwrap().unwrap();
    let second = tree.next_pos(first).unwrap().unwrap();
    assert_eq!(tree.next_pos(second).unwrap(), None);
    assert_eq!(tree.compare(first, second).unwrap(), Ordering::Less);
    assert_eq!(tree.compare(second, Position::END).unwrap(), Ordering::Equal);
    assert!(!tree.has_next(second).unwrap());
}
