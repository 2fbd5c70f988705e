#![no_main]

use arbitrary::Arbitrary;
use gaptree::{
    Event, EventLog, NodeKind, ObjectRef, Position, PredicateKind, TextRenderer, TreeBuffer,
    TreeOptions, feed_events,
};
use libfuzzer_sys::fuzz_target;

const NAMES: [&str; 4] = ["a", "b", "c", "d"];

/// One encoder call. Sequences are not required to be well nested; the
/// buffer must reject the bad calls without corrupting itself.
#[derive(Arbitrary, Debug)]
enum Op {
    BeginDocument,
    EndDocument,
    BeginGroup(u8),
    EndGroup(u8),
    BeginAttribute(u8),
    EndAttribute,
    Bool(bool),
    Byte(u8),
    Char(char),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    Object(u8),
    /// Moves the gap to the given top-level record.
    InsertAt(u16),
}

#[derive(Arbitrary, Debug)]
struct Input {
    compact_groups: bool,
    initial_capacity: u8,
    ops: Vec<Op>,
}

fn name(index: u8) -> &'static str {
    NAMES[usize::from(index) % NAMES.len()]
}

/// Applies `op`, returning the event it recorded when the call was accepted.
fn apply(tree: &mut TreeBuffer, op: &Op) -> Option<Event> {
    let event = match op {
        Op::BeginDocument => Event::BeginDocument,
        Op::EndDocument => Event::EndDocument,
        Op::BeginGroup(n) => Event::BeginGroup {
            name: name(*n).into(),
            ty: None,
        },
        Op::EndGroup(n) => Event::EndGroup {
            name: name(*n).into(),
        },
        Op::BeginAttribute(n) => Event::BeginAttribute {
            name: name(*n).into(),
            ty: None,
        },
        Op::EndAttribute => Event::EndAttribute,
        Op::Bool(value) => Event::Bool { value: *value },
        Op::Byte(value) => Event::Byte { value: *value },
        Op::Char(value) => Event::Text {
            value: value.to_string(),
        },
        Op::Int(value) => Event::Int { value: *value },
        Op::Long(value) => Event::Long { value: *value },
        Op::Float(value) => Event::Float { value: *value },
        Op::Double(value) => Event::Double { value: *value },
        Op::Str(value) => Event::Text {
            value: value.clone(),
        },
        Op::Object(value) => Event::Object {
            value: ObjectRef::new(*value),
        },
        Op::InsertAt(_) if tree.has_open_spans() => return None,
        Op::InsertAt(n) => {
            let size = tree.size().expect("size of a valid buffer");
            let n = usize::from(*n) % (size + 1);
            let pos = tree.create_pos(n, false).expect("top-level record");
            let _ = tree.set_insertion_point(pos);
            return None;
        }
    };
    event.feed(tree).ok().map(|()| event)
}

fn render(events: &[Event]) -> String {
    let mut out = String::new();
    feed_events(events, &mut TextRenderer::new(&mut out, " ")).expect("render events");
    out
}

/// Walks every top-level record and scans the whole buffer with a
/// predicate; none of it may fail on a closed buffer.
fn navigate(tree: &TreeBuffer) {
    let size = tree.size().expect("size");
    let mut previous = None;
    for n in 0..size {
        let pos = tree.create_pos(n, false).expect("create_pos");
        if let Some(previous) = previous {
            assert_eq!(
                tree.compare(previous, pos).expect("compare"),
                core::cmp::Ordering::Less
            );
        }
        previous = Some(pos);
        tree.materialize(pos).expect("materialize");
        tree.prev_value(pos).expect("prev_value");
        assert_eq!(
            tree.create_relative_pos(Position::START, n, false).expect("create_relative_pos"),
            pos
        );
        tree.string_value(pos).expect("string_value");
        tree.first_child_pos(pos).expect("first_child_pos");
        tree.attributes_start(pos).expect("attributes_start");
    }

    // Scalars match at the start index itself, so resume after them;
    // structural records are never reported at the start index.
    let limit = tree.capacity();
    let mut index = 0;
    while let Some(next) = tree
        .next_matching_child(index, &PredicateKind::Any, limit)
        .expect("next_matching_child")
    {
        assert!(next >= index);
        index = match tree.next_kind(tree.data_index_to_pos(next)).expect("next_kind") {
            NodeKind::Group | NodeKind::Attribute | NodeKind::Document => next,
            _ => tree
                .next_data_index(next)
                .expect("next_data_index")
                .unwrap_or(limit),
        };
    }
}

fn run(input: &Input) {
    let mut tree = TreeBuffer::with_options(TreeOptions {
        compact_groups: input.compact_groups,
        initial_capacity: usize::from(input.initial_capacity),
        ..TreeOptions::default()
    });

    let mut accepted = Vec::new();
    let mut moved = false;
    for op in &input.ops {
        moved |= matches!(op, Op::InsertAt(_));
        if let Some(event) = apply(&mut tree, op) {
            accepted.push(event);
        }
    }
    if tree.has_open_spans() {
        return;
    }

    let replayed = tree.events().expect("replay of a closed buffer");
    let copy = tree.copy().expect("copy");
    assert_eq!(copy.events().expect("replay of a copy").len(), replayed.len());
    assert_eq!(copy.to_string(), tree.to_string());
    if !moved {
        let mut log = EventLog::new();
        feed_events(&accepted, &mut log).expect("event log");
        assert_eq!(render(log.events()), render(&replayed));
    }
    navigate(&tree);
    serde_json::to_string(&tree).expect("serialize");

    tree.clear();
    assert!(tree.is_empty());
}

fuzz_target!(|input: Input| run(&input));
