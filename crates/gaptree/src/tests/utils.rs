use alloc::vec::Vec;

use crate::{Event, EventLog, TreeBuffer, feed_events};

/// Number of cases for quickcheck properties.
pub fn property_tests() -> u64 {
    #[cfg(not(miri))]
    let tests = if is_ci::cached() { 10_000 } else { 1_000 };
    #[cfg(miri)]
    let tests = 10;
    tests
}

/// The events a replay of `events` is expected to produce, with adjacent
/// text joined.
pub fn normalized(events: &[Event]) -> Vec<Event> {
    let mut log = EventLog::new();
    let Ok(()) = feed_events(events, &mut log);
    log.into_events()
}

/// Builds a tree from `events`, panicking on the first rejected call.
pub fn build(events: &[Event]) -> TreeBuffer {
    let mut tree = TreeBuffer::new();
    feed_events(events, &mut tree).expect("well-formed events");
    tree
}

/// Builds a tree by inserting each top-level item in front of the ones
/// already written, last item first, so the gap moves before every item.
pub fn build_front_to_back(items: &[Vec<Event>]) -> TreeBuffer {
    let mut tree = TreeBuffer::new();
    for item in items.iter().rev() {
        tree.set_insertion_point(crate::Position::START)
            .expect("top-level boundary");
        feed_events(item, &mut tree).expect("well-formed events");
    }
    tree
}
