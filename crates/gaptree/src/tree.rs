use alloc::vec::Vec;
use core::fmt;

use crate::{
    codec::{self, END_ATTRIBUTE, END_DOCUMENT, END_GROUP_LONG},
    error::{CorruptError, ProtocolError, SpanKind, TreeError},
    event::{Event, EventLog},
    gap::{GapBuffer, GrowthStats},
    object_table::ObjectTable,
    options::TreeOptions,
    position::Position,
    text::TextRenderer,
};

/// A group whose end marker has not been written yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OpenGroup {
    pub(crate) type_index: usize,
    pub(crate) begin: usize,
}

/// A compact, gap-buffered encoding of nested tree data.
///
/// Content is pushed through the [`Consumer`](crate::Consumer)
/// implementation and read back through positions, navigation queries and
/// [`replay`](Self::replay).
///
/// ```
/// use gaptree::{Consumer, TreeBuffer};
///
/// let mut tree = TreeBuffer::new();
/// tree.begin_group("greeting", None)?;
/// tree.write_str("hello")?;
/// tree.end_group("greeting")?;
///
/// assert_eq!(tree.to_string(), "<greeting>hello</greeting>");
/// assert_eq!(tree.size()?, 1);
/// # Ok::<(), gaptree::TreeError>(())
/// ```
#[derive(Clone)]
pub struct TreeBuffer {
    pub(crate) gap: GapBuffer,
    pub(crate) objects: ObjectTable,
    pub(crate) open_groups: Vec<OpenGroup>,
    pub(crate) attr_start: Option<usize>,
    pub(crate) doc_start: Option<usize>,
    pub(crate) options: TreeOptions,
}

impl Default for TreeBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuffer {
    /// An empty buffer with [`TreeOptions::default`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(TreeOptions::default())
    }

    /// An empty buffer configured by `options`.
    #[must_use]
    pub fn with_options(options: TreeOptions) -> Self {
        Self {
            gap: GapBuffer::new(options.initial_capacity),
            objects: ObjectTable::new(options.initial_object_slots),
            open_groups: Vec::new(),
            attr_start: None,
            doc_start: None,
            options,
        }
    }

    /// Copies the records in the storage range `[start, end)` of `source`
    /// into a new, independent buffer.
    pub fn from_range(source: &TreeBuffer, start: usize, end: usize) -> Result<Self, TreeError> {
        let mut tree = Self::with_options(source.options);
        source.replay(start, end, &mut tree)?;
        tracing::debug!(start, end, units = tree.len(), "copied tree range");
        Ok(tree)
    }

    /// Copies the whole buffer.
    pub fn copy(&self) -> Result<Self, TreeError> {
        Self::from_range(self, 0, self.gap.capacity())
    }

    /// The options the buffer was built with.
    #[must_use]
    pub fn options(&self) -> &TreeOptions {
        &self.options
    }

    /// Discards all content, interned objects and open spans.
    ///
    /// Storage grown beyond [`TreeOptions::shrink_threshold`] is released.
    pub fn clear(&mut self) {
        tracing::debug!(units = self.len(), "clearing tree buffer");
        self.gap
            .clear(self.options.initial_capacity, self.options.shrink_threshold);
        self.objects.clear();
        self.open_groups.clear();
        self.attr_start = None;
        self.doc_start = None;
    }

    /// Number of encoded units, not counting the gap.
    #[must_use]
    pub fn len(&self) -> usize {
        self.gap.len()
    }

    /// Whether no units are encoded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gap.len() == 0
    }

    /// Allocated units, gap included.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.gap.capacity()
    }

    /// Reallocation and copy counters since construction.
    #[must_use]
    pub fn growth_stats(&self) -> GrowthStats {
        self.gap.stats()
    }

    /// Number of live object table entries.
    #[must_use]
    pub fn interned(&self) -> usize {
        self.objects.occupied()
    }

    /// Whether any group, attribute or document is still open.
    #[must_use]
    pub fn has_open_spans(&self) -> bool {
        !self.open_groups.is_empty() || self.attr_start.is_some() || self.doc_start.is_some()
    }

    /// The innermost open span, read from the placeholder at the gap end.
    pub(crate) fn innermost_open(&self) -> Option<SpanKind> {
        if !self.has_open_spans() {
            return None;
        }
        match self.gap.get(self.gap.gap_end())? {
            END_GROUP_LONG => Some(SpanKind::Group),
            END_ATTRIBUTE => Some(SpanKind::Attribute),
            END_DOCUMENT => Some(SpanKind::Document),
            _ => None,
        }
    }

    /// Logs a protocol violation and turns it into an error.
    pub(crate) fn violation(&self, err: ProtocolError) -> TreeError {
        tracing::error!(error = %err, gap_start = self.gap.gap_start(), "protocol violation");
        #[cfg(any(test, feature = "fuzzing"))]
        if self.options.panic_on_error {
            panic!("{err}");
        }
        TreeError::Protocol(err)
    }

    /// Logs a decoding failure together with a dump of the buffer.
    pub(crate) fn corruption(&self, err: CorruptError) -> TreeError {
        tracing::error!(error = %err, dump = %self.dump(), "corrupt tree buffer");
        TreeError::Corrupt(err)
    }

    pub(crate) fn decode(&self, index: usize) -> Result<codec::Unit, TreeError> {
        codec::decode(&self.gap, index).map_err(|err| self.corruption(err))
    }

    /// Moves the edit gap so that subsequent writes are inserted at `pos`.
    ///
    /// `pos` must address a record boundary outside of every group,
    /// attribute and document, and nothing may be open.
    pub fn set_insertion_point(&mut self, pos: Position) -> Result<(), TreeError> {
        if self.has_open_spans() {
            return Err(self.violation(ProtocolError::InsertionWhileOpen));
        }
        let len = self.len();
        let target = if pos.is_end() {
            len
        } else {
            let index = self.pos_to_data_index(pos)?;
            self.gap.physical_to_logical(index)
        };
        if target > len {
            return Err(TreeError::OutOfRange { index: target, len });
        }

        let mut index = self.gap.skip_gap(0);
        loop {
            let logical = self.gap.physical_to_logical(index);
            if logical == target {
                break;
            }
            if logical > target {
                return Err(self.violation(ProtocolError::InsertionInsideSpan { index: target }));
            }
            match self.next_data_index(index)? {
                Some(next) => index = self.gap.skip_gap(next),
                None => {
                    return Err(self.violation(ProtocolError::InsertionInsideSpan {
                        index: target,
                    }));
                }
            }
        }

        self.gap.move_gap(target);
        Ok(())
    }

    /// Replays the buffer into an [`EventLog`] and returns the events.
    pub fn events(&self) -> Result<Vec<Event>, TreeError> {
        let mut log = EventLog::new();
        self.consume(&mut log)?;
        Ok(log.into_events())
    }
}

impl fmt::Debug for TreeBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeBuffer")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("gap_start", &self.gap.gap_start())
            .field("gap_end", &self.gap.gap_end())
            .field("open_groups", &self.open_groups.len())
            .field("interned", &self.objects.occupied())
            .finish()
    }
}

/// Renders the content as markup, separating adjacent atoms with a space.
impl fmt::Display for TreeBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut renderer = TextRenderer::new(f, " ");
        self.consume(&mut renderer).map_err(|_| fmt::Error)
    }
}

/// Buffers are equal when they replay the same events.
impl PartialEq for TreeBuffer {
    fn eq(&self, other: &Self) -> bool {
        matches!((self.events(), other.events()), (Ok(a), Ok(b)) if a == b)
    }
}

/// Serializes as the sequence of replayed events.
#[cfg(any(test, feature = "serde"))]
impl serde::Serialize for TreeBuffer {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let events = self.events().map_err(serde::ser::Error::custom)?;
        serializer.collect_seq(&events)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;
    use crate::Consumer;

    #[test]
    fn clear_resets_everything() {
        let mut tree = TreeBuffer::new();
        tree.begin_group("a", None).unwrap();
        tree.write_str("text").unwrap();
        assert!(tree.has_open_spans());

        tree.clear();
        assert!(tree.is_empty());
        assert!(!tree.has_open_spans());
        assert_eq!(tree.interned(), 0);
        assert_eq!(tree.innermost_open(), None);
        tree.write_int(1).unwrap();
        assert_eq!(tree.to_string(), "1");
    }

    #[test]
    fn clear_releases_grown_storage() {
        let mut tree = TreeBuffer::new();
        for _ in 0..2000 {
            tree.write_char('x').unwrap();
        }
        assert!(tree.capacity() > 1500);
        tree.clear();
        assert_eq!(tree.capacity(), 200);
    }

    #[test]
    fn copies_are_independent() {
        let mut tree = TreeBuffer::new();
        tree.begin_group("a", None).unwrap();
        tree.write_int(7).unwrap();
        tree.end_group("a").unwrap();

        let copy = tree.copy().unwrap();
        tree.write_int(8).unwrap();
        assert_eq!(copy.to_string(), "<a>7</a>");
        assert_eq!(tree.to_string(), "<a>7</a> 8");
        assert_ne!(copy, tree);
    }
}
