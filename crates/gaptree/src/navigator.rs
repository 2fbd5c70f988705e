//! Pull side of [`TreeBuffer`]: turning positions into storage indices and
//! walking records.
//!
//! Methods taking or returning a bare `usize` work on storage indices. Those
//! are only meaningful until the next mutation; hold on to a [`Position`]
//! instead when an address has to outlive a write.

use alloc::sync::Arc;
use core::cmp::Ordering;

use crate::{
    codec::{BEGIN_DOCUMENT_WIDTH, BEGIN_GROUP_WIDTH, Record},
    error::TreeError,
    object_table::ObjectRef,
    position::Position,
    tree::TreeBuffer,
};

/// What comes next at a position.
#[cfg_attr(any(test, feature = "serde"), derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// End of the enclosing span, or of the whole buffer.
    Eof,
    Char,
    Byte,
    Bool,
    Int,
    Long,
    Float,
    Double,
    /// An interned object or a position reference.
    Object,
    Group,
    Attribute,
    Document,
}

/// The classes of nodes a [`NodePredicate`] can select.
///
/// The class decides which records a scan stops at before the predicate is
/// consulted at all: groups, attributes, any structural node, or anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateKind {
    Group,
    Attribute,
    Node,
    Any,
}

/// A test applied by [`TreeBuffer::next_matching_child`].
pub trait NodePredicate {
    fn kind(&self) -> PredicateKind;

    /// Whether the record at `pos` is a match.
    fn matches(&self, tree: &TreeBuffer, pos: Position) -> Result<bool, TreeError>;
}

/// Selects every node of the class.
impl NodePredicate for PredicateKind {
    fn kind(&self) -> PredicateKind {
        *self
    }

    fn matches(&self, tree: &TreeBuffer, pos: Position) -> Result<bool, TreeError> {
        let next = tree.next_kind(pos)?;
        Ok(match self {
            Self::Group => next == NodeKind::Group,
            Self::Attribute => next == NodeKind::Attribute,
            Self::Node | Self::Any => next != NodeKind::Eof,
        })
    }
}

/// Selects groups with the given name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedGroup<'a>(pub &'a str);

impl NodePredicate for NamedGroup<'_> {
    fn kind(&self) -> PredicateKind {
        PredicateKind::Group
    }

    fn matches(&self, tree: &TreeBuffer, pos: Position) -> Result<bool, TreeError> {
        Ok(tree.next_kind(pos)? == NodeKind::Group
            && tree.next_type_name(pos)?.as_deref() == Some(self.0))
    }
}

/// Selects attributes with the given name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedAttribute<'a>(pub &'a str);

impl NodePredicate for NamedAttribute<'_> {
    fn kind(&self) -> PredicateKind {
        PredicateKind::Attribute
    }

    fn matches(&self, tree: &TreeBuffer, pos: Position) -> Result<bool, TreeError> {
        Ok(tree.next_kind(pos)? == NodeKind::Attribute
            && tree.next_type_name(pos)?.as_deref() == Some(self.0))
    }
}

impl TreeBuffer {
    fn out_of_range(&self, index: usize) -> TreeError {
        TreeError::OutOfRange {
            index,
            len: self.len(),
        }
    }

    /// Resolves `pos` to the storage index of the record it addresses.
    ///
    /// [`Position::END`], and an after position whose record has no
    /// successor, resolve to [`capacity`](Self::capacity).
    pub fn pos_to_data_index(&self, pos: Position) -> Result<usize, TreeError> {
        let capacity = self.gap.capacity();
        if pos.is_end() {
            return Ok(capacity);
        }
        let index = pos.index();
        if pos.is_after() {
            let start = index
                .checked_sub(1)
                .filter(|start| *start < self.len())
                .ok_or_else(|| self.out_of_range(index))?;
            let start = self.gap.logical_to_physical(start);
            Ok(self.next_data_index(start)?.unwrap_or(capacity))
        } else {
            if index > self.len() {
                return Err(self.out_of_range(index));
            }
            Ok(self.gap.logical_to_physical(index))
        }
    }

    /// The before position of the record at storage index `index`.
    #[must_use]
    pub fn data_index_to_pos(&self, index: usize) -> Position {
        Position::before(self.gap.physical_to_logical(index))
    }

    /// Index of the record following the one at `index`, jumping over whole
    /// spans. `None` at an end marker or at the end of the buffer.
    pub fn next_data_index(&self, index: usize) -> Result<Option<usize>, TreeError> {
        let index = self.gap.skip_gap(index);
        if index >= self.gap.capacity() {
            return Ok(None);
        }
        let unit = self.decode(index)?;
        Ok(unit.next_sibling(index).map(|next| self.gap.skip_gap(next)))
    }

    /// Skips scalar content starting at `index`, stopping at the first begin
    /// or end marker, or once `limit` is reached.
    pub fn next_node_index(&self, index: usize, limit: usize) -> Result<usize, TreeError> {
        let limit = limit.min(self.gap.capacity());
        let mut index = index;
        loop {
            index = self.gap.skip_gap(index);
            if index >= limit {
                return Ok(index);
            }
            let unit = self.decode(index)?;
            if unit.record.is_begin() || unit.record.is_end() {
                return Ok(index);
            }
            index += unit.width;
        }
    }

    /// Index of the first non-attribute child of the group or document that
    /// begins at `index`. `None` when `index` does not start one.
    pub fn goto_children_start(&self, index: usize) -> Result<Option<usize>, TreeError> {
        let capacity = self.gap.capacity();
        let index = self.gap.skip_gap(index);
        if index >= capacity {
            return Ok(None);
        }
        match self.decode(index)?.record {
            Record::BeginGroup { .. } => {}
            Record::BeginDocument { .. } => {
                return Ok(Some(self.gap.skip_gap(index + BEGIN_DOCUMENT_WIDTH)));
            }
            _ => return Ok(None),
        }

        let mut index = index + BEGIN_GROUP_WIDTH;
        loop {
            index = self.gap.skip_gap(index);
            if index >= capacity {
                break;
            }
            match self.decode(index)?.record {
                Record::BeginAttribute { end, .. } => index = end + 1,
                Record::EndAttribute => index += 1,
                _ => break,
            }
        }
        Ok(Some(index))
    }

    /// Index of the first child slot of the group that begins at `index`,
    /// which is where its attributes live. `None` for anything but a group.
    pub fn goto_attributes_start(&self, index: usize) -> Result<Option<usize>, TreeError> {
        let index = self.gap.skip_gap(index);
        if index >= self.gap.capacity() {
            return Ok(None);
        }
        Ok(match self.decode(index)?.record {
            Record::BeginGroup { .. } => Some(self.gap.skip_gap(index + BEGIN_GROUP_WIDTH)),
            _ => None,
        })
    }

    /// [`goto_children_start`](Self::goto_children_start) for positions.
    pub fn first_child_pos(&self, pos: Position) -> Result<Option<Position>, TreeError> {
        let index = self.pos_to_data_index(pos)?;
        Ok(self
            .goto_children_start(index)?
            .map(|child| self.data_index_to_pos(child)))
    }

    /// [`goto_attributes_start`](Self::goto_attributes_start) for positions.
    pub fn attributes_start(&self, pos: Position) -> Result<Option<Position>, TreeError> {
        let index = self.pos_to_data_index(pos)?;
        Ok(self
            .goto_attributes_start(index)?
            .map(|attr| self.data_index_to_pos(attr)))
    }

    /// Depth-first scan from `index` for the next record accepted by
    /// `predicate`, stopping at `limit`.
    ///
    /// Groups and documents are descended into; attribute contents are
    /// skipped. End markers are passed over, so the scan continues past the
    /// end of the span it started in until `limit`. The record at `index`
    /// itself is only reported when it is a scalar.
    pub fn next_matching_child<P: NodePredicate + ?Sized>(
        &self,
        index: usize,
        predicate: &P,
        limit: usize,
    ) -> Result<Option<usize>, TreeError> {
        let start = index;
        let limit = limit.min(self.gap.capacity());
        let kind = predicate.kind();
        let check_text = matches!(kind, PredicateKind::Node | PredicateKind::Any);
        let check_group = kind != PredicateKind::Attribute;
        let check_attribute = kind != PredicateKind::Group;

        let mut index = if kind == PredicateKind::Node {
            self.next_node_index(index, limit)?
        } else {
            index
        };
        loop {
            index = self.gap.skip_gap(index);
            if index >= limit {
                return Ok(None);
            }
            let unit = self.decode(index)?;
            let (next, candidate) = match unit.record {
                Record::BeginGroup { .. } => (index + BEGIN_GROUP_WIDTH, check_group && index > start),
                Record::BeginDocument { .. } => (index + BEGIN_DOCUMENT_WIDTH, index > start),
                Record::BeginAttribute { end, .. } => (end + 1, check_attribute && index > start),
                Record::EndGroup { .. } | Record::EndAttribute | Record::EndDocument => {
                    (index + unit.width, false)
                }
                _ => (index + unit.width, check_text),
            };
            if candidate && predicate.matches(self, self.data_index_to_pos(index))? {
                return Ok(Some(index));
            }
            index = next;
        }
    }

    fn raw_index(&self, pos: Position) -> usize {
        if pos.is_end() {
            self.gap.capacity()
        } else {
            self.gap.logical_to_physical(pos.index())
        }
    }

    /// Orders two positions of this buffer.
    ///
    /// Positions compare by the index they store. When the flags differ and
    /// the indices are equal, the after position is the greater one;
    /// otherwise a lagging after position is first advanced by one record.
    ///
    /// ```
    /// use core::cmp::Ordering;
    /// use gaptree::{Consumer, Position, TreeBuffer};
    ///
    /// let mut tree = TreeBuffer::new();
    /// tree.write_str("ab")?;
    /// assert_eq!(tree.compare(Position::before(0), Position::before(1))?, Ordering::Less);
    /// assert_eq!(tree.compare(Position::after(0), Position::before(1))?, Ordering::Greater);
    /// assert_eq!(tree.compare(Position::END, Position::END)?, Ordering::Equal);
    /// # Ok::<(), gaptree::TreeError>(())
    /// ```
    pub fn compare(&self, p1: Position, p2: Position) -> Result<Ordering, TreeError> {
        let mut i1 = self.raw_index(p1);
        let mut i2 = self.raw_index(p2);
        if p1.is_after() != p2.is_after() {
            if p1.is_after() {
                if i1 == i2 {
                    return Ok(Ordering::Greater);
                }
                if i1 < i2 {
                    match self.next_data_index(i1)? {
                        Some(next) => i1 = next,
                        None => return Ok(Ordering::Less),
                    }
                }
            } else {
                if i1 == i2 {
                    return Ok(Ordering::Less);
                }
                if i2 < i1 {
                    // Advances from the first position's index, not the second.
                    match self.next_data_index(i1)? {
                        Some(next) => i2 = next,
                        None => return Ok(Ordering::Greater),
                    }
                }
            }
        }
        Ok(i1.cmp(&i2))
    }

    /// Whether a record that is not an end marker follows `pos`.
    pub fn has_next(&self, pos: Position) -> Result<bool, TreeError> {
        let index = self.pos_to_data_index(pos)?;
        if index >= self.gap.capacity() {
            return Ok(false);
        }
        Ok(!self.decode(index)?.record.is_end())
    }

    /// Classifies the node that starts at `pos`.
    ///
    /// Returns [`NodeKind::Eof`] at the end of the content or before an end
    /// record.
    pub fn next_kind(&self, pos: Position) -> Result<NodeKind, TreeError> {
        let index = self.pos_to_data_index(pos)?;
        if index >= self.gap.capacity() {
            return Ok(NodeKind::Eof);
        }
        Ok(match self.decode(index)?.record {
            Record::Char(_) => NodeKind::Char,
            Record::Byte(_) => NodeKind::Byte,
            Record::Bool(_) => NodeKind::Bool,
            Record::Int(_) => NodeKind::Int,
            Record::Long(_) => NodeKind::Long,
            Record::Float(_) => NodeKind::Float,
            Record::Double(_) => NodeKind::Double,
            Record::Object(_) | Record::PositionRef(_) | Record::PositionPair { .. } => {
                NodeKind::Object
            }
            Record::BeginGroup { .. } => NodeKind::Group,
            Record::BeginAttribute { .. } => NodeKind::Attribute,
            Record::BeginDocument { .. } => NodeKind::Document,
            Record::EndGroup { .. } | Record::EndAttribute | Record::EndDocument => NodeKind::Eof,
        })
    }

    fn next_type_index(&self, pos: Position) -> Result<Option<usize>, TreeError> {
        let index = self.pos_to_data_index(pos)?;
        if index >= self.gap.capacity() {
            return Ok(None);
        }
        Ok(match self.decode(index)?.record {
            Record::BeginGroup { type_index, .. } | Record::BeginAttribute { type_index, .. } => {
                Some(type_index)
            }
            _ => None,
        })
    }

    /// Name of the group or attribute that begins at `pos`.
    pub fn next_type_name(&self, pos: Position) -> Result<Option<Arc<str>>, TreeError> {
        let Some(index) = self.next_type_index(pos)? else {
            return Ok(None);
        };
        let name = self.objects.name(index).map_err(|err| self.corruption(err))?;
        Ok(Some(name.clone()))
    }

    /// Node type of the group or attribute that begins at `pos`.
    pub fn next_type_object(&self, pos: Position) -> Result<Option<ObjectRef>, TreeError> {
        let Some(index) = self.next_type_index(pos)? else {
            return Ok(None);
        };
        let ty = self
            .objects
            .node_type(index + 1)
            .map_err(|err| self.corruption(err))?;
        Ok(ty.cloned())
    }

    /// Begin index of the group enclosing the group that begins at `index`.
    pub fn parent_index(&self, index: usize) -> Result<Option<usize>, TreeError> {
        let index = self.gap.skip_gap(index);
        if index >= self.gap.capacity() {
            return Ok(None);
        }
        crate::codec::group_parent(&self.gap, index).map_err(|err| self.corruption(err))
    }

    /// Position of the `n`-th top-level record, or just after the `n`-th
    /// record when `is_after` is set.
    pub fn create_pos(&self, n: usize, is_after: bool) -> Result<Position, TreeError> {
        let steps = if is_after {
            if n == 0 {
                return Ok(Position::START);
            }
            n - 1
        } else {
            n
        };
        let mut index = self.gap.skip_gap(0);
        for walked in 0..steps {
            index = self
                .next_data_index(index)?
                .ok_or(TreeError::OutOfRange { index: n, len: walked })?;
        }
        if is_after && index >= self.gap.capacity() {
            return Err(TreeError::OutOfRange { index: n, len: steps });
        }
        let logical = self.gap.physical_to_logical(index);
        Ok(if is_after {
            Position::after(logical)
        } else {
            Position::before(logical)
        })
    }

    /// Position `n` records past `pos` at the same level, or just after the
    /// `n`-th record from `pos` when `is_after` is set.
    ///
    /// With `is_after` and `n == 0` an after position is returned unchanged;
    /// from a before position that would step backwards and is rejected.
    ///
    /// ```
    /// use gaptree::{Consumer, Position, TreeBuffer};
    ///
    /// let mut tree = TreeBuffer::new();
    /// tree.write_str("ab")?;
    /// tree.write_long(7)?;
    /// let second = tree.create_relative_pos(Position::START, 1, false)?;
    /// assert_eq!(second, Position::before(1));
    /// assert_eq!(tree.create_relative_pos(second, 2, true)?, Position::after(2));
    /// assert!(tree.create_relative_pos(second, 0, true).is_err());
    /// # Ok::<(), gaptree::TreeError>(())
    /// ```
    pub fn create_relative_pos(
        &self,
        pos: Position,
        n: usize,
        is_after: bool,
    ) -> Result<Position, TreeError> {
        let steps = if is_after {
            if n == 0 {
                return if pos.is_after() {
                    Ok(pos)
                } else {
                    Err(self.out_of_range(pos.index()))
                };
            }
            n - 1
        } else {
            n
        };
        let capacity = self.gap.capacity();
        let mut index = self.pos_to_data_index(pos)?;
        for walked in 0..steps {
            index = self
                .next_data_index(index)?
                .ok_or(TreeError::OutOfRange { index: n, len: walked })?;
        }
        let index = self.gap.skip_gap(index);
        if is_after && index >= capacity {
            return Err(TreeError::OutOfRange { index: n, len: steps });
        }
        let logical = self.gap.physical_to_logical(index);
        Ok(if is_after {
            Position::after(logical)
        } else {
            Position::before(logical)
        })
    }

    /// The position after the record at `pos`, or `None` at the end.
    pub fn next_pos(&self, pos: Position) -> Result<Option<Position>, TreeError> {
        let index = self.pos_to_data_index(pos)?;
        if index >= self.gap.capacity() {
            return Ok(None);
        }
        Ok(Some(Position::after(self.gap.physical_to_logical(index))))
    }

    /// Number of top-level records.
    pub fn size(&self) -> Result<usize, TreeError> {
        let mut size = 0;
        let mut pos = Position::START;
        while let Some(next) = self.next_pos(pos)? {
            size += 1;
            pos = next;
        }
        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Consumer;

    /// `<x id="1">y</x>` with the gap at the end.
    fn scenario_c() -> TreeBuffer {
        let mut tree = TreeBuffer::new();
        tree.begin_group("x", None).unwrap();
        tree.begin_attribute("id", None).unwrap();
        tree.write_int(1).unwrap();
        tree.end_attribute().unwrap();
        tree.write_char('y').unwrap();
        tree.end_group("x").unwrap();
        tree
    }

    #[test]
    fn children_skip_attributes() {
        let tree = scenario_c();
        assert_eq!(tree.goto_children_start(0).unwrap(), Some(10));
        assert_eq!(tree.goto_attributes_start(0).unwrap(), Some(3));
        assert_eq!(tree.next_kind(Position::before(10)).unwrap(), NodeKind::Char);
        assert_eq!(tree.next_kind(Position::before(3)).unwrap(), NodeKind::Attribute);
        assert_eq!(tree.goto_children_start(10).unwrap(), None);
        assert_eq!(tree.goto_attributes_start(3).unwrap(), None);
    }

    #[test]
    fn after_positions_resolve_to_successor() {
        let tree = scenario_c();
        assert_eq!(tree.pos_to_data_index(Position::after(0)).unwrap(), tree.capacity());
        assert_eq!(tree.pos_to_data_index(Position::after(3)).unwrap(), 10);
        assert_eq!(tree.pos_to_data_index(Position::after(8)).unwrap(), 9);
        assert_eq!(tree.pos_to_data_index(Position::END).unwrap(), tree.capacity());
        assert!(matches!(
            tree.pos_to_data_index(Position::before(100)),
            Err(TreeError::OutOfRange { index: 100, .. })
        ));
    }

    #[test]
    fn node_index_stops_at_markers() {
        let mut tree = TreeBuffer::new();
        tree.write_str("ab").unwrap();
        tree.write_long(1).unwrap();
        tree.begin_group("g", None).unwrap();
        tree.end_group("g").unwrap();
        assert_eq!(tree.next_node_index(0, usize::MAX).unwrap(), 7);
        assert_eq!(tree.next_node_index(0, 2).unwrap(), 2);
        assert_eq!(tree.next_node_index(10, usize::MAX).unwrap(), 10);
    }

    #[test]
    fn matching_child_by_name() {
        let mut tree = TreeBuffer::new();
        tree.begin_group("root", None).unwrap();
        tree.begin_group("a", None).unwrap();
        tree.begin_attribute("k", None).unwrap();
        tree.write_str("v").unwrap();
        tree.end_attribute().unwrap();
        tree.write_int(1).unwrap();
        tree.end_group("a").unwrap();
        tree.begin_group("b", None).unwrap();
        tree.end_group("b").unwrap();
        tree.end_group("root").unwrap();
        let limit = tree.capacity();

        assert_eq!(tree.next_matching_child(0, &NamedGroup("b"), limit).unwrap(), Some(16));
        assert_eq!(tree.next_matching_child(0, &NamedGroup("a"), limit).unwrap(), Some(3));
        assert_eq!(tree.next_matching_child(0, &NamedGroup("root"), limit).unwrap(), None);
        assert_eq!(tree.next_matching_child(0, &NamedAttribute("k"), limit).unwrap(), Some(6));
        assert_eq!(tree.next_matching_child(0, &PredicateKind::Attribute, 6).unwrap(), None);
        assert_eq!(tree.next_matching_child(13, &PredicateKind::Group, limit).unwrap(), Some(16));
        assert_eq!(tree.next_matching_child(0, &PredicateKind::Any, limit).unwrap(), Some(3));
        assert_eq!(tree.next_matching_child(3, &PredicateKind::Any, limit).unwrap(), Some(6));
        // The attribute value is never visited; the int after it is.
        assert_eq!(tree.next_matching_child(6, &PredicateKind::Any, limit).unwrap(), Some(13));
    }

    #[test]
    fn node_predicate_skips_text() {
        let mut tree = TreeBuffer::new();
        tree.write_str("xyz").unwrap();
        tree.begin_group("g", None).unwrap();
        tree.end_group("g").unwrap();
        let limit = tree.capacity();
        assert_eq!(tree.next_matching_child(0, &PredicateKind::Node, limit).unwrap(), Some(3));
        assert_eq!(tree.next_matching_child(0, &PredicateKind::Any, limit).unwrap(), Some(0));
    }

    #[test]
    fn compare_tie_break() {
        let mut tree = TreeBuffer::new();
        tree.write_str("abc").unwrap();
        let before = Position::before;
        let after = Position::after;
        assert_eq!(tree.compare(before(0), before(2)).unwrap(), Ordering::Less);
        assert_eq!(tree.compare(before(2), before(2)).unwrap(), Ordering::Equal);
        assert_eq!(tree.compare(after(1), after(1)).unwrap(), Ordering::Equal);
        // after(1) stores index 2, the same unit as before(2).
        assert_eq!(tree.compare(after(1), before(2)).unwrap(), Ordering::Greater);
        assert_eq!(tree.compare(before(2), after(1)).unwrap(), Ordering::Less);
        assert_eq!(tree.compare(after(0), before(2)).unwrap(), Ordering::Equal);
        assert_eq!(tree.compare(before(0), Position::END).unwrap(), Ordering::Less);
        assert_eq!(tree.compare(Position::END, before(0)).unwrap(), Ordering::Greater);
    }

    #[test]
    fn type_names_and_objects() {
        let ty = ObjectRef::new("T");
        let mut tree = TreeBuffer::new();
        tree.begin_group("g", Some(&ty)).unwrap();
        tree.write_int(3).unwrap();
        tree.end_group("g").unwrap();
        assert_eq!(tree.next_type_name(Position::START).unwrap().as_deref(), Some("g"));
        assert_eq!(tree.next_type_object(Position::START).unwrap(), Some(ty));
        assert_eq!(tree.next_type_name(Position::before(3)).unwrap(), None);
        assert!(tree.has_next(Position::START).unwrap());
        assert!(!tree.has_next(Position::before(4)).unwrap());
        assert_eq!(tree.next_kind(Position::before(4)).unwrap(), NodeKind::Eof);
    }

    #[test]
    fn parents_follow_nesting() {
        let mut tree = TreeBuffer::new();
        tree.begin_group("a", None).unwrap();
        tree.write_char('x').unwrap();
        tree.begin_group("b", None).unwrap();
        tree.end_group("b").unwrap();
        tree.end_group("a").unwrap();
        assert_eq!(tree.parent_index(0).unwrap(), None);
        assert_eq!(tree.parent_index(4).unwrap(), Some(0));
        assert_eq!(tree.parent_index(3).unwrap(), None);
    }

    #[test]
    fn top_level_positions() {
        let mut tree = TreeBuffer::new();
        assert_eq!(tree.size().unwrap(), 0);
        tree.write_int(1).unwrap();
        tree.write_int(100_000).unwrap();
        tree.begin_group("g", None).unwrap();
        tree.write_int(2).unwrap();
        tree.end_group("g").unwrap();
        assert_eq!(tree.size().unwrap(), 3);
        assert_eq!(tree.create_pos(0, false).unwrap(), Position::START);
        assert_eq!(tree.create_pos(2, false).unwrap(), Position::before(4));
        assert_eq!(tree.create_pos(0, true).unwrap(), Position::START);
        assert_eq!(tree.create_pos(2, true).unwrap(), Position::after(1));
        assert!(matches!(
            tree.create_pos(5, false),
            Err(TreeError::OutOfRange { index: 5, len: 3 })
        ));
        assert_eq!(tree.next_pos(Position::START).unwrap(), Some(Position::after(0)));
        assert_eq!(tree.next_pos(Position::END).unwrap(), None);
    }

    #[test]
    fn after_positions_stop_at_the_last_record() {
        let mut tree = TreeBuffer::new();
        tree.write_int(1).unwrap();
        tree.write_int(2).unwrap();
        assert_eq!(tree.create_pos(2, true).unwrap(), Position::after(1));
        assert_eq!(tree.create_pos(2, false).unwrap(), Position::before(2));
        assert!(matches!(
            tree.create_pos(3, true),
            Err(TreeError::OutOfRange { index: 3, len: 2 })
        ));
    }

    #[test]
    fn relative_positions_walk_siblings() {
        let tree = scenario_c();
        let attribute = Position::before(3);
        let child = Position::before(10);

        assert_eq!(tree.create_relative_pos(Position::START, 0, false).unwrap(), Position::START);
        assert_eq!(tree.create_relative_pos(attribute, 1, false).unwrap(), child);
        assert_eq!(tree.create_relative_pos(attribute, 1, true).unwrap(), Position::after(3));
        assert_eq!(tree.create_relative_pos(child, 1, true).unwrap(), Position::after(10));
        let after = Position::after(10);
        assert_eq!(tree.create_relative_pos(after, 0, true).unwrap(), after);

        // Stepping back from a before position.
        assert!(matches!(
            tree.create_relative_pos(child, 0, true),
            Err(TreeError::OutOfRange { index: 10, .. })
        ));
        // Past the end marker of `x`.
        assert!(matches!(
            tree.create_relative_pos(child, 2, false),
            Err(TreeError::OutOfRange { index: 2, len: 1 })
        ));
        assert!(tree.create_relative_pos(Position::START, 2, true).is_err());
    }
}
