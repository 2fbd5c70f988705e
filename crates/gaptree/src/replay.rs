//! Replaying recorded content into sinks, and the queries built on it.

use alloc::string::String;
use core::fmt::{Display, Write};

use crate::{
    codec::Record,
    consumer::Consumer,
    error::{ReplayError, TreeError},
    object_table::ObjectRef,
    position::{Position, SeqPosition},
    tree::TreeBuffer,
    value::Value,
};

macro_rules! sink {
    ($call:expr) => {
        $call.map_err(ReplayError::Sink)?
    };
}

fn append(out: &mut String, value: impl Display) {
    // Writing into a `String` cannot fail.
    let _ = write!(out, "{value}");
}

impl TreeBuffer {
    /// Replays the records in the storage range `[start, end)` into `sink`
    /// and returns the index where replay stopped.
    ///
    /// A range that spans the gap is replayed as if the gap were not there.
    /// Runs of characters arrive as a single
    /// [`write_str`](Consumer::write_str) call. Nothing is decoded for a
    /// sink that reports [`ignoring`](Consumer::ignoring).
    pub fn replay<C: Consumer + ?Sized>(
        &self,
        start: usize,
        end: usize,
        sink: &mut C,
    ) -> Result<usize, ReplayError<C::Error>> {
        let end = end.min(self.gap.capacity());
        if sink.ignoring() {
            return Ok(end);
        }
        let gap_start = self.gap.gap_start();
        let gap_end = self.gap.gap_end();
        let mut limit = if start <= gap_start && end > gap_start {
            gap_start
        } else {
            end
        };
        let mut index = start;
        let mut text = String::new();

        loop {
            if index >= limit {
                if index == gap_start && end > gap_end {
                    index = gap_end;
                    limit = end;
                } else {
                    break;
                }
            }

            let unit = self.decode(index)?;
            match unit.record {
                Record::Char(ch) => {
                    text.clear();
                    text.push(ch);
                    index += unit.width;
                    while index < limit {
                        let next = self.decode(index)?;
                        let Record::Char(ch) = next.record else {
                            break;
                        };
                        text.push(ch);
                        index += next.width;
                    }
                    sink!(sink.write_str(&text));
                    continue;
                }
                Record::Byte(v) => sink!(sink.write_byte(v)),
                Record::Bool(v) => sink!(sink.write_bool(v)),
                Record::Int(v) => sink!(sink.write_int(v)),
                Record::Long(v) => sink!(sink.write_long(v)),
                Record::Float(v) => sink!(sink.write_float(v)),
                Record::Double(v) => sink!(sink.write_double(v)),
                Record::Object(slot) => {
                    let object = self.objects.object(slot).map_err(|err| self.corruption(err))?;
                    sink!(sink.write_object(object));
                }
                Record::PositionRef(slot) => {
                    let position = self
                        .objects
                        .position(slot)
                        .map_err(|err| self.corruption(err))?;
                    sink!(sink.consume_position(position));
                }
                Record::PositionPair { seq, pos } => {
                    let sequence = self.objects.sequence(seq).map_err(|err| self.corruption(err))?;
                    sink!(sink.write_position(sequence, pos));
                }
                Record::BeginGroup { type_index, .. } => {
                    let (name, ty) = self.key(type_index)?;
                    sink!(sink.begin_group(name, ty));
                }
                Record::EndGroup { type_index, .. } => {
                    let name = self.objects.name(type_index).map_err(|err| self.corruption(err))?;
                    sink!(sink.end_group(name));
                }
                Record::BeginAttribute { type_index, .. } => {
                    let (name, ty) = self.key(type_index)?;
                    sink!(sink.begin_attribute(name, ty));
                }
                Record::EndAttribute => sink!(sink.end_attribute()),
                Record::BeginDocument { .. } => sink!(sink.begin_document()),
                Record::EndDocument => sink!(sink.end_document()),
            }
            index += unit.width;
        }
        Ok(index)
    }

    fn key(&self, type_index: usize) -> Result<(&str, Option<&ObjectRef>), TreeError> {
        let name = self.objects.name(type_index).map_err(|err| self.corruption(err))?;
        let ty = self
            .objects
            .node_type(type_index + 1)
            .map_err(|err| self.corruption(err))?;
        Ok((&**name, ty))
    }

    /// Replays the whole buffer into `sink`.
    pub fn consume<C: Consumer + ?Sized>(&self, sink: &mut C) -> Result<(), ReplayError<C::Error>> {
        self.replay(0, self.gap.capacity(), sink)?;
        Ok(())
    }

    /// Replays everything between two positions into `sink`.
    pub fn consume_pos_range<C: Consumer + ?Sized>(
        &self,
        start: Position,
        end: Position,
        sink: &mut C,
    ) -> Result<(), ReplayError<C::Error>> {
        let start = self.pos_to_data_index(start)?;
        let end = self.pos_to_data_index(end)?;
        self.replay(start, end, sink)?;
        Ok(())
    }

    /// Replays the node at `pos` into `sink`: a whole span, or the run of
    /// scalars up to the next structural record. Returns `false` when
    /// nothing follows `pos`.
    pub fn consume_next<C: Consumer + ?Sized>(
        &self,
        pos: Position,
        sink: &mut C,
    ) -> Result<bool, ReplayError<C::Error>> {
        if !self.has_next(pos)? {
            return Ok(false);
        }
        let start = self.pos_to_data_index(pos)?;
        let mut end = self.next_node_index(start, self.gap.capacity())?;
        if end == start {
            end = self.next_data_index(start)?.unwrap_or(start);
        }
        self.replay(start, end, sink)?;
        Ok(true)
    }

    /// The text content of the node at `pos`.
    ///
    /// Scalars are rendered and concatenated, descending into groups and
    /// documents. Attribute values are left out when flattening a group, but
    /// an attribute's own string value is its content. Stored positions are
    /// followed into the sequence they point at.
    ///
    /// ```
    /// use gaptree::{Consumer, Position, TreeBuffer};
    ///
    /// let mut tree = TreeBuffer::new();
    /// tree.begin_group("p", None)?;
    /// tree.begin_attribute("lang", None)?;
    /// tree.write_str("en")?;
    /// tree.end_attribute()?;
    /// tree.write_str("n = ")?;
    /// tree.write_int(3)?;
    /// tree.end_group("p")?;
    ///
    /// assert_eq!(tree.string_value(Position::START)?, "n = 3");
    /// let attr = tree.attributes_start(Position::START)?.unwrap();
    /// assert_eq!(tree.string_value(attr)?, "en");
    /// # Ok::<(), gaptree::TreeError>(())
    /// ```
    pub fn string_value(&self, pos: Position) -> Result<String, TreeError> {
        let index = self.pos_to_data_index(pos)?;
        let mut out = String::new();
        self.string_value_into(index, &mut out)?;
        Ok(out)
    }

    fn string_value_into(&self, index: usize, out: &mut String) -> Result<(), TreeError> {
        let capacity = self.gap.capacity();
        let index = self.gap.skip_gap(index);
        let next = self.next_node_index(index, capacity)?;
        if next == index {
            return self.string_value_at(false, index, out);
        }
        // A run of scalars; indices are compared only once moved past the gap.
        let mut index = index;
        while index < next {
            let unit = self.decode(index)?;
            self.append_scalar(false, unit.record, out)?;
            index = self.gap.skip_gap(index + unit.width);
        }
        Ok(())
    }

    /// Appends the text of the record at `index`.
    ///
    /// Spans are flattened in one forward scan to the end of the span, so
    /// nesting depth costs no stack. Attributes other than the record itself
    /// are jumped over, as are all attributes when `in_group` is set.
    fn string_value_at(
        &self,
        in_group: bool,
        index: usize,
        out: &mut String,
    ) -> Result<(), TreeError> {
        let capacity = self.gap.capacity();
        let root = self.gap.skip_gap(index);
        if root >= capacity {
            return Ok(());
        }
        let unit = self.decode(root)?;
        let stop = match unit.record {
            Record::BeginAttribute { .. } if in_group => return Ok(()),
            record if record.is_end() => return Ok(()),
            _ => unit
                .next_sibling(root)
                .map_or(capacity, |next| self.gap.skip_gap(next)),
        };

        let mut index = root;
        while index < stop {
            let unit = self.decode(index)?;
            let next = match unit.record {
                Record::BeginAttribute { .. } if index != root => unit
                    .next_sibling(index)
                    .map_or(capacity, |end| end.max(index + unit.width)),
                record if record.is_begin() || record.is_end() => index + unit.width,
                record => {
                    self.append_scalar(in_group || index != root, record, out)?;
                    index + unit.width
                }
            };
            index = self.gap.skip_gap(next);
        }
        Ok(())
    }

    fn append_scalar(
        &self,
        in_group: bool,
        record: Record,
        out: &mut String,
    ) -> Result<(), TreeError> {
        match record {
            Record::Char(ch) => out.push(ch),
            Record::Byte(v) => append(out, v),
            Record::Bool(v) => append(out, v),
            Record::Int(v) => append(out, v),
            Record::Long(v) => append(out, v),
            Record::Float(v) => append(out, v),
            Record::Double(v) => append(out, v),
            Record::Object(slot) => {
                let object = self.objects.object(slot).map_err(|err| self.corruption(err))?;
                append(out, object);
            }
            Record::PositionRef(slot) => {
                let position = self
                    .objects
                    .position(slot)
                    .map_err(|err| self.corruption(err))?;
                position.sequence.string_value_of(in_group, position.pos, out)?;
            }
            Record::PositionPair { seq, pos } => {
                let sequence = self.objects.sequence(seq).map_err(|err| self.corruption(err))?;
                sequence.string_value_of(in_group, pos, out)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn string_value_of(
        &self,
        in_group: bool,
        pos: Position,
        out: &mut String,
    ) -> Result<(), TreeError> {
        let index = self.pos_to_data_index(pos)?;
        self.string_value_at(in_group, index, out)
    }

    /// Decodes the record at `pos` into an owned [`Value`].
    pub fn materialize(&self, pos: Position) -> Result<Value, TreeError> {
        let index = self.pos_to_data_index(pos)?;
        self.materialize_at(index)
    }

    fn materialize_at(&self, index: usize) -> Result<Value, TreeError> {
        let index = self.gap.skip_gap(index);
        if index >= self.gap.capacity() {
            return Ok(Value::Eof);
        }
        let unit = self.decode(index)?;
        Ok(match unit.record {
            Record::Char(v) => Value::Char(v),
            Record::Byte(v) => Value::Byte(v),
            Record::Bool(v) => Value::Bool(v),
            Record::Int(v) => Value::Int(v),
            Record::Long(v) => Value::Long(v),
            Record::Float(v) => Value::Float(v),
            Record::Double(v) => Value::Double(v),
            Record::Object(slot) => {
                let object = self.objects.object(slot).map_err(|err| self.corruption(err))?;
                Value::Object(object.clone())
            }
            Record::PositionRef(slot) => {
                let position = self
                    .objects
                    .position(slot)
                    .map_err(|err| self.corruption(err))?;
                Value::Position(position.clone())
            }
            Record::PositionPair { seq, pos } => {
                let sequence = self.objects.sequence(seq).map_err(|err| self.corruption(err))?;
                Value::Position(SeqPosition::new(sequence.clone(), pos))
            }
            Record::BeginGroup { .. } | Record::BeginAttribute { .. } | Record::BeginDocument { .. } => {
                let end = unit.next_sibling(index).unwrap_or(self.gap.capacity());
                Value::Tree(TreeBuffer::from_range(self, index, end)?)
            }
            Record::EndGroup { .. } | Record::EndAttribute | Record::EndDocument => Value::Eof,
        })
    }

    /// Decodes the record that ends at `pos` into an owned [`Value`].
    ///
    /// An after position names its record directly. A before position is
    /// resolved against the top-level records, so it must sit on a top-level
    /// boundary; [`Value::Eof`] is returned when nothing precedes it.
    pub fn prev_value(&self, pos: Position) -> Result<Value, TreeError> {
        if pos.is_after() && !pos.is_end() {
            let start = pos.index() - 1;
            return self.materialize(Position::before(start));
        }
        let target = self.pos_to_data_index(pos)?;
        let capacity = self.gap.capacity();
        let mut index = self.gap.skip_gap(0);
        let mut previous = None;
        while index < target {
            previous = Some(index);
            index = self.next_data_index(index)?.unwrap_or(capacity);
        }
        if index != target {
            return Err(TreeError::OutOfRange {
                index: pos.index(),
                len: self.len(),
            });
        }
        previous.map_or(Ok(Value::Eof), |index| self.materialize_at(index))
    }

    /// Materializes the `n`-th top-level record.
    pub fn get(&self, n: usize) -> Result<Value, TreeError> {
        let capacity = self.gap.capacity();
        let mut index = self.gap.skip_gap(0);
        let mut walked = 0;
        while walked < n && index < capacity {
            index = self.next_data_index(index)?.unwrap_or(capacity);
            walked += 1;
        }
        if index >= capacity {
            return Err(TreeError::OutOfRange {
                index: n,
                len: walked,
            });
        }
        self.materialize_at(index)
    }
}
