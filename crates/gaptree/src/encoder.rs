//! Recording side of [`TreeBuffer`]: the [`Consumer`] implementation.
//!
//! Spans are opened by writing the begin record before the gap and a
//! placeholder end marker after it, so that everything written in between
//! lands inside the brackets. Closing a span moves the end marker to just
//! before the gap and settles on the compact or wide encoding.

use alloc::{string::ToString, sync::Arc};

use crate::{
    codec::{
        BEGIN_ATTRIBUTE_LONG, BEGIN_ATTRIBUTE_WIDTH, BEGIN_DOCUMENT, BEGIN_DOCUMENT_WIDTH,
        BEGIN_GROUP_LONG, BEGIN_GROUP_SHORT, BEGIN_GROUP_SHORT_INDEX_MAX, BEGIN_GROUP_WIDTH,
        BOOL_FALSE, BOOL_TRUE, BYTE_PREFIX, CHAR_FOLLOWS, CHAR_PAIR_FOLLOWS, DOUBLE_FOLLOWS,
        END_ATTRIBUTE, END_DOCUMENT, END_GROUP_LONG, END_GROUP_LONG_WIDTH, END_GROUP_SHORT,
        FLOAT_FOLLOWS, INT_FOLLOWS, INT_SHORT_ZERO, LONG_FOLLOWS, MAX_CHAR_SHORT, MAX_INT_SHORT,
        MIN_INT_SHORT, OBJECT_REF_FOLLOWS, OBJECT_REF_SHORT, OBJECT_REF_SHORT_INDEX_MAX,
        POSITION_PAIR_FOLLOWS, POSITION_REF_FOLLOWS, char_width,
    },
    consumer::Consumer,
    error::{ProtocolError, SpanKind, TreeError},
    gap::MAX_CAPACITY,
    object_table::ObjectRef,
    position::{Position, SeqPosition},
    tree::{OpenGroup, TreeBuffer},
};

/// Converts a storage index or offset into the signed 32-bit field stored in
/// the encoding. Capacities are capped so this always fits.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn field(value: usize) -> i32 {
    debug_assert!(value <= MAX_CAPACITY);
    value as i32
}

/// Offset of a placeholder counted back from the end of the allocation.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn from_end(capacity: usize, index: usize) -> i32 {
    -field(capacity - index)
}

impl TreeBuffer {
    fn stored_index(index: usize) -> Result<i32, TreeError> {
        i32::try_from(index).map_err(|_| TreeError::CapacityOverflow { requested: index })
    }

    fn push_char(&mut self, ch: char) {
        let code = u32::from(ch);
        #[allow(clippy::cast_possible_truncation)]
        if code <= u32::from(MAX_CHAR_SHORT) {
            self.gap.push(code as u16);
        } else if code <= 0xFFFF {
            self.gap.push(CHAR_FOLLOWS);
            self.gap.push(code as u16);
        } else {
            let mut pair = [0u16; 2];
            ch.encode_utf16(&mut pair);
            self.gap.push(CHAR_PAIR_FOLLOWS);
            self.gap.push(pair[0]);
            self.gap.push(pair[1]);
        }
    }

    /// Writes raw UTF-8 input as characters.
    ///
    /// Invalid sequences are replaced with U+FFFD.
    ///
    /// ```
    /// use gaptree::TreeBuffer;
    ///
    /// let mut tree = TreeBuffer::new();
    /// tree.write_utf8(b"caf\xC3\xA9 \xFF")?;
    /// assert_eq!(tree.to_string(), "café \u{FFFD}");
    /// # Ok::<(), gaptree::TreeError>(())
    /// ```
    pub fn write_utf8(&mut self, mut bytes: &[u8]) -> Result<(), TreeError> {
        while !bytes.is_empty() {
            let (ch, size) = bstr::decode_utf8(bytes);
            self.write_char(ch.unwrap_or(char::REPLACEMENT_CHARACTER))?;
            bytes = &bytes[size..];
        }
        Ok(())
    }
}

impl Consumer for TreeBuffer {
    type Error = TreeError;

    fn begin_document(&mut self) -> Result<(), TreeError> {
        if self.doc_start.is_some() {
            return Err(self.violation(ProtocolError::NestedDocument));
        }
        if self.attr_start.is_some() {
            return Err(self.violation(ProtocolError::BeginInsideAttribute(SpanKind::Document)));
        }
        self.gap.ensure_space(BEGIN_DOCUMENT_WIDTH + 1)?;
        let begin = self.gap.gap_start();
        let end = self.gap.reserve_tail(1);
        self.gap.set(end, END_DOCUMENT);
        self.gap.push(BEGIN_DOCUMENT);
        self.gap.push_int(from_end(self.gap.capacity(), end));
        self.doc_start = Some(begin);
        Ok(())
    }

    fn end_document(&mut self) -> Result<(), TreeError> {
        let open = self.innermost_open();
        let Some(begin) = self.doc_start.filter(|_| open == Some(SpanKind::Document)) else {
            return Err(self.violation(ProtocolError::UnexpectedEnd {
                expected: SpanKind::Document,
                found: open,
            }));
        };
        self.gap.release_tail(1);
        let end = self.gap.gap_start();
        self.gap.set_int(begin + 1, field(end - begin));
        self.gap.push(END_DOCUMENT);
        self.doc_start = None;
        Ok(())
    }

    fn begin_group(&mut self, name: &str, ty: Option<&ObjectRef>) -> Result<(), TreeError> {
        if self.attr_start.is_some() {
            return Err(self.violation(ProtocolError::BeginInsideAttribute(SpanKind::Group)));
        }
        let type_index = self.objects.intern_pair(name, ty)?;
        let stored_type = Self::stored_index(type_index)?;
        self.gap.ensure_space(BEGIN_GROUP_WIDTH + END_GROUP_LONG_WIDTH)?;

        let begin = self.gap.gap_start();
        let parent_offset = self.open_groups.last().map_or(0, |parent| begin - parent.begin);
        let end = self.gap.reserve_tail(END_GROUP_LONG_WIDTH);
        self.gap.set(end, END_GROUP_LONG);
        self.gap.set_int(end + 1, stored_type);
        self.gap.set_int(end + 3, 0);
        self.gap.set_int(end + 5, field(parent_offset));

        self.gap.push(BEGIN_GROUP_LONG);
        self.gap.push_int(from_end(self.gap.capacity(), end));
        self.open_groups.push(OpenGroup { type_index, begin });
        Ok(())
    }

    fn end_group(&mut self, name: &str) -> Result<(), TreeError> {
        let open = self.innermost_open();
        let Some(group) = self.open_groups.last().copied().filter(|_| open == Some(SpanKind::Group))
        else {
            return Err(self.violation(ProtocolError::UnexpectedEnd {
                expected: SpanKind::Group,
                found: open,
            }));
        };
        let expected = self
            .objects
            .name(group.type_index)
            .map_err(|err| self.corruption(err))?;
        if &**expected != name {
            let err = ProtocolError::MismatchedGroupName {
                expected: expected.to_string(),
                found: name.into(),
            };
            return Err(self.violation(err));
        }

        let stored_type = Self::stored_index(group.type_index)?;
        self.gap.release_tail(END_GROUP_LONG_WIDTH);
        self.open_groups.pop();
        let begin = group.begin;
        let offset = self.gap.gap_start() - begin;
        let parent_offset = self.open_groups.last().map_or(0, |parent| begin - parent.begin);

        #[allow(clippy::cast_possible_truncation)]
        if self.options.compact_groups
            && group.type_index < BEGIN_GROUP_SHORT_INDEX_MAX
            && offset < 0x1_0000
            && parent_offset < 0x1_0000
        {
            self.gap.set(begin, BEGIN_GROUP_SHORT | group.type_index as u16);
            self.gap.set(begin + 1, offset as u16);
            self.gap.set(begin + 2, parent_offset as u16);
            self.gap.push(END_GROUP_SHORT);
            self.gap.push(offset as u16);
        } else {
            self.gap.set(begin, BEGIN_GROUP_LONG);
            self.gap.set_int(begin + 1, field(offset));
            self.gap.push(END_GROUP_LONG);
            self.gap.push_int(stored_type);
            self.gap.push_int(field(offset));
            self.gap.push_int(field(parent_offset));
        }
        Ok(())
    }

    fn begin_attribute(&mut self, name: &str, ty: Option<&ObjectRef>) -> Result<(), TreeError> {
        if self.attr_start.is_some() {
            return Err(self.violation(ProtocolError::NestedAttribute));
        }
        let type_index = self.objects.intern_pair(name, ty)?;
        let stored_type = Self::stored_index(type_index)?;
        self.gap.ensure_space(BEGIN_ATTRIBUTE_WIDTH + 1)?;

        let begin = self.gap.gap_start();
        let end = self.gap.reserve_tail(1);
        self.gap.set(end, END_ATTRIBUTE);
        self.gap.push(BEGIN_ATTRIBUTE_LONG);
        self.gap.push_int(stored_type);
        self.gap.push_int(from_end(self.gap.capacity(), end));
        self.attr_start = Some(begin);
        Ok(())
    }

    fn end_attribute(&mut self) -> Result<(), TreeError> {
        let open = self.innermost_open();
        let Some(begin) = self.attr_start.filter(|_| open == Some(SpanKind::Attribute)) else {
            return Err(self.violation(ProtocolError::UnexpectedEnd {
                expected: SpanKind::Attribute,
                found: open,
            }));
        };
        self.gap.release_tail(1);
        let end = self.gap.gap_start();
        self.gap.set_int(begin + 3, field(end - begin));
        self.gap.push(END_ATTRIBUTE);
        self.attr_start = None;
        Ok(())
    }

    fn write_bool(&mut self, value: bool) -> Result<(), TreeError> {
        self.gap.ensure_space(1)?;
        self.gap.push(if value { BOOL_TRUE } else { BOOL_FALSE });
        Ok(())
    }

    fn write_byte(&mut self, value: u8) -> Result<(), TreeError> {
        self.gap.ensure_space(1)?;
        self.gap.push(BYTE_PREFIX | u16::from(value));
        Ok(())
    }

    fn write_char(&mut self, value: char) -> Result<(), TreeError> {
        self.gap.ensure_space(char_width(value))?;
        self.push_char(value);
        Ok(())
    }

    fn write_int(&mut self, value: i32) -> Result<(), TreeError> {
        if (MIN_INT_SHORT..=MAX_INT_SHORT).contains(&value) {
            self.gap.ensure_space(1)?;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            self.gap.push((INT_SHORT_ZERO + value) as u16);
        } else {
            self.gap.ensure_space(3)?;
            self.gap.push(INT_FOLLOWS);
            self.gap.push_int(value);
        }
        Ok(())
    }

    fn write_long(&mut self, value: i64) -> Result<(), TreeError> {
        self.gap.ensure_space(5)?;
        self.gap.push(LONG_FOLLOWS);
        self.gap.push_long(value);
        Ok(())
    }

    fn write_float(&mut self, value: f32) -> Result<(), TreeError> {
        self.gap.ensure_space(3)?;
        self.gap.push(FLOAT_FOLLOWS);
        #[allow(clippy::cast_possible_wrap)]
        self.gap.push_int(value.to_bits() as i32);
        Ok(())
    }

    fn write_double(&mut self, value: f64) -> Result<(), TreeError> {
        self.gap.ensure_space(5)?;
        self.gap.push(DOUBLE_FOLLOWS);
        #[allow(clippy::cast_possible_wrap)]
        self.gap.push_long(value.to_bits() as i64);
        Ok(())
    }

    fn write_str(&mut self, text: &str) -> Result<(), TreeError> {
        let width = text.chars().map(char_width).sum();
        self.gap.ensure_space(width)?;
        for ch in text.chars() {
            self.push_char(ch);
        }
        Ok(())
    }

    fn write_object(&mut self, object: &ObjectRef) -> Result<(), TreeError> {
        if let Some(position) = object.downcast_ref::<SeqPosition>() {
            return self.write_position(&position.sequence, position.pos);
        }
        let index = self.objects.intern_object(object)?;
        self.gap.ensure_space(3)?;
        #[allow(clippy::cast_possible_truncation)]
        if index <= OBJECT_REF_SHORT_INDEX_MAX {
            self.gap.push(OBJECT_REF_SHORT | index as u16);
        } else {
            let stored = Self::stored_index(index)?;
            self.gap.push(OBJECT_REF_FOLLOWS);
            self.gap.push_int(stored);
        }
        Ok(())
    }

    fn write_position(&mut self, sequence: &Arc<TreeBuffer>, pos: Position) -> Result<(), TreeError> {
        let stored_pos = pos
            .to_stored()
            .ok_or(TreeError::CapacityOverflow { requested: pos.raw() })?;
        let seq_index = self.objects.intern_sequence(sequence)?;
        let stored_seq = Self::stored_index(seq_index)?;
        self.gap.ensure_space(5)?;
        self.gap.push(POSITION_PAIR_FOLLOWS);
        self.gap.push_int(stored_seq);
        #[allow(clippy::cast_possible_wrap)]
        self.gap.push_int(stored_pos as i32);
        Ok(())
    }

    fn consume_position(&mut self, position: &SeqPosition) -> Result<(), TreeError> {
        let index = self.objects.insert_position(position)?;
        let stored = Self::stored_index(index)?;
        self.gap.ensure_space(3)?;
        self.gap.push(POSITION_REF_FOLLOWS);
        self.gap.push_int(stored);
        Ok(())
    }
}
