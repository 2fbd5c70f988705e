//! The tagged record encoding.
//!
//! Every record starts with one tag unit; some tags carry payload units after
//! them. 32- and 64-bit payloads are stored big-endian, two and four units
//! wide.
//!
//! | first unit          | record                                        |
//! |---------------------|-----------------------------------------------|
//! | `0x0000..=0x9FFF`   | inline character                              |
//! | `0xA000 \| index`   | group begin, compact (3 units)                |
//! | `0xB000..=0xDFFF`   | inline int, `unit - 0xC000`                   |
//! | `0xE000 \| index`   | object reference, compact                     |
//! | `0xF000 \| byte`    | byte                                          |
//! | `0xF100..=0xF111`   | escapes, see the constants below              |
//!
//! All traversal goes through [`decode`], which reports a record and its
//! width in units.

use crate::{error::CorruptError, gap::GapBuffer, position::Position};

pub(crate) const MAX_CHAR_SHORT: u16 = 0x9FFF;

pub(crate) const BEGIN_GROUP_SHORT: u16 = 0xA000;
pub(crate) const BEGIN_GROUP_SHORT_INDEX_MAX: usize = 0xFFF;

pub(crate) const MIN_INT_SHORT: i32 = -0x1000;
pub(crate) const MAX_INT_SHORT: i32 = 0x1FFF;
pub(crate) const INT_SHORT_ZERO: i32 = 0xC000;

pub(crate) const OBJECT_REF_SHORT: u16 = 0xE000;
pub(crate) const OBJECT_REF_SHORT_INDEX_MAX: usize = 0xFFF;

pub(crate) const BYTE_PREFIX: u16 = 0xF000;
pub(crate) const BOOL_FALSE: u16 = 0xF100;
pub(crate) const BOOL_TRUE: u16 = 0xF101;
pub(crate) const INT_FOLLOWS: u16 = 0xF102;
pub(crate) const LONG_FOLLOWS: u16 = 0xF103;
pub(crate) const FLOAT_FOLLOWS: u16 = 0xF104;
pub(crate) const DOUBLE_FOLLOWS: u16 = 0xF105;
pub(crate) const CHAR_FOLLOWS: u16 = 0xF106;
pub(crate) const CHAR_PAIR_FOLLOWS: u16 = 0xF107;
pub(crate) const BEGIN_GROUP_LONG: u16 = 0xF108;
pub(crate) const BEGIN_ATTRIBUTE_LONG: u16 = 0xF109;
pub(crate) const END_ATTRIBUTE: u16 = 0xF10A;
pub(crate) const END_GROUP_SHORT: u16 = 0xF10B;
pub(crate) const END_GROUP_LONG: u16 = 0xF10C;
pub(crate) const OBJECT_REF_FOLLOWS: u16 = 0xF10D;
pub(crate) const POSITION_REF_FOLLOWS: u16 = 0xF10E;
pub(crate) const POSITION_PAIR_FOLLOWS: u16 = 0xF10F;
pub(crate) const BEGIN_DOCUMENT: u16 = 0xF110;
pub(crate) const END_DOCUMENT: u16 = 0xF111;

pub(crate) const BEGIN_GROUP_WIDTH: usize = 3;
pub(crate) const END_GROUP_SHORT_WIDTH: usize = 2;
pub(crate) const END_GROUP_LONG_WIDTH: usize = 7;
pub(crate) const BEGIN_ATTRIBUTE_WIDTH: usize = 5;
pub(crate) const BEGIN_DOCUMENT_WIDTH: usize = 3;

/// Which of the two group encodings a record uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Form {
    Short,
    Long,
}

impl Form {
    pub(crate) fn end_width(self) -> usize {
        match self {
            Self::Short => END_GROUP_SHORT_WIDTH,
            Self::Long => END_GROUP_LONG_WIDTH,
        }
    }
}

/// One decoded record.
///
/// `end` fields hold the storage index of the matching end marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Record {
    Char(char),
    Byte(u8),
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Object(usize),
    PositionRef(usize),
    PositionPair { seq: usize, pos: Position },
    BeginGroup { type_index: usize, end: usize, form: Form },
    EndGroup { type_index: usize, form: Form },
    BeginAttribute { type_index: usize, end: usize },
    EndAttribute,
    BeginDocument { end: usize },
    EndDocument,
}

impl Record {
    pub(crate) fn is_begin(&self) -> bool {
        matches!(
            self,
            Self::BeginGroup { .. } | Self::BeginAttribute { .. } | Self::BeginDocument { .. }
        )
    }

    pub(crate) fn is_end(&self) -> bool {
        matches!(
            self,
            Self::EndGroup { .. } | Self::EndAttribute | Self::EndDocument
        )
    }
}

/// A record together with the number of units it occupies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Unit {
    pub(crate) record: Record,
    pub(crate) width: usize,
}

impl Unit {
    /// Index of the record following this one, skipping over the whole span
    /// for begin records. `None` for end markers.
    pub(crate) fn next_sibling(&self, index: usize) -> Option<usize> {
        match self.record {
            Record::BeginGroup { end, form, .. } => Some(end + form.end_width()),
            Record::BeginAttribute { end, .. } | Record::BeginDocument { end } => Some(end + 1),
            Record::EndGroup { .. } | Record::EndAttribute | Record::EndDocument => None,
            _ => Some(index + self.width),
        }
    }
}

fn unit_at(gap: &GapBuffer, index: usize) -> Result<u16, CorruptError> {
    gap.get(index).ok_or(CorruptError::Truncated { index })
}

fn int_at(gap: &GapBuffer, index: usize, record: usize) -> Result<i32, CorruptError> {
    gap.get_int(index)
        .ok_or(CorruptError::Truncated { index: record })
}

fn index_at(gap: &GapBuffer, index: usize, record: usize) -> Result<usize, CorruptError> {
    let value = int_at(gap, index, record)?;
    usize::try_from(value).map_err(|_| CorruptError::Truncated { index: record })
}

fn end_at(gap: &GapBuffer, begin: usize, offset_index: usize) -> Result<usize, CorruptError> {
    let offset = int_at(gap, offset_index, begin)?;
    gap.resolve_offset(begin, offset)
        .ok_or(CorruptError::Truncated { index: begin })
}

/// Decodes the record starting at storage index `index`.
pub(crate) fn decode(gap: &GapBuffer, index: usize) -> Result<Unit, CorruptError> {
    let tag = unit_at(gap, index)?;
    let unknown = CorruptError::UnknownTag { code: tag, index };
    let unit = |record, width| Ok(Unit { record, width });

    if tag <= MAX_CHAR_SHORT {
        let ch = char::from_u32(u32::from(tag)).ok_or(unknown)?;
        return unit(Record::Char(ch), 1);
    }
    match tag & 0xF000 {
        0xA000 => {
            let type_index = usize::from(tag & 0x0FFF);
            let end = index + usize::from(unit_at(gap, index + 1)?);
            return unit(
                Record::BeginGroup {
                    type_index,
                    end,
                    form: Form::Short,
                },
                BEGIN_GROUP_WIDTH,
            );
        }
        0xB000..=0xD000 => return unit(Record::Int(i32::from(tag) - INT_SHORT_ZERO), 1),
        0xE000 => return unit(Record::Object(usize::from(tag & 0x0FFF)), 1),
        _ => {}
    }
    if tag & 0xFF00 == BYTE_PREFIX {
        #[allow(clippy::cast_possible_truncation)]
        return unit(Record::Byte(tag as u8), 1);
    }

    match tag {
        BOOL_FALSE | BOOL_TRUE => unit(Record::Bool(tag == BOOL_TRUE), 1),
        INT_FOLLOWS => unit(Record::Int(int_at(gap, index + 1, index)?), 3),
        LONG_FOLLOWS => {
            let value = gap
                .get_long(index + 1)
                .ok_or(CorruptError::Truncated { index })?;
            unit(Record::Long(value), 5)
        }
        FLOAT_FOLLOWS => {
            #[allow(clippy::cast_sign_loss)]
            let bits = int_at(gap, index + 1, index)? as u32;
            unit(Record::Float(f32::from_bits(bits)), 3)
        }
        DOUBLE_FOLLOWS => {
            #[allow(clippy::cast_sign_loss)]
            let bits = gap
                .get_long(index + 1)
                .ok_or(CorruptError::Truncated { index })? as u64;
            unit(Record::Double(f64::from_bits(bits)), 5)
        }
        CHAR_FOLLOWS => {
            let code = unit_at(gap, index + 1)?;
            let ch = char::from_u32(u32::from(code)).ok_or(unknown)?;
            unit(Record::Char(ch), 2)
        }
        CHAR_PAIR_FOLLOWS => {
            let pair = [unit_at(gap, index + 1)?, unit_at(gap, index + 2)?];
            let ch = char::decode_utf16(pair)
                .next()
                .and_then(Result::ok)
                .ok_or(unknown)?;
            unit(Record::Char(ch), 3)
        }
        BEGIN_GROUP_LONG => {
            let end = end_at(gap, index, index + 1)?;
            if unit_at(gap, end)? != END_GROUP_LONG {
                return Err(CorruptError::Truncated { index });
            }
            let type_index = index_at(gap, end + 1, end)?;
            unit(
                Record::BeginGroup {
                    type_index,
                    end,
                    form: Form::Long,
                },
                BEGIN_GROUP_WIDTH,
            )
        }
        END_GROUP_SHORT => {
            let offset = usize::from(unit_at(gap, index + 1)?);
            let begin = index
                .checked_sub(offset)
                .ok_or(CorruptError::Truncated { index })?;
            let begin_tag = unit_at(gap, begin)?;
            if begin_tag & 0xF000 != BEGIN_GROUP_SHORT {
                return Err(CorruptError::UnknownTag {
                    code: begin_tag,
                    index: begin,
                });
            }
            unit(
                Record::EndGroup {
                    type_index: usize::from(begin_tag & 0x0FFF),
                    form: Form::Short,
                },
                END_GROUP_SHORT_WIDTH,
            )
        }
        END_GROUP_LONG => unit(
            Record::EndGroup {
                type_index: index_at(gap, index + 1, index)?,
                form: Form::Long,
            },
            END_GROUP_LONG_WIDTH,
        ),
        BEGIN_ATTRIBUTE_LONG => {
            let type_index = index_at(gap, index + 1, index)?;
            let end = end_at(gap, index, index + 3)?;
            unit(
                Record::BeginAttribute { type_index, end },
                BEGIN_ATTRIBUTE_WIDTH,
            )
        }
        END_ATTRIBUTE => unit(Record::EndAttribute, 1),
        OBJECT_REF_FOLLOWS => unit(Record::Object(index_at(gap, index + 1, index)?), 3),
        POSITION_REF_FOLLOWS => unit(Record::PositionRef(index_at(gap, index + 1, index)?), 3),
        POSITION_PAIR_FOLLOWS => {
            let seq = index_at(gap, index + 1, index)?;
            #[allow(clippy::cast_sign_loss)]
            let stored = int_at(gap, index + 3, index)? as u32;
            unit(
                Record::PositionPair {
                    seq,
                    pos: Position::from_stored(stored),
                },
                5,
            )
        }
        BEGIN_DOCUMENT => {
            let end = end_at(gap, index, index + 1)?;
            unit(Record::BeginDocument { end }, BEGIN_DOCUMENT_WIDTH)
        }
        END_DOCUMENT => unit(Record::EndDocument, 1),
        _ => Err(unknown),
    }
}

/// Width of the record that encodes `ch`.
pub(crate) fn char_width(ch: char) -> usize {
    match u32::from(ch) {
        0..=0x9FFF => 1,
        0xA000..=0xFFFF => 2,
        _ => 3,
    }
}

/// Parent of the group whose begin record sits at `begin`, from the parent
/// offset stored in the record (compact form) or its end marker (wide form).
pub(crate) fn group_parent(gap: &GapBuffer, begin: usize) -> Result<Option<usize>, CorruptError> {
    let Unit { record, .. } = decode(gap, begin)?;
    let offset = match record {
        Record::BeginGroup {
            form: Form::Short, ..
        } => usize::from(unit_at(gap, begin + 2)?),
        Record::BeginGroup {
            end,
            form: Form::Long,
            ..
        } => index_at(gap, end + 5, end)?,
        _ => return Ok(None),
    };
    if offset == 0 {
        return Ok(None);
    }
    begin
        .checked_sub(offset)
        .map(Some)
        .ok_or(CorruptError::Truncated { index: begin })
}
