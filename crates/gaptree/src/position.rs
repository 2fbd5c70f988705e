use alloc::sync::Arc;
use core::fmt;

use crate::tree::TreeBuffer;

/// A stable address inside a [`TreeBuffer`].
///
/// A position packs a logical unit index (the index the unit would have if
/// the edit gap were empty) together with a before/after flag:
/// `(index << 1) | is_after`. A *before* position addresses the record that
/// starts at `index`; an *after* position stores `start + 1` of the record it
/// follows, so that it resolves to whatever record comes next.
///
/// Positions never record where the gap was, so they survive growth and gap
/// movement, but they go stale once content is reordered.
#[cfg_attr(any(test, feature = "serde"), derive(serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position(usize);

impl Position {
    /// Before the first record.
    pub const START: Self = Self(0);

    /// End of the sequence. Resolves to the capacity of the buffer.
    pub const END: Self = Self(usize::MAX);

    /// The position before the record starting at logical `index`.
    #[must_use]
    pub const fn before(index: usize) -> Self {
        Self(index << 1)
    }

    /// The position after the record starting at logical `start`.
    #[must_use]
    pub const fn after(start: usize) -> Self {
        Self(((start + 1) << 1) | 1)
    }

    /// Rebuilds a position from [`Position::raw`].
    #[must_use]
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    /// The packed `(index << 1) | after` value.
    #[must_use]
    pub const fn raw(self) -> usize {
        self.0
    }

    /// The logical unit index stored in this position.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 >> 1
    }

    /// Whether this is an after position. [`Position::END`] is one.
    #[must_use]
    pub const fn is_after(self) -> bool {
        self.0 & 1 != 0
    }

    /// Whether this is [`Position::END`].
    #[must_use]
    pub const fn is_end(self) -> bool {
        self.0 == usize::MAX
    }

    /// Packs the position into the 32 bits stored by a position record.
    pub(crate) fn to_stored(self) -> Option<u32> {
        if self.is_end() {
            Some(u32::MAX)
        } else {
            u32::try_from(self.0).ok().filter(|raw| *raw != u32::MAX)
        }
    }

    pub(crate) fn from_stored(stored: u32) -> Self {
        if stored == u32::MAX {
            Self::END
        } else {
            Self(stored as usize)
        }
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_end() {
            f.write_str("Position(END)")
        } else if self.is_after() {
            write!(f, "Position(after {})", self.index().saturating_sub(1))
        } else {
            write!(f, "Position(before {})", self.index())
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_end() {
            f.write_str("end")
        } else if self.is_after() {
            write!(f, "{}+", self.index().saturating_sub(1))
        } else {
            write!(f, "{}", self.index())
        }
    }
}

/// A position bound to the sequence it addresses.
///
/// Writing a `SeqPosition` into a buffer stores a live reference instead of
/// copying the addressed content.
#[derive(Clone)]
pub struct SeqPosition {
    /// The buffer the position points into.
    pub sequence: Arc<TreeBuffer>,
    /// Position inside `sequence`.
    pub pos: Position,
}

impl SeqPosition {
    /// Pairs `sequence` with `pos`.
    #[must_use]
    pub fn new(sequence: Arc<TreeBuffer>, pos: Position) -> Self {
        Self { sequence, pos }
    }
}

impl PartialEq for SeqPosition {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.sequence, &other.sequence) && self.pos == other.pos
    }
}

impl fmt::Debug for SeqPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeqPosition")
            .field("pos", &self.pos)
            .field("sequence_len", &self.sequence.len())
            .finish()
    }
}

impl fmt::Display for SeqPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<position {}>", self.pos)
    }
}

#[cfg(any(test, feature = "serde"))]
impl serde::Serialize for SeqPosition {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct("SeqPosition", &self.pos)
    }
}
