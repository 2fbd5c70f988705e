//! Gap-buffered storage of 16-bit code units.
//!
//! The live content is split into a head `[0, gap_start)` and a tail
//! `[gap_end, capacity)`. Appends land at `gap_start`; span placeholders are
//! pushed onto the front of the tail. Reallocation keeps the tail flush
//! against the end of the allocation, so an index measured from the end of
//! the buffer stays valid across growth.

use alloc::vec::Vec;

use crate::error::TreeError;

/// Largest capacity whose indices still fit the signed 32-bit offsets stored
/// inside the encoding.
pub(crate) const MAX_CAPACITY: usize = i32::MAX as usize;

/// Counters describing the reallocations performed by a buffer.
#[cfg_attr(any(test, feature = "serde"), derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrowthStats {
    /// Number of times the backing storage was replaced by a larger one.
    pub reallocations: usize,
    /// Total number of live units copied into new storage.
    pub units_copied: usize,
}

#[derive(Clone)]
pub(crate) struct GapBuffer {
    data: Vec<u16>,
    head_len: usize,
    tail_len: usize,
    stats: GrowthStats,
}

impl GapBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            data: alloc::vec![0; capacity.min(MAX_CAPACITY)],
            head_len: 0,
            tail_len: 0,
            stats: GrowthStats::default(),
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub(crate) fn gap_start(&self) -> usize {
        self.head_len
    }

    #[inline]
    pub(crate) fn gap_end(&self) -> usize {
        self.data.len() - self.tail_len
    }

    #[inline]
    pub(crate) fn gap_len(&self) -> usize {
        self.gap_end() - self.gap_start()
    }

    /// Number of live units on both sides of the gap.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.head_len + self.tail_len
    }

    pub(crate) fn stats(&self) -> GrowthStats {
        self.stats
    }

    /// Makes sure at least `needed` units are free in the gap.
    pub(crate) fn ensure_space(&mut self, needed: usize) -> Result<(), TreeError> {
        let avail = self.gap_len();
        if needed <= avail {
            return Ok(());
        }
        let old_size = self.capacity();
        let needed_size = old_size - avail + needed;
        let new_size = old_size.saturating_mul(2).max(needed_size);
        let new_size = if new_size > MAX_CAPACITY {
            if needed_size > MAX_CAPACITY {
                return Err(TreeError::CapacityOverflow {
                    requested: needed_size,
                });
            }
            MAX_CAPACITY
        } else {
            new_size
        };

        let mut tmp = Vec::new();
        tmp.try_reserve_exact(new_size)?;
        tmp.extend_from_slice(&self.data[..self.head_len]);
        tmp.resize(new_size - self.tail_len, 0);
        tmp.extend_from_slice(&self.data[self.gap_end()..]);
        self.data = tmp;

        self.stats.reallocations += 1;
        self.stats.units_copied += self.len();
        tracing::trace!(
            old_capacity = old_size,
            new_capacity = new_size,
            copied = self.len(),
            "grew gap buffer"
        );
        Ok(())
    }

    /// Moves the gap so that it starts at the logical index `logical`.
    ///
    /// The caller checks `logical <= self.len()`.
    pub(crate) fn move_gap(&mut self, logical: usize) {
        let gap_start = self.gap_start();
        let gap_end = self.gap_end();
        if logical < gap_start {
            let moved = gap_start - logical;
            self.data.copy_within(logical..gap_start, gap_end - moved);
            self.head_len -= moved;
            self.tail_len += moved;
        } else if logical > gap_start {
            let moved = logical - gap_start;
            self.data.copy_within(gap_end..gap_end + moved, gap_start);
            self.head_len += moved;
            self.tail_len -= moved;
        } else {
            return;
        }
        tracing::trace!(from = gap_start, to = logical, "moved gap");
    }

    /// Resets the buffer to empty, dropping oversized storage.
    pub(crate) fn clear(&mut self, initial_capacity: usize, shrink_threshold: usize) {
        self.head_len = 0;
        self.tail_len = 0;
        if self.capacity() > shrink_threshold {
            tracing::debug!(
                capacity = self.capacity(),
                initial_capacity,
                "releasing gap buffer storage"
            );
            self.data = alloc::vec![0; initial_capacity.min(MAX_CAPACITY)];
        }
    }

    // ─── Unit access ───────────────────────────────────────────────────────

    #[inline]
    pub(crate) fn get(&self, index: usize) -> Option<u16> {
        self.data.get(index).copied()
    }

    /// Reads a big-endian 32-bit value spread over two units.
    #[allow(clippy::cast_possible_wrap)]
    pub(crate) fn get_int(&self, index: usize) -> Option<i32> {
        let hi = u32::from(self.get(index)?);
        let lo = u32::from(self.get(index + 1)?);
        Some(((hi << 16) | lo) as i32)
    }

    /// Reads a big-endian 64-bit value spread over four units.
    #[allow(clippy::cast_possible_wrap)]
    pub(crate) fn get_long(&self, index: usize) -> Option<i64> {
        let mut bits = 0u64;
        for i in index..index + 4 {
            bits = (bits << 16) | u64::from(self.get(i)?);
        }
        Some(bits as i64)
    }

    #[inline]
    pub(crate) fn set(&mut self, index: usize, unit: u16) {
        self.data[index] = unit;
    }

    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub(crate) fn set_int(&mut self, index: usize, value: i32) {
        let bits = value as u32;
        self.data[index] = (bits >> 16) as u16;
        self.data[index + 1] = bits as u16;
    }

    /// Appends one unit at the gap. Space must have been ensured.
    #[inline]
    pub(crate) fn push(&mut self, unit: u16) {
        let at = self.head_len;
        self.data[at] = unit;
        self.head_len += 1;
    }

    pub(crate) fn push_int(&mut self, value: i32) {
        let at = self.head_len;
        self.set_int(at, value);
        self.head_len += 2;
    }

    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub(crate) fn push_long(&mut self, value: i64) {
        let bits = value as u64;
        for shift in [48, 32, 16, 0] {
            self.push((bits >> shift) as u16);
        }
    }

    /// Claims `width` units from the end of the gap and returns the index of
    /// the first claimed unit. Space must have been ensured.
    pub(crate) fn reserve_tail(&mut self, width: usize) -> usize {
        self.tail_len += width;
        self.gap_end()
    }

    /// Gives `width` units at the front of the tail back to the gap.
    pub(crate) fn release_tail(&mut self, width: usize) {
        self.tail_len -= width;
    }

    // ─── Addressing ────────────────────────────────────────────────────────

    /// Maps an index sitting exactly at the gap to the first tail unit.
    #[inline]
    pub(crate) fn skip_gap(&self, index: usize) -> usize {
        if index == self.gap_start() {
            self.gap_end()
        } else {
            index
        }
    }

    /// Converts an index that ignores the gap into a storage index.
    #[inline]
    pub(crate) fn logical_to_physical(&self, logical: usize) -> usize {
        if logical >= self.gap_start() {
            logical + self.gap_len()
        } else {
            logical
        }
    }

    /// Converts a storage index into an index that ignores the gap.
    #[inline]
    pub(crate) fn physical_to_logical(&self, physical: usize) -> usize {
        if physical >= self.gap_end() {
            physical - self.gap_len()
        } else {
            physical.min(self.gap_start())
        }
    }

    /// Resolves an end offset as stored in a span's begin record.
    ///
    /// Negative offsets belong to open spans and count back from the end of
    /// the allocation; non-negative offsets are relative to `begin`.
    pub(crate) fn resolve_offset(&self, begin: usize, offset: i32) -> Option<usize> {
        let target = if offset < 0 {
            self.capacity().checked_sub(offset.unsigned_abs() as usize)?
        } else {
            begin.checked_add(offset.unsigned_abs() as usize)?
        };
        (target < self.capacity()).then_some(target)
    }

    /// The live units, head then tail.
    pub(crate) fn segments(&self) -> (&[u16], &[u16]) {
        (&self.data[..self.head_len], &self.data[self.gap_end()..])
    }
}
