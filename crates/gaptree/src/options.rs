/// Configuration options for a [`TreeBuffer`](crate::TreeBuffer).
///
/// These options control the initial allocation, how aggressively storage is
/// released by [`clear`](crate::TreeBuffer::clear), and whether closed groups
/// are narrowed to their compact encoding.
///
/// # Examples
///
/// ```rust
/// use gaptree::{TreeBuffer, TreeOptions};
///
/// let tree = TreeBuffer::with_options(TreeOptions {
///     initial_capacity: 4096,
///     compact_groups: false,
///     ..Default::default()
/// });
/// assert!(tree.is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeOptions {
    /// Number of 16-bit units allocated up front.
    ///
    /// The whole allocation starts out as the edit gap. Growth doubles the
    /// capacity, so a good estimate avoids early reallocations.
    ///
    /// # Default
    ///
    /// `200`
    pub initial_capacity: usize,

    /// Capacity above which [`clear`](crate::TreeBuffer::clear) releases
    /// storage and falls back to `initial_capacity`.
    ///
    /// Buffers that stay below this size keep their allocation for reuse.
    ///
    /// # Default
    ///
    /// `1500`
    pub shrink_threshold: usize,

    /// Number of object table slots allocated up front.
    ///
    /// # Default
    ///
    /// `100`
    pub initial_object_slots: usize,

    /// Whether closed groups use the compact encoding when their type index
    /// and offsets fit in a single unit.
    ///
    /// The wide encoding is always correct; disabling this trades space for a
    /// uniform layout, which can be handy when inspecting dumps.
    ///
    /// # Default
    ///
    /// `true`
    pub compact_groups: bool,

    #[cfg(any(test, feature = "fuzzing"))]
    /// Panic on protocol violations instead of returning them.
    ///
    /// Enabled only in test and fuzzing builds to produce backtraces at the
    /// offending encoder call.
    pub panic_on_error: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            initial_capacity: 200,
            shrink_threshold: 1500,
            initial_object_slots: 100,
            compact_groups: true,
            #[cfg(any(test, feature = "fuzzing"))]
            panic_on_error: false,
        }
    }
}
