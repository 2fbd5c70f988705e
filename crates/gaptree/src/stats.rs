use core::convert::Infallible;

use crate::{consumer::Consumer, error::TreeError, object_table::ObjectRef, tree::TreeBuffer};

/// A sink that counts what it is fed.
///
/// ```
/// use gaptree::{Consumer, NodeStats, TreeBuffer};
///
/// let mut tree = TreeBuffer::new();
/// tree.begin_group("a", None)?;
/// tree.begin_group("b", None)?;
/// tree.write_str("xy")?;
/// tree.end_group("b")?;
/// tree.end_group("a")?;
///
/// let stats = tree.stats()?;
/// assert_eq!(stats.groups, 2);
/// assert_eq!(stats.chars, 2);
/// assert_eq!(stats.max_depth, 2);
/// # Ok::<(), gaptree::TreeError>(())
/// ```
#[cfg_attr(any(test, feature = "serde"), derive(serde::Serialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NodeStats {
    /// Completed documents.
    pub documents: usize,
    /// Completed groups.
    pub groups: usize,
    /// Completed attributes.
    pub attributes: usize,
    /// Characters, counted one per `char`.
    pub chars: usize,
    /// Runs of adjacent characters, however they were written.
    pub text_runs: usize,
    /// Scalar counts by class.
    pub bools: usize,
    pub bytes: usize,
    pub ints: usize,
    pub longs: usize,
    pub floats: usize,
    pub doubles: usize,
    /// Objects, including positions delivered as objects.
    pub objects: usize,
    /// Deepest nesting of groups, attributes and documents seen.
    pub max_depth: usize,
    #[cfg_attr(any(test, feature = "serde"), serde(skip))]
    depth: usize,
}

impl NodeStats {
    /// All counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of scalar records of any kind.
    #[must_use]
    pub fn scalars(&self) -> usize {
        self.chars
            + self.bools
            + self.bytes
            + self.ints
            + self.longs
            + self.floats
            + self.doubles
            + self.objects
    }

    fn open(&mut self) -> Result<(), Infallible> {
        self.depth += 1;
        self.max_depth = self.max_depth.max(self.depth);
        Ok(())
    }

    fn close(&mut self) -> Result<(), Infallible> {
        self.depth = self.depth.saturating_sub(1);
        Ok(())
    }
}

impl Consumer for NodeStats {
    type Error = Infallible;

    fn begin_document(&mut self) -> Result<(), Infallible> {
        self.documents += 1;
        self.open()
    }

    fn end_document(&mut self) -> Result<(), Infallible> {
        self.close()
    }

    fn begin_group(&mut self, _: &str, _: Option<&ObjectRef>) -> Result<(), Infallible> {
        self.groups += 1;
        self.open()
    }

    fn end_group(&mut self, _: &str) -> Result<(), Infallible> {
        self.close()
    }

    fn begin_attribute(&mut self, _: &str, _: Option<&ObjectRef>) -> Result<(), Infallible> {
        self.attributes += 1;
        self.open()
    }

    fn end_attribute(&mut self) -> Result<(), Infallible> {
        self.close()
    }

    fn write_bool(&mut self, _: bool) -> Result<(), Infallible> {
        self.bools += 1;
        Ok(())
    }

    fn write_byte(&mut self, _: u8) -> Result<(), Infallible> {
        self.bytes += 1;
        Ok(())
    }

    fn write_char(&mut self, _: char) -> Result<(), Infallible> {
        self.chars += 1;
        self.text_runs += 1;
        Ok(())
    }

    fn write_int(&mut self, _: i32) -> Result<(), Infallible> {
        self.ints += 1;
        Ok(())
    }

    fn write_long(&mut self, _: i64) -> Result<(), Infallible> {
        self.longs += 1;
        Ok(())
    }

    fn write_float(&mut self, _: f32) -> Result<(), Infallible> {
        self.floats += 1;
        Ok(())
    }

    fn write_double(&mut self, _: f64) -> Result<(), Infallible> {
        self.doubles += 1;
        Ok(())
    }

    fn write_str(&mut self, text: &str) -> Result<(), Infallible> {
        if !text.is_empty() {
            self.chars += text.chars().count();
            self.text_runs += 1;
        }
        Ok(())
    }

    fn write_object(&mut self, _: &ObjectRef) -> Result<(), Infallible> {
        self.objects += 1;
        Ok(())
    }
}

impl TreeBuffer {
    /// Counts the records of the whole buffer.
    pub fn stats(&self) -> Result<NodeStats, TreeError> {
        let mut stats = NodeStats::new();
        self.consume(&mut stats)?;
        Ok(stats)
    }
}
