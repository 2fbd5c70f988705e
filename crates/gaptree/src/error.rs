use alloc::{collections::TryReserveError, string::String};
use core::fmt;

use thiserror::Error;

/// Every failure a [`TreeBuffer`](crate::TreeBuffer) can report.
///
/// [`Protocol`](Self::Protocol) and [`Corrupt`](Self::Corrupt) are
/// internal-invariant failures: the first means the producer drove the
/// encoder incorrectly, the second means the encoded data is malformed. Use
/// [`TreeError::is_invariant_failure`] to tell them apart from the
/// recoverable errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("unrecognized encoding: {0}")]
    Corrupt(#[from] CorruptError),
    #[error("position {index} out of range (length {len})")]
    OutOfRange { index: usize, len: usize },
    #[error("capacity exhausted: {0}")]
    Capacity(#[from] TryReserveError),
    #[error("capacity of {requested} units exceeds the addressable range")]
    CapacityOverflow { requested: usize },
}

impl TreeError {
    /// Returns `true` for protocol violations and corrupt encodings, the two
    /// classes that indicate a bug rather than a bad argument or a resource
    /// limit.
    ///
    /// ```
    /// use gaptree::{Consumer, TreeBuffer};
    ///
    /// let mut tree = TreeBuffer::new();
    /// let err = tree.end_group("x").unwrap_err();
    /// assert!(err.is_invariant_failure());
    /// ```
    #[must_use]
    pub fn is_invariant_failure(&self) -> bool {
        matches!(self, Self::Protocol(_) | Self::Corrupt(_))
    }
}

/// The kind of span an encoder call opens or closes.
#[cfg_attr(any(test, feature = "serde"), derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Group,
    Attribute,
    Document,
}

impl fmt::Display for SpanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Group => "group",
            Self::Attribute => "attribute",
            Self::Document => "document",
        })
    }
}

/// A producer drove the encoder through an illegal transition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("attribute opened while another attribute is open")]
    NestedAttribute,
    #[error("document opened while another document is open")]
    NestedDocument,
    #[error("{0} opened inside an attribute")]
    BeginInsideAttribute(SpanKind),
    #[error("end of {expected} requested but {} is open", display_found(.found))]
    UnexpectedEnd {
        expected: SpanKind,
        found: Option<SpanKind>,
    },
    #[error("end of group `{found}` requested but `{expected}` is open")]
    MismatchedGroupName { expected: String, found: String },
    #[error("insertion point must not move while a span is open")]
    InsertionWhileOpen,
    #[error("insertion point {index} is not a top-level record boundary")]
    InsertionInsideSpan { index: usize },
}

fn display_found(found: &Option<SpanKind>) -> &'static str {
    match found {
        Some(SpanKind::Group) => "a group",
        Some(SpanKind::Attribute) => "an attribute",
        Some(SpanKind::Document) => "a document",
        None => "nothing",
    }
}

/// The decoder found something that no encoder call produces.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CorruptError {
    #[error("unknown code {code:#06x} at index {index}")]
    UnknownTag { code: u16, index: usize },
    #[error("object slot {index} does not hold a {expected}")]
    SlotKind { index: usize, expected: &'static str },
    #[error("record at index {index} runs past the end of the buffer")]
    Truncated { index: usize },
}

/// Failure while replaying a buffer into a [`Consumer`](crate::Consumer).
///
/// Errors raised by the sink itself are kept apart from decoding errors so
/// that a sink with its own error type (a `fmt::Write` target, for example)
/// does not have to know about [`TreeError`].
#[derive(Error, Debug, PartialEq)]
pub enum ReplayError<E> {
    #[error("sink error: {0}")]
    Sink(E),
    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl From<ReplayError<TreeError>> for TreeError {
    fn from(err: ReplayError<TreeError>) -> Self {
        match err {
            ReplayError::Sink(e) | ReplayError::Tree(e) => e,
        }
    }
}

impl From<ReplayError<core::convert::Infallible>> for TreeError {
    fn from(err: ReplayError<core::convert::Infallible>) -> Self {
        match err {
            ReplayError::Tree(e) => e,
            ReplayError::Sink(never) => match never {},
        }
    }
}
