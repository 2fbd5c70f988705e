//! A compact, gap-buffered encoding of nested tree data.
//!
//! A [`TreeBuffer`] stores elements ("groups"), attributes, documents,
//! scalars and references to arbitrary objects as tagged 16-bit records in a
//! single growable buffer with an edit gap. Producers push content through
//! the [`Consumer`] trait; readers address content with [`Position`]s, walk
//! it with the navigation methods, or replay any range into another
//! [`Consumer`].
//!
//! ```
//! use gaptree::{Consumer, Position, TreeBuffer};
//!
//! let mut tree = TreeBuffer::new();
//! tree.begin_document()?;
//! tree.begin_group("a", None)?;
//! tree.begin_group("b", None)?;
//! tree.write_int(5)?;
//! tree.end_group("b")?;
//! tree.write_str("hello")?;
//! tree.end_group("a")?;
//! tree.end_document()?;
//!
//! assert_eq!(tree.to_string(), "<a><b>5</b>hello</a>");
//! assert_eq!(tree.string_value(Position::START)?, "5hello");
//! # Ok::<(), gaptree::TreeError>(())
//! ```

#![no_std]
#![allow(missing_docs)]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod codec;
mod consumer;
mod dump;
mod encoder;
mod error;
mod event;
mod gap;
mod navigator;
mod object_table;
mod options;
mod position;
mod replay;
mod stats;
mod text;
mod tree;
mod value;

#[cfg(test)]
mod tests;

pub use consumer::{Consumer, Discard};
pub use error::{CorruptError, ProtocolError, ReplayError, SpanKind, TreeError};
pub use event::{Event, EventLog, feed_events};
pub use gap::GrowthStats;
pub use navigator::{NamedAttribute, NamedGroup, NodeKind, NodePredicate, PredicateKind};
pub use object_table::{ObjectRef, TreeObject};
pub use options::TreeOptions;
pub use position::{Position, SeqPosition};
pub use stats::NodeStats;
pub use text::TextRenderer;
pub use tree::TreeBuffer;
pub use value::Value;
