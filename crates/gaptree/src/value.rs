//! Materialized values.
//!
//! This module defines the [`Value`] enum returned by
//! [`TreeBuffer::materialize`] and [`TreeBuffer::get`].
//!
use core::fmt;

use crate::{object_table::ObjectRef, position::SeqPosition, tree::TreeBuffer};

/// The record at a position, decoded into an owned value.
///
/// Scalars decode directly. Groups, attributes and documents are copied into
/// a new, independent [`TreeBuffer`]; later writes to the source do not show
/// through.
///
/// # Examples
///
/// ```
/// use gaptree::{Consumer, Position, TreeBuffer, Value};
///
/// let mut tree = TreeBuffer::new();
/// tree.write_int(7)?;
/// tree.begin_group("g", None)?;
/// tree.write_str("x")?;
/// tree.end_group("g")?;
///
/// assert_eq!(tree.get(0)?, Value::Int(7));
/// let group = tree.get(1)?;
/// assert_eq!(group.as_tree().map(ToString::to_string).as_deref(), Some("<g>x</g>"));
/// # Ok::<(), gaptree::TreeError>(())
/// ```
#[cfg_attr(any(test, feature = "serde"), derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Nothing follows: the end of a span or of the buffer.
    Eof,
    Bool(bool),
    Byte(u8),
    Char(char),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Object(ObjectRef),
    Tree(TreeBuffer),
    Position(SeqPosition),
}

impl Default for Value {
    fn default() -> Self {
        Self::Eof
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Self::Byte(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Self::Char(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Self::Object(v)
    }
}

impl From<TreeBuffer> for Value {
    fn from(v: TreeBuffer) -> Self {
        Self::Tree(v)
    }
}

impl From<SeqPosition> for Value {
    fn from(v: SeqPosition) -> Self {
        Self::Position(v)
    }
}

impl Value {
    /// Returns `true` if the value is [`Eof`].
    ///
    /// [`Eof`]: Value::Eof
    ///
    /// # Examples
    ///
    /// ```
    /// use gaptree::Value;
    ///
    /// assert!(Value::Eof.is_eof());
    /// assert!(!Value::Bool(false).is_eof());
    /// ```
    #[must_use]
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }

    /// Returns `true` for the numeric variants.
    ///
    /// # Examples
    ///
    /// ```
    /// use gaptree::Value;
    ///
    /// assert!(Value::Int(1).is_number());
    /// assert!(Value::Double(0.5).is_number());
    /// assert!(!Value::Char('1').is_number());
    /// ```
    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(
            self,
            Self::Byte(..) | Self::Int(..) | Self::Long(..) | Self::Float(..) | Self::Double(..)
        )
    }

    /// Returns `true` if the value is a copied [`Tree`].
    ///
    /// [`Tree`]: Value::Tree
    #[must_use]
    pub fn is_tree(&self) -> bool {
        matches!(self, Self::Tree(..))
    }

    /// The character, for [`Value::Char`].
    #[must_use]
    pub fn as_char(&self) -> Option<char> {
        match self {
            Self::Char(c) => Some(*c),
            _ => None,
        }
    }

    /// The value widened to `i64`, for the integral variants.
    ///
    /// # Examples
    ///
    /// ```
    /// use gaptree::Value;
    ///
    /// assert_eq!(Value::Byte(3).as_i64(), Some(3));
    /// assert_eq!(Value::Int(-4).as_i64(), Some(-4));
    /// assert_eq!(Value::Double(1.0).as_i64(), None);
    /// ```
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(i64::from(*v)),
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// The object, for [`Value::Object`].
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(v) => Some(v),
            _ => None,
        }
    }

    /// The materialized tree, for [`Value::Tree`].
    #[must_use]
    pub fn as_tree(&self) -> Option<&TreeBuffer> {
        match self {
            Self::Tree(v) => Some(v),
            _ => None,
        }
    }

    /// Consumes the value, returning the tree of a [`Value::Tree`].
    #[must_use]
    pub fn into_tree(self) -> Option<TreeBuffer> {
        match self {
            Self::Tree(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Eof => f.write_str("#!eof"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Byte(v) => write!(f, "{v}"),
            Value::Char(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Object(v) => write!(f, "{v}"),
            Value::Tree(v) => write!(f, "{v}"),
            Value::Position(v) => write!(f, "{v}"),
        }
    }
}
