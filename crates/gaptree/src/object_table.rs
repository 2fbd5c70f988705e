//! Interning table for everything that cannot be stored inline.
//!
//! Group and attribute keys occupy two consecutive slots (name, then node
//! type); referenced objects, sequences and stored positions take one slot
//! each. Lookup is a linear scan that reuses the first free slot it passes.

use alloc::{sync::Arc, vec::Vec};
use core::{any::Any, fmt};

use crate::{
    error::{CorruptError, TreeError},
    position::SeqPosition,
    tree::TreeBuffer,
};

/// An arbitrary value that can be referenced from a [`TreeBuffer`].
///
/// Implemented for every `'static` type that is `Debug + Display + Send +
/// Sync`.
pub trait TreeObject: Any + fmt::Debug + fmt::Display + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + fmt::Debug + fmt::Display + Send + Sync> TreeObject for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A shared handle to a [`TreeObject`].
///
/// Equality is identity: two handles are equal when they point at the same
/// allocation, which is also what the object table interns on.
///
/// ```
/// use gaptree::ObjectRef;
///
/// let a = ObjectRef::new("item");
/// let b = a.clone();
/// assert_eq!(a, b);
/// assert_ne!(a, ObjectRef::new("item"));
/// assert_eq!(a.downcast_ref::<&str>(), Some(&"item"));
/// ```
#[derive(Clone)]
pub struct ObjectRef(Arc<dyn TreeObject>);

impl ObjectRef {
    /// Wraps `value` in a fresh allocation. Every call yields a distinct
    /// identity.
    pub fn new<T: TreeObject>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Wraps a shared object, keeping its identity.
    #[must_use]
    pub fn from_arc(value: Arc<dyn TreeObject>) -> Self {
        Self(value)
    }

    /// The wrapped object, if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.0).as_any().downcast_ref()
    }

    /// Whether both handles point at the same allocation.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        core::ptr::addr_eq(Arc::as_ptr(&a.0), Arc::as_ptr(&b.0))
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

#[cfg(any(test, feature = "serde"))]
impl serde::Serialize for ObjectRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Clone, Debug)]
enum Slot {
    Avail,
    Name(Arc<str>),
    Type(Option<ObjectRef>),
    Object(ObjectRef),
    Sequence(Arc<TreeBuffer>),
    Position(SeqPosition),
}

impl Slot {
    fn is_avail(&self) -> bool {
        matches!(self, Self::Avail)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct ObjectTable {
    slots: Vec<Slot>,
    initial_slots: usize,
}

fn same_type(a: Option<&ObjectRef>, b: Option<&ObjectRef>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => ObjectRef::ptr_eq(a, b),
        _ => false,
    }
}

impl ObjectTable {
    pub(crate) fn new(initial_slots: usize) -> Self {
        let initial_slots = initial_slots.max(2);
        Self {
            slots: alloc::vec![Slot::Avail; initial_slots],
            initial_slots,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.slots.resize(self.initial_slots, Slot::Avail);
    }

    /// Number of slots, free ones included.
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub(crate) fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.is_avail()).count()
    }

    fn grow(&mut self) -> Result<usize, TreeError> {
        let old_len = self.slots.len();
        let new_len = old_len * 2;
        self.slots.try_reserve_exact(new_len - old_len)?;
        self.slots.resize(new_len, Slot::Avail);
        tracing::trace!(old_len, new_len, "grew object table");
        Ok(old_len)
    }

    /// Interns a `(name, node type)` key and returns the index of its name
    /// slot. Names compare by value, node types by identity.
    pub(crate) fn intern_pair(
        &mut self,
        name: &str,
        ty: Option<&ObjectRef>,
    ) -> Result<usize, TreeError> {
        let mut avail = None;
        for i in 0..self.slots.len().saturating_sub(1) {
            match (&self.slots[i], &self.slots[i + 1]) {
                (Slot::Name(n), Slot::Type(t)) if &**n == name && same_type(t.as_ref(), ty) => {
                    return Ok(i);
                }
                (Slot::Avail, Slot::Avail) if avail.is_none() => avail = Some(i),
                _ => {}
            }
        }
        let index = match avail {
            Some(index) => index,
            None => self.grow()?,
        };
        self.slots[index] = Slot::Name(Arc::from(name));
        self.slots[index + 1] = Slot::Type(ty.cloned());
        Ok(index)
    }

    fn intern_single(
        &mut self,
        is_match: impl Fn(&Slot) -> bool,
        make: impl FnOnce() -> Slot,
    ) -> Result<usize, TreeError> {
        let mut avail = None;
        for (i, slot) in self.slots.iter().enumerate() {
            if is_match(slot) {
                return Ok(i);
            }
            if avail.is_none() && slot.is_avail() {
                avail = Some(i);
            }
        }
        let index = match avail {
            Some(index) => index,
            None => self.grow()?,
        };
        self.slots[index] = make();
        Ok(index)
    }

    pub(crate) fn intern_object(&mut self, object: &ObjectRef) -> Result<usize, TreeError> {
        self.intern_single(
            |slot| matches!(slot, Slot::Object(o) if ObjectRef::ptr_eq(o, object)),
            || Slot::Object(object.clone()),
        )
    }

    pub(crate) fn intern_sequence(&mut self, sequence: &Arc<TreeBuffer>) -> Result<usize, TreeError> {
        self.intern_single(
            |slot| matches!(slot, Slot::Sequence(s) if Arc::ptr_eq(s, sequence)),
            || Slot::Sequence(sequence.clone()),
        )
    }

    /// Stores a copy of `position` without looking for an equal one.
    pub(crate) fn insert_position(&mut self, position: &SeqPosition) -> Result<usize, TreeError> {
        self.intern_single(|_| false, || Slot::Position(position.clone()))
    }

    // ─── Typed lookups ─────────────────────────────────────────────────────

    pub(crate) fn name(&self, index: usize) -> Result<&Arc<str>, CorruptError> {
        match self.slots.get(index) {
            Some(Slot::Name(name)) => Ok(name),
            _ => Err(CorruptError::SlotKind {
                index,
                expected: "name",
            }),
        }
    }

    pub(crate) fn node_type(&self, index: usize) -> Result<Option<&ObjectRef>, CorruptError> {
        match self.slots.get(index) {
            Some(Slot::Type(ty)) => Ok(ty.as_ref()),
            _ => Err(CorruptError::SlotKind {
                index,
                expected: "node type",
            }),
        }
    }

    pub(crate) fn object(&self, index: usize) -> Result<&ObjectRef, CorruptError> {
        match self.slots.get(index) {
            Some(Slot::Object(object)) => Ok(object),
            _ => Err(CorruptError::SlotKind {
                index,
                expected: "object",
            }),
        }
    }

    pub(crate) fn sequence(&self, index: usize) -> Result<&Arc<TreeBuffer>, CorruptError> {
        match self.slots.get(index) {
            Some(Slot::Sequence(sequence)) => Ok(sequence),
            _ => Err(CorruptError::SlotKind {
                index,
                expected: "sequence",
            }),
        }
    }

    pub(crate) fn position(&self, index: usize) -> Result<&SeqPosition, CorruptError> {
        match self.slots.get(index) {
            Some(Slot::Position(position)) => Ok(position),
            _ => Err(CorruptError::SlotKind {
                index,
                expected: "position",
            }),
        }
    }
}
