use alloc::sync::Arc;
use core::convert::Infallible;

use crate::{
    object_table::ObjectRef,
    position::{Position, SeqPosition},
    tree::TreeBuffer,
};

/// The push protocol shared by producers and sinks of tree data.
///
/// A [`TreeBuffer`] implements it to record content, and
/// [`TreeBuffer::replay`] drives any implementation with previously
/// recorded content. Calls nest strictly: every `begin_*` is matched by the
/// corresponding `end_*`, and attributes hold only scalar content.
///
/// Strings may arrive split over several [`write_str`](Self::write_str) and
/// [`write_char`](Self::write_char) calls; sinks that care about text
/// boundaries must join adjacent text themselves.
pub trait Consumer {
    type Error;

    fn begin_document(&mut self) -> Result<(), Self::Error>;
    fn end_document(&mut self) -> Result<(), Self::Error>;

    fn begin_group(&mut self, name: &str, ty: Option<&ObjectRef>) -> Result<(), Self::Error>;
    fn end_group(&mut self, name: &str) -> Result<(), Self::Error>;

    fn begin_attribute(&mut self, name: &str, ty: Option<&ObjectRef>) -> Result<(), Self::Error>;
    fn end_attribute(&mut self) -> Result<(), Self::Error>;

    fn write_bool(&mut self, value: bool) -> Result<(), Self::Error>;
    fn write_byte(&mut self, value: u8) -> Result<(), Self::Error>;
    fn write_char(&mut self, value: char) -> Result<(), Self::Error>;
    fn write_int(&mut self, value: i32) -> Result<(), Self::Error>;
    fn write_long(&mut self, value: i64) -> Result<(), Self::Error>;
    fn write_float(&mut self, value: f32) -> Result<(), Self::Error>;
    fn write_double(&mut self, value: f64) -> Result<(), Self::Error>;
    fn write_str(&mut self, text: &str) -> Result<(), Self::Error>;
    fn write_object(&mut self, object: &ObjectRef) -> Result<(), Self::Error>;

    /// Receives a live reference to `pos` inside `sequence`.
    ///
    /// Sinks that cannot hold references get the position as an opaque
    /// object.
    fn write_position(&mut self, sequence: &Arc<TreeBuffer>, pos: Position) -> Result<(), Self::Error> {
        self.write_object(&ObjectRef::new(SeqPosition::new(sequence.clone(), pos)))
    }

    /// Receives a stored position.
    fn consume_position(&mut self, position: &SeqPosition) -> Result<(), Self::Error> {
        self.write_object(&ObjectRef::new(position.clone()))
    }

    /// Whether this sink throws its input away, letting producers skip work.
    fn ignoring(&self) -> bool {
        false
    }
}

/// A sink that accepts and drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl Consumer for Discard {
    type Error = Infallible;

    fn begin_document(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
    fn end_document(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
    fn begin_group(&mut self, _: &str, _: Option<&ObjectRef>) -> Result<(), Infallible> {
        Ok(())
    }
    fn end_group(&mut self, _: &str) -> Result<(), Infallible> {
        Ok(())
    }
    fn begin_attribute(&mut self, _: &str, _: Option<&ObjectRef>) -> Result<(), Infallible> {
        Ok(())
    }
    fn end_attribute(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
    fn write_bool(&mut self, _: bool) -> Result<(), Infallible> {
        Ok(())
    }
    fn write_byte(&mut self, _: u8) -> Result<(), Infallible> {
        Ok(())
    }
    fn write_char(&mut self, _: char) -> Result<(), Infallible> {
        Ok(())
    }
    fn write_int(&mut self, _: i32) -> Result<(), Infallible> {
        Ok(())
    }
    fn write_long(&mut self, _: i64) -> Result<(), Infallible> {
        Ok(())
    }
    fn write_float(&mut self, _: f32) -> Result<(), Infallible> {
        Ok(())
    }
    fn write_double(&mut self, _: f64) -> Result<(), Infallible> {
        Ok(())
    }
    fn write_str(&mut self, _: &str) -> Result<(), Infallible> {
        Ok(())
    }
    fn write_object(&mut self, _: &ObjectRef) -> Result<(), Infallible> {
        Ok(())
    }
    fn ignoring(&self) -> bool {
        true
    }
}
