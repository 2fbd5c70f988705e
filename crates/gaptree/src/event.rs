use alloc::{
    string::{String, ToString},
    sync::Arc,
    vec::Vec,
};
use core::convert::Infallible;

use crate::{
    consumer::Consumer,
    object_table::ObjectRef,
    position::{Position, SeqPosition},
    tree::TreeBuffer,
};

/// One call of the [`Consumer`] protocol, recorded.
#[cfg_attr(any(test, feature = "serde"), derive(serde::Serialize))]
#[cfg_attr(any(test, feature = "serde"), serde(tag = "kind"))]
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    BeginDocument,
    EndDocument,
    BeginGroup { name: String, ty: Option<ObjectRef> },
    EndGroup { name: String },
    BeginAttribute { name: String, ty: Option<ObjectRef> },
    EndAttribute,
    Bool { value: bool },
    Byte { value: u8 },
    Text { value: String },
    Int { value: i32 },
    Long { value: i64 },
    Float { value: f32 },
    Double { value: f64 },
    Object { value: ObjectRef },
    /// A live reference delivered through [`Consumer::write_position`].
    Position { value: SeqPosition },
    /// A stored position delivered through [`Consumer::consume_position`].
    PositionRef { value: SeqPosition },
}

impl Event {
    /// Replays this event into `sink`.
    pub fn feed<C: Consumer + ?Sized>(&self, sink: &mut C) -> Result<(), C::Error> {
        match self {
            Self::BeginDocument => sink.begin_document(),
            Self::EndDocument => sink.end_document(),
            Self::BeginGroup { name, ty } => sink.begin_group(name, ty.as_ref()),
            Self::EndGroup { name } => sink.end_group(name),
            Self::BeginAttribute { name, ty } => sink.begin_attribute(name, ty.as_ref()),
            Self::EndAttribute => sink.end_attribute(),
            Self::Bool { value } => sink.write_bool(*value),
            Self::Byte { value } => sink.write_byte(*value),
            Self::Text { value } => sink.write_str(value),
            Self::Int { value } => sink.write_int(*value),
            Self::Long { value } => sink.write_long(*value),
            Self::Float { value } => sink.write_float(*value),
            Self::Double { value } => sink.write_double(*value),
            Self::Object { value } => sink.write_object(value),
            Self::Position { value } => sink.write_position(&value.sequence, value.pos),
            Self::PositionRef { value } => sink.consume_position(value),
        }
    }
}

/// Feeds every event of `events` into `sink`, in order.
pub fn feed_events<'a, C, I>(events: I, sink: &mut C) -> Result<(), C::Error>
where
    C: Consumer + ?Sized,
    I: IntoIterator<Item = &'a Event>,
{
    events.into_iter().try_for_each(|event| event.feed(sink))
}

/// A sink that records every call as an [`Event`].
///
/// Adjacent text is joined into a single [`Event::Text`], so the log of a
/// replay does not depend on how the text was split when it was written.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// An empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded events, adjacent text joined.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Consumes the log, returning the events.
    #[must_use]
    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    fn push(&mut self, event: Event) -> Result<(), Infallible> {
        self.events.push(event);
        Ok(())
    }

    fn push_text(&mut self, text: &str) -> Result<(), Infallible> {
        if text.is_empty() {
            return Ok(());
        }
        if let Some(Event::Text { value }) = self.events.last_mut() {
            value.push_str(text);
        } else {
            self.events.push(Event::Text {
                value: text.to_string(),
            });
        }
        Ok(())
    }
}

impl Consumer for EventLog {
    type Error = Infallible;

    fn begin_document(&mut self) -> Result<(), Infallible> {
        self.push(Event::BeginDocument)
    }

    fn end_document(&mut self) -> Result<(), Infallible> {
        self.push(Event::EndDocument)
    }

    fn begin_group(&mut self, name: &str, ty: Option<&ObjectRef>) -> Result<(), Infallible> {
        self.push(Event::BeginGroup {
            name: name.to_string(),
            ty: ty.cloned(),
        })
    }

    fn end_group(&mut self, name: &str) -> Result<(), Infallible> {
        self.push(Event::EndGroup {
            name: name.to_string(),
        })
    }

    fn begin_attribute(&mut self, name: &str, ty: Option<&ObjectRef>) -> Result<(), Infallible> {
        self.push(Event::BeginAttribute {
            name: name.to_string(),
            ty: ty.cloned(),
        })
    }

    fn end_attribute(&mut self) -> Result<(), Infallible> {
        self.push(Event::EndAttribute)
    }

    fn write_bool(&mut self, value: bool) -> Result<(), Infallible> {
        self.push(Event::Bool { value })
    }

    fn write_byte(&mut self, value: u8) -> Result<(), Infallible> {
        self.push(Event::Byte { value })
    }

    fn write_char(&mut self, value: char) -> Result<(), Infallible> {
        self.push_text(value.encode_utf8(&mut [0; 4]))
    }

    fn write_int(&mut self, value: i32) -> Result<(), Infallible> {
        self.push(Event::Int { value })
    }

    fn write_long(&mut self, value: i64) -> Result<(), Infallible> {
        self.push(Event::Long { value })
    }

    fn write_float(&mut self, value: f32) -> Result<(), Infallible> {
        self.push(Event::Float { value })
    }

    fn write_double(&mut self, value: f64) -> Result<(), Infallible> {
        self.push(Event::Double { value })
    }

    fn write_str(&mut self, text: &str) -> Result<(), Infallible> {
        self.push_text(text)
    }

    fn write_object(&mut self, value: &ObjectRef) -> Result<(), Infallible> {
        self.push(Event::Object {
            value: value.clone(),
        })
    }

    fn write_position(&mut self, sequence: &Arc<TreeBuffer>, pos: Position) -> Result<(), Infallible> {
        self.push(Event::Position {
            value: SeqPosition::new(sequence.clone(), pos),
        })
    }

    fn consume_position(&mut self, position: &SeqPosition) -> Result<(), Infallible> {
        self.push(Event::PositionRef {
            value: position.clone(),
        })
    }
}
