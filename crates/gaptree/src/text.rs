use alloc::{string::String, sync::Arc};
use core::fmt::{self, Display, Write};

use crate::{
    consumer::Consumer,
    error::ReplayError,
    object_table::ObjectRef,
    position::{Position, SeqPosition},
    tree::TreeBuffer,
};

/// A sink that renders tree content as markup-like text.
///
/// Groups become `<name>…</name>` (or `<name/>` when empty), attributes
/// become `name="…"` inside the start tag, and text is copied verbatim.
/// Adjacent atoms (numbers, booleans, objects) are separated by `sep`;
/// text resets the separator so that `"a"` followed by `1` renders as `a1`.
/// Document boundaries are invisible. Nothing is escaped.
///
/// ```
/// use gaptree::{Consumer, TextRenderer, TreeBuffer};
///
/// let mut tree = TreeBuffer::new();
/// tree.write_int(1)?;
/// tree.write_int(2)?;
/// tree.begin_group("e", None)?;
/// tree.end_group("e")?;
///
/// let mut out = String::new();
/// tree.consume(&mut TextRenderer::new(&mut out, ", ")).unwrap();
/// assert_eq!(out, "1, 2, <e/>");
/// # Ok::<(), gaptree::TreeError>(())
/// ```
#[derive(Debug)]
pub struct TextRenderer<'s, W: Write> {
    out: W,
    sep: &'s str,
    seen: bool,
    in_start_tag: bool,
}

impl<'s, W: Write> TextRenderer<'s, W> {
    /// Renders into `out`, writing `sep` between adjacent atoms.
    pub fn new(out: W, sep: &'s str) -> Self {
        Self {
            out,
            sep,
            seen: false,
            in_start_tag: false,
        }
    }

    /// Returns the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn close_start_tag(&mut self) -> fmt::Result {
        if self.in_start_tag {
            self.in_start_tag = false;
            self.out.write_char('>')?;
        }
        Ok(())
    }

    fn atom(&mut self, value: impl Display) -> fmt::Result {
        self.close_start_tag()?;
        if self.seen {
            self.out.write_str(self.sep)?;
        } else {
            self.seen = true;
        }
        write!(self.out, "{value}")
    }

    fn text(&mut self, text: &str) -> fmt::Result {
        self.close_start_tag()?;
        self.seen = false;
        self.out.write_str(text)
    }
}

impl<W: Write> Consumer for TextRenderer<'_, W> {
    type Error = fmt::Error;

    fn begin_document(&mut self) -> fmt::Result {
        Ok(())
    }

    fn end_document(&mut self) -> fmt::Result {
        Ok(())
    }

    fn begin_group(&mut self, name: &str, _: Option<&ObjectRef>) -> fmt::Result {
        if self.in_start_tag {
            self.out.write_char('>')?;
        } else if self.seen {
            self.out.write_str(self.sep)?;
        }
        write!(self.out, "<{name}")?;
        self.seen = false;
        self.in_start_tag = true;
        Ok(())
    }

    fn end_group(&mut self, name: &str) -> fmt::Result {
        if self.in_start_tag {
            self.out.write_str("/>")?;
        } else {
            write!(self.out, "</{name}>")?;
        }
        self.in_start_tag = false;
        self.seen = true;
        Ok(())
    }

    fn begin_attribute(&mut self, name: &str, _: Option<&ObjectRef>) -> fmt::Result {
        write!(self.out, " {name}=\"")?;
        self.in_start_tag = false;
        Ok(())
    }

    fn end_attribute(&mut self) -> fmt::Result {
        self.out.write_char('"')?;
        self.in_start_tag = true;
        self.seen = false;
        Ok(())
    }

    fn write_bool(&mut self, value: bool) -> fmt::Result {
        self.atom(value)
    }

    fn write_byte(&mut self, value: u8) -> fmt::Result {
        self.atom(value)
    }

    fn write_char(&mut self, value: char) -> fmt::Result {
        self.text(value.encode_utf8(&mut [0; 4]))
    }

    fn write_int(&mut self, value: i32) -> fmt::Result {
        self.atom(value)
    }

    fn write_long(&mut self, value: i64) -> fmt::Result {
        self.atom(value)
    }

    fn write_float(&mut self, value: f32) -> fmt::Result {
        self.atom(value)
    }

    fn write_double(&mut self, value: f64) -> fmt::Result {
        self.atom(value)
    }

    fn write_str(&mut self, text: &str) -> fmt::Result {
        self.text(text)
    }

    fn write_object(&mut self, object: &ObjectRef) -> fmt::Result {
        self.atom(object)
    }

    /// Positions are shown inline without touching the separator state.
    fn write_position(&mut self, sequence: &Arc<TreeBuffer>, pos: Position) -> fmt::Result {
        self.close_start_tag()?;
        write!(self.out, "{}", SeqPosition::new(sequence.clone(), pos))
    }
}

impl TreeBuffer {
    /// Renders the content with [`TextRenderer`], separating adjacent atoms
    /// with `sep`.
    pub fn render(&self, sep: &str) -> Result<String, ReplayError<fmt::Error>> {
        let mut out = String::new();
        self.consume(&mut TextRenderer::new(&mut out, sep))?;
        Ok(out)
    }
}
