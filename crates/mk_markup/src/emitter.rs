use core::fmt::{self, Display, Write};

use crate::sink::write_escaped;
use crate::{
    ClosingTag, MarkupStyle, MissingPolicy, SerializeError, SerializeErrorKind, Sink, SinkError,
};

const SPACES: &str = "                                                                ";

// -----------------------------------------------------------------------------
// Emitter

/// Line writer shared by every renderer of one serialization call.
///
/// Tracks the nesting depth for indentation and applies the [`MarkupStyle`].
/// Renderers only talk to the sink through this type.
pub struct Emitter<'a> {
    sink: &'a mut dyn Sink,
    style: &'a MarkupStyle,
    depth: usize,
}

impl<'a> Emitter<'a> {
    /// Creates an emitter at depth zero.
    #[inline]
    pub fn new(sink: &'a mut dyn Sink, style: &'a MarkupStyle) -> Self {
        Self {
            sink,
            style,
            depth: 0,
        }
    }

    /// Returns the style of this call.
    #[inline]
    pub fn style(&self) -> &MarkupStyle {
        self.style
    }

    /// Returns the number of blocks currently open.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    fn indent(&mut self) -> Result<(), SinkError> {
        let mut width = self.depth.saturating_mul(self.style.effective_indent());
        while width > 0 {
            let chunk = width.min(SPACES.len());
            self.sink.write_str(&SPACES[..chunk])?;
            width -= chunk;
        }
        Ok(())
    }

    #[inline]
    fn end_line(&mut self) -> Result<(), SinkError> {
        self.sink.write_str(self.style.line_ending.as_str())
    }

    /// Writes the `<tag>` line and enters the block.
    pub fn open(&mut self, tag: &str) -> Result<(), SinkError> {
        self.indent()?;
        self.sink.write_str("<")?;
        self.sink.write_str(tag)?;
        self.sink.write_str(">")?;
        self.end_line()?;
        self.depth += 1;
        Ok(())
    }

    /// Leaves the block and writes its closing line.
    pub fn close(&mut self, tag: &str) -> Result<(), SinkError> {
        self.depth = self.depth.saturating_sub(1);
        self.indent()?;
        self.sink.write_str(match self.style.closing {
            ClosingTag::Slashed => "</",
            ClosingTag::Legacy => "<",
        })?;
        self.sink.write_str(tag)?;
        self.sink.write_str(">")?;
        self.end_line()
    }

    /// Writes a `<tag>value</tag>` line using the value's [`Display`] form.
    ///
    /// A failing `Display` impl is reported as [`SerializeErrorKind::Format`],
    /// a failing sink as [`SerializeErrorKind::Sink`].
    pub fn leaf(&mut self, tag: &str, value: &dyn Display) -> Result<(), SerializeError> {
        self.write_leaf(tag, value).map_err(|e| e.within(tag))
    }

    fn write_leaf(&mut self, tag: &str, value: &dyn Display) -> Result<(), SerializeError> {
        self.indent()?;
        self.sink.write_str("<")?;
        self.sink.write_str(tag)?;
        self.sink.write_str(">")?;

        let mut writer = TextWriter {
            sink: &mut *self.sink,
            escape: self.style.escape_text,
            error: None,
        };
        if write!(writer, "{value}").is_err() {
            return Err(match writer.error {
                Some(sink_error) => SerializeError::from(sink_error),
                None => SerializeError::new(SerializeErrorKind::Format),
            });
        }

        self.sink.write_str("</")?;
        self.sink.write_str(tag)?;
        self.sink.write_str(">")?;
        self.end_line()?;
        Ok(())
    }

    /// Writes a self-closing `<tag/>` line.
    pub fn empty(&mut self, tag: &str) -> Result<(), SinkError> {
        self.indent()?;
        self.sink.write_str("<")?;
        self.sink.write_str(tag)?;
        self.sink.write_str("/>")?;
        self.end_line()
    }

    /// Applies the [`MissingPolicy`] to an absent field named `tag`.
    pub fn missing(&mut self, tag: &str) -> Result<(), SerializeError> {
        match self.style.missing {
            MissingPolicy::Fail => Err(SerializeError::missing().within(tag)),
            MissingPolicy::Skip => {
                log::debug!("skipping absent field <{tag}>");
                Ok(())
            }
            MissingPolicy::Empty => self
                .empty(tag)
                .map_err(|e| SerializeError::from(e).within(tag)),
        }
    }
}

// -----------------------------------------------------------------------------
// TextWriter

/// Bridges `Display` output into a [`Sink`], keeping the sink's own error.
struct TextWriter<'s> {
    sink: &'s mut dyn Sink,
    escape: bool,
    error: Option<SinkError>,
}

impl Write for TextWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let result = if self.escape {
            write_escaped(self.sink, s)
        } else {
            self.sink.write_str(s)
        };
        result.map_err(|e| {
            self.error = Some(e);
            fmt::Error
        })
    }
}
