//! Output destinations for serialization.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::SinkError;

// -----------------------------------------------------------------------------
// Sink

/// A write-capable destination that markup is written to incrementally.
///
/// Implemented for [`String`], `Vec<u8>`, [`FmtSink`] and, with the `std`
/// feature, [`IoSink`].
pub trait Sink {
    /// Writes a string slice in full.
    fn write_str(&mut self, s: &str) -> Result<(), SinkError>;
}

impl<S: Sink + ?Sized> Sink for &mut S {
    #[inline]
    fn write_str(&mut self, s: &str) -> Result<(), SinkError> {
        (**self).write_str(s)
    }
}

impl Sink for String {
    #[inline]
    fn write_str(&mut self, s: &str) -> Result<(), SinkError> {
        self.push_str(s);
        Ok(())
    }
}

impl Sink for Vec<u8> {
    #[inline]
    fn write_str(&mut self, s: &str) -> Result<(), SinkError> {
        self.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// FmtSink

/// Adapts any [`fmt::Write`] into a [`Sink`].
///
/// # Examples
///
/// ```
/// use mk_markup::{FmtSink, Sink};
///
/// let mut sink = FmtSink::new(String::new());
/// sink.write_str("<Point>").unwrap();
/// assert_eq!(sink.into_inner(), "<Point>");
/// ```
#[derive(Debug, Default)]
pub struct FmtSink<W>(W);

impl<W: fmt::Write> FmtSink<W> {
    #[inline]
    pub const fn new(writer: W) -> Self {
        Self(writer)
    }

    #[inline]
    pub fn get_ref(&self) -> &W {
        &self.0
    }

    #[inline]
    pub fn into_inner(self) -> W {
        self.0
    }
}

impl<W: fmt::Write> Sink for FmtSink<W> {
    #[inline]
    fn write_str(&mut self, s: &str) -> Result<(), SinkError> {
        self.0.write_str(s).map_err(SinkError::Fmt)
    }
}

// -----------------------------------------------------------------------------
// IoSink

/// Adapts any [`std::io::Write`] into a [`Sink`].
///
/// Each write is forwarded with `write_all`; nothing is buffered here.
#[cfg(feature = "std")]
#[derive(Debug, Default)]
pub struct IoSink<W>(W);

#[cfg(feature = "std")]
impl<W: std::io::Write> IoSink<W> {
    #[inline]
    pub const fn new(writer: W) -> Self {
        Self(writer)
    }

    #[inline]
    pub fn get_ref(&self) -> &W {
        &self.0
    }

    #[inline]
    pub fn into_inner(self) -> W {
        self.0
    }
}

#[cfg(feature = "std")]
impl<W: std::io::Write> Sink for IoSink<W> {
    #[inline]
    fn write_str(&mut self, s: &str) -> Result<(), SinkError> {
        self.0.write_all(s.as_bytes()).map_err(SinkError::Io)
    }
}

// -----------------------------------------------------------------------------
// Text escaping

/// Writes `s` with the XML special characters replaced by entities.
pub(crate) fn write_escaped(sink: &mut dyn Sink, s: &str) -> Result<(), SinkError> {
    let mut start = 0;
    for (index, ch) in s.char_indices() {
        let entity = match ch {
            '&' => "&amp;",
            '<' => "&lt;",
            '>' => "&gt;",
            '"' => "&quot;",
            '\'' => "&apos;",
            _ => continue,
        };
        sink.write_str(&s[start..index])?;
        sink.write_str(entity)?;
        start = index + ch.len_utf8();
    }
    sink.write_str(&s[start..])
}
