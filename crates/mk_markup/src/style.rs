//! Output options applied to a whole serialization call.

use serde::{Deserialize, Deserializer, Serialize};
use serde::de::Error as _;

/// The largest accepted [`MarkupStyle::indent`].
///
/// Larger values are rejected when deserializing and clamped everywhere else.
pub const MAX_INDENT: usize = 16;

fn deserialize_indent<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    let indent = usize::deserialize(deserializer)?;
    if indent > MAX_INDENT {
        return Err(D::Error::custom(format_args!(
            "indent {indent} exceeds the maximum of {MAX_INDENT}"
        )));
    }
    Ok(indent)
}

// -----------------------------------------------------------------------------
// ClosingTag

/// How the closing line of a block is written.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClosingTag {
    /// `</TAG>`, well-formed markup.
    #[default]
    Slashed,
    /// `<TAG>`, the opening tag repeated.
    ///
    /// Byte-compatible with consumers of the historical output, which never
    /// wrote the slash.
    Legacy,
}

// -----------------------------------------------------------------------------
// MissingPolicy

/// What to emit when an optional field has no value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MissingPolicy {
    /// Abort with [`SerializeErrorKind::MissingValue`](crate::SerializeErrorKind::MissingValue).
    #[default]
    Fail,
    /// Emit nothing for the field.
    Skip,
    /// Emit a self-closing `<TAG/>` line.
    Empty,
}

// -----------------------------------------------------------------------------
// LineEnding

/// The line terminator written after every line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

// -----------------------------------------------------------------------------
// MarkupStyle

/// Options for one [`Descriptor::serialize_with`](crate::Descriptor::serialize_with) call.
///
/// The style is passed down to every nested descriptor, so a whole document
/// is always written with one convention.
///
/// Fields missing from a deserialized style take their default value.
///
/// # Examples
///
/// ```
/// use mk_markup::{ClosingTag, MarkupStyle, MissingPolicy};
///
/// let style: MarkupStyle = ron::from_str("(closing: Legacy, indent: 2)").unwrap();
///
/// assert_eq!(style.closing, ClosingTag::Legacy);
/// assert_eq!(style.indent, 2);
/// assert_eq!(style.missing, MissingPolicy::Fail);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupStyle {
    pub closing: ClosingTag,
    pub missing: MissingPolicy,
    /// Spaces per nesting level, at most [`MAX_INDENT`].
    #[serde(deserialize_with = "deserialize_indent")]
    pub indent: usize,
    /// Escape `& < > " '` in leaf values.
    pub escape_text: bool,
    pub line_ending: LineEnding,
}

impl MarkupStyle {
    /// Slashed closing tags, failing on missing values, no indentation, no escaping.
    pub const DEFAULT: Self = Self {
        closing: ClosingTag::Slashed,
        missing: MissingPolicy::Fail,
        indent: 0,
        escape_text: false,
        line_ending: LineEnding::Lf,
    };

    /// [`DEFAULT`](Self::DEFAULT) with [`ClosingTag::Legacy`].
    pub const LEGACY: Self = Self::DEFAULT.with_closing(ClosingTag::Legacy);

    #[inline]
    pub const fn with_closing(mut self, closing: ClosingTag) -> Self {
        self.closing = closing;
        self
    }

    #[inline]
    pub const fn with_missing(mut self, missing: MissingPolicy) -> Self {
        self.missing = missing;
        self
    }

    /// Sets the spaces per nesting level, clamped to [`MAX_INDENT`].
    #[inline]
    pub const fn with_indent(mut self, indent: usize) -> Self {
        self.indent = if indent > MAX_INDENT { MAX_INDENT } else { indent };
        self
    }

    /// Returns the spaces per nesting level, clamped to [`MAX_INDENT`].
    #[inline]
    pub const fn effective_indent(&self) -> usize {
        if self.indent > MAX_INDENT {
            MAX_INDENT
        } else {
            self.indent
        }
    }

    #[inline]
    pub const fn with_escape_text(mut self, escape_text: bool) -> Self {
        self.escape_text = escape_text;
        self
    }

    #[inline]
    pub const fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }
}

impl Default for MarkupStyle {
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}
