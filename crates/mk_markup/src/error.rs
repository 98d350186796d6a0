use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use thiserror::Error;

/// A type-erased error returned by a fallible accessor.
pub type BoxedError = Box<dyn core::error::Error + Send + Sync + 'static>;

// -----------------------------------------------------------------------------
// SinkError

/// An error raised by a [`Sink`](crate::Sink) while writing.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SinkError {
    #[error("formatter error")]
    Fmt(#[from] fmt::Error),

    #[cfg(feature = "std")]
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// -----------------------------------------------------------------------------
// BuildError

/// An error reported by [`DescriptorBuilder::build`](crate::DescriptorBuilder::build).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BuildError {
    #[error("renderer #{index} of `{type_name}` has an empty tag")]
    EmptyTag {
        type_name: &'static str,
        index: usize,
    },

    #[error("failed to build child descriptor `{type_name}`: {source}")]
    Child {
        type_name: &'static str,
        source: Box<BuildError>,
    },
}

// -----------------------------------------------------------------------------
// TagPath

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    tag: String,
    #[cfg(all(debug_assertions, feature = "debug"))]
    type_name: Option<&'static str>,
}

/// The chain of tags leading to the element where serialization failed.
///
/// Displayed outermost first, joined by `/`, e.g. `Person/MobilePhone/Number`.
/// With the `debug` feature in debug builds, nested blocks also show the
/// Rust type of their descriptor: `Person<demo::Person>/Number`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagPath {
    // innermost first, pushed while the error unwinds.
    segments: Vec<Segment>,
}

impl TagPath {
    /// Iterates the tags outermost first.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().rev().map(|s| s.tag.as_str())
    }

    /// Returns the number of tags in the path.
    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if the error happened before any element was entered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    fn push(&mut self, tag: &str, _type_name: Option<&'static str>) {
        self.segments.push(Segment {
            tag: tag.to_string(),
            #[cfg(all(debug_assertions, feature = "debug"))]
            type_name: _type_name,
        });
    }
}

impl fmt::Display for TagPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, segment) in self.segments.iter().rev().enumerate() {
            if index > 0 {
                f.write_str("/")?;
            }
            f.write_str(&segment.tag)?;

            #[cfg(all(debug_assertions, feature = "debug"))]
            if let Some(type_name) = segment.type_name {
                write!(f, "<{type_name}>")?;
            }
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// SerializeError

/// The kind of [`SerializeError`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SerializeErrorKind {
    #[error("failed to write to sink: {0}")]
    Sink(#[from] SinkError),

    #[error("accessor failed: {0}")]
    Accessor(#[source] BoxedError),

    #[error("value is absent")]
    MissingValue,

    #[error("value could not be formatted")]
    Format,

    #[error("root tag is empty")]
    EmptyTag,
}

/// An error that aborted [`Descriptor::serialize`](crate::Descriptor::serialize).
///
/// Output already written to the sink is left in place.
#[derive(Debug, Error)]
#[error("{kind} (at `{path}`)")]
pub struct SerializeError {
    #[source]
    kind: SerializeErrorKind,
    path: TagPath,
}

impl SerializeError {
    #[inline]
    pub(crate) fn new(kind: SerializeErrorKind) -> Self {
        Self {
            kind,
            path: TagPath::default(),
        }
    }

    #[inline]
    pub(crate) fn missing() -> Self {
        Self::new(SerializeErrorKind::MissingValue)
    }

    #[inline]
    pub(crate) fn accessor(err: impl Into<BoxedError>) -> Self {
        Self::new(SerializeErrorKind::Accessor(err.into()))
    }

    /// Records that the error happened inside the leaf element `tag`.
    #[inline]
    pub(crate) fn within(mut self, tag: &str) -> Self {
        self.path.push(tag, None);
        self
    }

    /// Records that the error happened inside the block `tag` rendered by a `Descriptor<T>`.
    #[inline]
    pub(crate) fn within_block<T>(mut self, tag: &str) -> Self {
        self.path.push(tag, Some(core::any::type_name::<T>()));
        self
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> &SerializeErrorKind {
        &self.kind
    }

    /// Returns the tags leading to the failing element.
    #[inline]
    pub fn path(&self) -> &TagPath {
        &self.path
    }

    /// Consumes the error, returning its kind.
    #[inline]
    pub fn into_kind(self) -> SerializeErrorKind {
        self.kind
    }
}

impl From<SinkError> for SerializeError {
    #[inline]
    fn from(value: SinkError) -> Self {
        Self::new(SerializeErrorKind::Sink(value))
    }
}
