#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// no_std support

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod builder;
mod descriptor;
mod emitter;
mod error;
mod registry;
mod renderer;
mod sink;
mod style;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use builder::DescriptorBuilder;
pub use descriptor::{Describe, Descriptor};
pub use emitter::Emitter;
pub use error::{BoxedError, BuildError, SerializeError, SerializeErrorKind, SinkError, TagPath};
pub use registry::DescriptorRegistry;
pub use renderer::{Renderer, RendererKind};
pub use sink::{FmtSink, Sink};
pub use style::{ClosingTag, LineEnding, MAX_INDENT, MarkupStyle, MissingPolicy};

#[cfg(feature = "std")]
pub use sink::IoSink;
