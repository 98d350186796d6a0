use alloc::borrow::Cow;
use alloc::boxed::Box;
use core::any::type_name;
use core::fmt::{self, Debug, Display};

use crate::{BoxedError, Descriptor, Emitter, SerializeError};

type RenderFn<T> = dyn Fn(&str, &T, &mut Emitter<'_>) -> Result<(), SerializeError> + Send + Sync;

#[inline]
fn erase<T, F>(func: F) -> Box<RenderFn<T>>
where
    F: Fn(&str, &T, &mut Emitter<'_>) -> Result<(), SerializeError> + Send + Sync + 'static,
{
    Box::new(func)
}

// -----------------------------------------------------------------------------
// RendererKind

/// What a [`Renderer`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RendererKind {
    /// A single `<tag>value</tag>` line.
    Leaf,
    /// One nested block written by a `Descriptor` of the named type.
    Child { type_name: &'static str },
    /// One nested block per element, all written by a `Descriptor` of the named type.
    Sequence { type_name: &'static str },
}

// -----------------------------------------------------------------------------
// Renderer

/// One registered field of a [`Descriptor`]: a tag, an accessor, and a way to render it.
///
/// Renderers are stateless and are invoked once per serialized instance.
/// They are usually created by [`DescriptorBuilder`](crate::DescriptorBuilder),
/// but can be built and invoked on their own.
///
/// # Examples
///
/// ```
/// use mk_markup::{Emitter, MarkupStyle, Renderer, RendererKind};
///
/// struct Point { x: i32 }
///
/// let renderer = Renderer::leaf("X", |p: &Point| p.x);
/// assert_eq!(renderer.tag(), "X");
/// assert_eq!(renderer.kind(), RendererKind::Leaf);
///
/// let mut out = String::new();
/// let style = MarkupStyle::DEFAULT;
/// renderer.render(&Point { x: 1 }, &mut Emitter::new(&mut out, &style)).unwrap();
/// assert_eq!(out, "<X>1</X>\n");
/// ```
pub struct Renderer<T> {
    tag: Cow<'static, str>,
    kind: RendererKind,
    render: Box<RenderFn<T>>,
}

impl<T> Renderer<T> {
    /// Renders `accessor(value)` as a leaf line.
    pub fn leaf<V, F>(tag: impl Into<Cow<'static, str>>, accessor: F) -> Self
    where
        V: Display,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        Self::custom(tag, RendererKind::Leaf, move |tag, value, out| {
            out.leaf(tag, &accessor(value))
        })
    }

    /// Renders a borrowed field as a leaf line.
    pub fn leaf_ref<V, F>(tag: impl Into<Cow<'static, str>>, accessor: F) -> Self
    where
        V: Display + ?Sized,
        F: Fn(&T) -> &V + Send + Sync + 'static,
    {
        Self::custom(tag, RendererKind::Leaf, move |tag, value, out| {
            out.leaf(tag, &accessor(value))
        })
    }

    /// Renders an optional field as a leaf line, or applies the
    /// [`MissingPolicy`](crate::MissingPolicy) when it is `None`.
    pub fn optional_leaf<V, F>(tag: impl Into<Cow<'static, str>>, accessor: F) -> Self
    where
        V: Display + ?Sized,
        F: Fn(&T) -> Option<&V> + Send + Sync + 'static,
    {
        Self::custom(tag, RendererKind::Leaf, move |tag, value, out| {
            match accessor(value) {
                Some(field) => out.leaf(tag, &field),
                None => out.missing(tag),
            }
        })
    }

    /// Renders the result of a fallible accessor as a leaf line.
    ///
    /// An accessor error aborts serialization with
    /// [`SerializeErrorKind::Accessor`](crate::SerializeErrorKind::Accessor).
    pub fn try_leaf<V, E, F>(tag: impl Into<Cow<'static, str>>, accessor: F) -> Self
    where
        V: Display,
        E: Into<BoxedError>,
        F: Fn(&T) -> Result<V, E> + Send + Sync + 'static,
    {
        Self::custom(tag, RendererKind::Leaf, move |tag, value, out| {
            let field = accessor(value).map_err(|e| SerializeError::accessor(e).within(tag))?;
            out.leaf(tag, &field)
        })
    }

    /// Delegates a nested field to `descriptor`.
    ///
    /// The descriptor is shared, not copied: the renderer keeps it alive.
    pub fn child<U, F>(
        tag: impl Into<Cow<'static, str>>,
        descriptor: &Descriptor<U>,
        accessor: F,
    ) -> Self
    where
        U: 'static,
        F: Fn(&T) -> &U + Send + Sync + 'static,
    {
        let descriptor = descriptor.clone();
        let kind = RendererKind::Child {
            type_name: type_name::<U>(),
        };
        Self::custom(tag, kind, move |tag, value, out| {
            descriptor.serialize_block(accessor(value), tag, out)
        })
    }

    /// Delegates an optional nested field to `descriptor`, or applies the
    /// [`MissingPolicy`](crate::MissingPolicy) when it is `None`.
    pub fn optional_child<U, F>(
        tag: impl Into<Cow<'static, str>>,
        descriptor: &Descriptor<U>,
        accessor: F,
    ) -> Self
    where
        U: 'static,
        F: Fn(&T) -> Option<&U> + Send + Sync + 'static,
    {
        let descriptor = descriptor.clone();
        let kind = RendererKind::Child {
            type_name: type_name::<U>(),
        };
        Self::custom(tag, kind, move |tag, value, out| match accessor(value) {
            Some(child) => descriptor.serialize_block(child, tag, out),
            None => out.missing(tag),
        })
    }

    /// Writes one nested block per element of a slice, each tagged `tag`.
    ///
    /// An empty slice writes nothing.
    pub fn sequence<U, F>(
        tag: impl Into<Cow<'static, str>>,
        descriptor: &Descriptor<U>,
        accessor: F,
    ) -> Self
    where
        U: 'static,
        F: Fn(&T) -> &[U] + Send + Sync + 'static,
    {
        let descriptor = descriptor.clone();
        let kind = RendererKind::Sequence {
            type_name: type_name::<U>(),
        };
        Self::custom(tag, kind, move |tag, value, out| {
            accessor(value)
                .iter()
                .try_for_each(|item| descriptor.serialize_block(item, tag, out))
        })
    }

    /// Creates a renderer from a raw render function.
    ///
    /// The function receives the renderer's tag, the instance, and the emitter.
    /// It must write whole lines only.
    pub fn custom<F>(tag: impl Into<Cow<'static, str>>, kind: RendererKind, render: F) -> Self
    where
        F: Fn(&str, &T, &mut Emitter<'_>) -> Result<(), SerializeError> + Send + Sync + 'static,
    {
        Self {
            tag: tag.into(),
            kind,
            render: erase(render),
        }
    }

    #[inline]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[inline]
    pub fn kind(&self) -> RendererKind {
        self.kind
    }

    /// Renders the field of `value` into `out`.
    #[inline]
    pub fn render(&self, value: &T, out: &mut Emitter<'_>) -> Result<(), SerializeError> {
        (self.render)(&self.tag, value, out)
    }
}

impl<T> Debug for Renderer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("tag", &self.tag)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
