use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::type_name;
use core::fmt::{self, Debug, Display};

use crate::{BoxedError, BuildError, Describe, Descriptor, Renderer};

// -----------------------------------------------------------------------------
// DescriptorBuilder

/// The registration phase of a [`Descriptor`].
///
/// Renderers are appended in call order, which is the order the fields
/// appear in the output. [`build`](Self::build) seals the builder; a built
/// descriptor can never gain renderers again.
///
/// Empty tags are not rejected on the spot: the first one is remembered and
/// reported by `build`. Duplicate tags are allowed.
///
/// # Examples
///
/// ```
/// use mk_markup::Descriptor;
///
/// struct Point { x: i32, y: i32 }
///
/// let point = Descriptor::<Point>::builder()
///     .leaf("X", |p| p.x)
///     .leaf("Y", |p| p.y)
///     .build()
///     .unwrap();
///
/// let text = point.to_markup(&Point { x: 1, y: 2 }, "Point").unwrap();
/// assert_eq!(text, "<Point>\n<X>1</X>\n<Y>2</Y>\n</Point>\n");
/// ```
pub struct DescriptorBuilder<T> {
    renderers: Vec<Renderer<T>>,
    error: Option<BuildError>,
}

impl<T> Default for DescriptorBuilder<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DescriptorBuilder<T> {
    /// Creates a builder with no renderers.
    #[inline]
    pub const fn new() -> Self {
        Self {
            renderers: Vec::new(),
            error: None,
        }
    }

    /// Appends a renderer.
    pub fn push(&mut self, renderer: Renderer<T>) -> &mut Self {
        if renderer.tag().is_empty() {
            self.fail(BuildError::EmptyTag {
                type_name: type_name::<T>(),
                index: self.renderers.len(),
            });
        } else {
            self.renderers.push(renderer);
        }
        self
    }

    fn fail(&mut self, error: BuildError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    #[inline]
    fn with(mut self, renderer: Renderer<T>) -> Self {
        self.push(renderer);
        self
    }

    /// Registers a leaf field rendered from an owned value.
    #[inline]
    pub fn leaf<V, F>(self, tag: impl Into<Cow<'static, str>>, accessor: F) -> Self
    where
        V: Display,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.with(Renderer::leaf(tag, accessor))
    }

    /// Registers a leaf field rendered from a borrowed value.
    #[inline]
    pub fn leaf_ref<V, F>(self, tag: impl Into<Cow<'static, str>>, accessor: F) -> Self
    where
        V: Display + ?Sized,
        F: Fn(&T) -> &V + Send + Sync + 'static,
    {
        self.with(Renderer::leaf_ref(tag, accessor))
    }

    /// Registers a leaf field that may be absent.
    #[inline]
    pub fn optional_leaf<V, F>(self, tag: impl Into<Cow<'static, str>>, accessor: F) -> Self
    where
        V: Display + ?Sized,
        F: Fn(&T) -> Option<&V> + Send + Sync + 'static,
    {
        self.with(Renderer::optional_leaf(tag, accessor))
    }

    /// Registers a leaf field read by a fallible accessor.
    #[inline]
    pub fn try_leaf<V, E, F>(self, tag: impl Into<Cow<'static, str>>, accessor: F) -> Self
    where
        V: Display,
        E: Into<BoxedError>,
        F: Fn(&T) -> Result<V, E> + Send + Sync + 'static,
    {
        self.with(Renderer::try_leaf(tag, accessor))
    }

    /// Registers a nested field rendered by an already built `descriptor`.
    #[inline]
    pub fn child<U, F>(
        self,
        tag: impl Into<Cow<'static, str>>,
        descriptor: &Descriptor<U>,
        accessor: F,
    ) -> Self
    where
        U: 'static,
        F: Fn(&T) -> &U + Send + Sync + 'static,
    {
        self.with(Renderer::child(tag, descriptor, accessor))
    }

    /// Registers a nested field that may be absent.
    #[inline]
    pub fn optional_child<U, F>(
        self,
        tag: impl Into<Cow<'static, str>>,
        descriptor: &Descriptor<U>,
        accessor: F,
    ) -> Self
    where
        U: 'static,
        F: Fn(&T) -> Option<&U> + Send + Sync + 'static,
    {
        self.with(Renderer::optional_child(tag, descriptor, accessor))
    }

    /// Registers a slice field, one nested block per element.
    #[inline]
    pub fn sequence<U, F>(
        self,
        tag: impl Into<Cow<'static, str>>,
        descriptor: &Descriptor<U>,
        accessor: F,
    ) -> Self
    where
        U: 'static,
        F: Fn(&T) -> &[U] + Send + Sync + 'static,
    {
        self.with(Renderer::sequence(tag, descriptor, accessor))
    }

    /// Registers a nested field rendered by the [`Describe`] descriptor of `U`.
    ///
    /// A failure to build `U`'s descriptor is reported by [`build`](Self::build).
    pub fn described_child<U, F>(mut self, tag: impl Into<Cow<'static, str>>, accessor: F) -> Self
    where
        U: Describe,
        F: Fn(&T) -> &U + Send + Sync + 'static,
    {
        match Descriptor::<U>::of() {
            Ok(descriptor) => self.with(Renderer::child(tag, &descriptor, accessor)),
            Err(source) => {
                self.fail(BuildError::Child {
                    type_name: type_name::<U>(),
                    source: Box::new(source),
                });
                self
            }
        }
    }

    /// Returns the number of renderers registered so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }

    /// Seals the builder into a reusable [`Descriptor`].
    pub fn build(self) -> Result<Descriptor<T>, BuildError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        log::debug!(
            "sealed descriptor for `{}` with {} renderers",
            type_name::<T>(),
            self.renderers.len(),
        );

        Ok(Descriptor::from_renderers(self.renderers))
    }
}

impl<T> Debug for DescriptorBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorBuilder")
            .field("type", &type_name::<T>())
            .field("renderers", &self.renderers)
            .field("error", &self.error)
            .finish()
    }
}
