use alloc::boxed::Box;
use core::any::{Any, type_name};
use core::fmt::{self, Debug};

use mk_utils::TypeIdMap;

use crate::{BuildError, Describe, Descriptor};

type ErasedDescriptor = Box<dyn Any + Send + Sync>;

// -----------------------------------------------------------------------------
// DescriptorRegistry

/// A store holding at most one [`Descriptor`] per type.
///
/// Descriptors are usually built once during start-up, registered here and
/// fetched for every later serialization.
///
/// # Examples
///
/// ```
/// use mk_markup::{Descriptor, DescriptorRegistry};
///
/// struct Point { x: i32, y: i32 }
///
/// let mut registry = DescriptorRegistry::new();
/// registry.register(
///     Descriptor::<Point>::builder()
///         .leaf("X", |p| p.x)
///         .leaf("Y", |p| p.y)
///         .build()
///         .unwrap(),
/// );
///
/// let point = registry.get::<Point>().unwrap();
/// assert_eq!(point.len(), 2);
/// ```
#[derive(Default)]
pub struct DescriptorRegistry {
    table: TypeIdMap<ErasedDescriptor>,
}

impl DescriptorRegistry {
    /// Creates an empty registry.
    #[inline]
    pub const fn new() -> Self {
        Self {
            table: TypeIdMap::new(),
        }
    }

    /// Registers the descriptor of `T`, returning the one it replaced.
    pub fn register<T: 'static>(&mut self, descriptor: Descriptor<T>) -> Option<Descriptor<T>> {
        let old = self.table.insert_type::<T>(Box::new(descriptor))?;
        log::warn!("replaced the registered descriptor of `{}`", type_name::<T>());
        old.downcast::<Descriptor<T>>().ok().map(|boxed| *boxed)
    }

    /// Registers the descriptor of `T` only if none exists yet.
    ///
    /// Returns `false` and leaves the registry unchanged otherwise.
    #[inline]
    pub fn try_register<T: 'static>(&mut self, descriptor: Descriptor<T>) -> bool {
        self.table
            .try_insert_type::<T>(|| Box::new(descriptor))
    }

    /// Registers the [`Describe`] descriptor of `T` if none exists yet.
    #[inline]
    pub fn register_described<T: Describe>(&mut self) -> Result<(), BuildError> {
        self.get_or_describe::<T>().map(|_| ())
    }

    /// Returns the descriptor of `T`, building and registering it first if needed.
    pub fn get_or_describe<T: Describe>(&mut self) -> Result<Descriptor<T>, BuildError> {
        if let Some(descriptor) = self.get::<T>() {
            return Ok(descriptor.clone());
        }

        let descriptor = Descriptor::<T>::of()?;
        self.table.insert_type::<T>(Box::new(descriptor.clone()));
        Ok(descriptor)
    }

    /// Returns the descriptor registered for `T`.
    #[inline]
    pub fn get<T: 'static>(&self) -> Option<&Descriptor<T>> {
        self.table
            .get_type::<T>()
            .and_then(|erased| erased.downcast_ref::<Descriptor<T>>())
    }

    /// Removes and returns the descriptor registered for `T`.
    pub fn remove<T: 'static>(&mut self) -> Option<Descriptor<T>> {
        let erased = self.table.remove_type::<T>()?;
        erased.downcast::<Descriptor<T>>().ok().map(|boxed| *boxed)
    }

    #[inline]
    pub fn contains<T: 'static>(&self) -> bool {
        self.table.contains_type::<T>()
    }

    /// Returns the number of registered descriptors.
    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Debug for DescriptorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorRegistry")
            .field("len", &self.table.len())
            .finish_non_exhaustive()
    }
}
