use core::any::TypeId;
use core::fmt::Debug;

use crate::hash::{FixedHashState, HashMap};
use hashbrown::hash_map::Entry;

// -----------------------------------------------------------------------------
// TypeIdMap

/// A map container with [`TypeId`] as the fixed key type.
///
/// The interface exposes no [`HashMap`] specific APIs, so the underlying
/// storage can change without breaking callers.
pub struct TypeIdMap<V>(HashMap<TypeId, V>);

impl<V> Default for TypeIdMap<V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<V> TypeIdMap<V> {
    /// Creates an empty `TypeIdMap`.
    ///
    /// # Examples
    ///
    /// ```
    /// use mk_utils::TypeIdMap;
    /// let map = TypeIdMap::<i32>::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    pub const fn new() -> Self {
        Self(HashMap::with_hasher(FixedHashState))
    }

    /// Attempts to insert a value for `T`.
    ///
    /// - Returns `true` if the key was not present and the value was inserted.
    /// - Returns `false` if the key already exists, leaving the map unchanged.
    ///
    /// The closure `f` is only called if the key is not present.
    #[inline]
    pub fn try_insert_type<T: ?Sized + 'static>(&mut self, f: impl FnOnce() -> V) -> bool {
        match self.0.entry(TypeId::of::<T>()) {
            Entry::Vacant(entry) => {
                entry.insert(f());
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Inserts a value for `T`, returning the previous one.
    #[inline]
    pub fn insert_type<T: ?Sized + 'static>(&mut self, v: V) -> Option<V> {
        self.0.insert(TypeId::of::<T>(), v)
    }

    /// Returns a reference to the value corresponding to the type.
    #[inline]
    pub fn get(&self, type_id: &TypeId) -> Option<&V> {
        self.0.get(type_id)
    }

    /// Returns a reference to the value corresponding to `T`.
    #[inline(always)]
    pub fn get_type<T: ?Sized + 'static>(&self) -> Option<&V> {
        self.get(&TypeId::of::<T>())
    }

    /// Removes the value corresponding to `T`.
    #[inline]
    pub fn remove_type<T: ?Sized + 'static>(&mut self) -> Option<V> {
        self.0.remove(&TypeId::of::<T>())
    }

    /// Returns `true` if the map contains a value for `T`.
    #[inline]
    pub fn contains_type<T: ?Sized + 'static>(&self) -> bool {
        self.0.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the map contains no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V: Debug> Debug for TypeIdMap<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.0.values()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::TypeIdMap;

    #[test]
    fn insert_and_get() {
        let mut map = TypeIdMap::<&'static str>::new();
        assert!(map.try_insert_type::<u32>(|| "u32"));
        assert!(!map.try_insert_type::<u32>(|| "other"));
        assert_eq!(map.get_type::<u32>(), Some(&"u32"));
        assert_eq!(map.get_type::<u64>(), None);

        assert_eq!(map.insert_type::<u32>("again"), Some("u32"));
        assert_eq!(map.len(), 1);
        assert!(map.contains_type::<u32>());
        assert_eq!(map.remove_type::<u32>(), Some("again"));
        assert!(map.is_empty());
    }
}
