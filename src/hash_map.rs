//! Unordered hash map over a caller-supplied buffer.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

use crate::chained::{ChainedTable, Entries, EntriesMut, Policy, plan};
use crate::iter::{CursorSource, Sealed};
use crate::{ArenaError, ArenaLayout, Cursor, InsertResult, Version};

/// Fixed-capacity unordered hash map living in a caller-supplied buffer.
///
/// Collisions are chained through the entry array, and removed entries go
/// onto a free list that later inserts reuse, so the map never needs more
/// than `capacity` entry slots. Nothing is allocated after construction and
/// the map never grows: once `capacity` entries are live, inserting a new key
/// returns [`InsertResult::InsufficientCapacity`].
///
/// Keys and values are plain `Copy` data; dropping the map leaves the buffer
/// to its owner and runs no destructors.
///
/// # Example
///
/// ```
/// use arena_collections::{ArenaHashMap, InsertResult};
///
/// let mut buf = vec![0u8; ArenaHashMap::<u32, f64>::byte_count(4)];
/// let mut prices: ArenaHashMap<u32, f64> = ArenaHashMap::new(&mut buf, 4).unwrap();
///
/// assert_eq!(prices.try_add(7, 101.5), InsertResult::Success);
/// assert_eq!(prices.try_add(7, 99.0), InsertResult::AlreadyExists);
/// assert_eq!(prices.try_insert(7, 99.0), InsertResult::Overwritten);
/// assert_eq!(prices.get(&7), Some(&99.0));
///
/// assert_eq!(prices.remove(&7), Some(99.0));
/// assert!(prices.is_empty());
/// ```
pub struct ArenaHashMap<'a, K, V, S = RandomState> {
    table: ChainedTable<'a, K, V, S>,
}

impl<K, V, S> ArenaHashMap<'_, K, V, S> {
    /// Plans the arena for `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::CapacityOverflow`] if `capacity` exceeds
    /// [`MAX_CAPACITY`](crate::MAX_CAPACITY) or the arrays overflow.
    pub fn layout(capacity: usize) -> Result<ArenaLayout, ArenaError> {
        plan::<K, V>(capacity).map(|(layout, _)| layout)
    }

    /// Bytes a buffer needs to hold a map of `capacity` entries.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` cannot be laid out (see [`layout`](Self::layout)).
    #[must_use]
    pub fn byte_count(capacity: usize) -> usize {
        match Self::layout(capacity) {
            Ok(layout) => layout.byte_count(),
            Err(err) => panic!("{err}"),
        }
    }
}

impl<'a, K, V> ArenaHashMap<'a, K, V, RandomState>
where
    K: Copy + Hash + Eq,
    V: Copy,
{
    /// Creates an empty map of `capacity` entries over `buffer`.
    ///
    /// The bucket region of `buffer` is zeroed here, so any initialized
    /// buffer of at least [`byte_count`](Self::byte_count) bytes works.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::BufferTooSmall`] if `buffer` is shorter than
    /// `byte_count(capacity)`, or [`ArenaError::CapacityOverflow`] if
    /// `capacity` cannot be laid out.
    pub fn new(buffer: &'a mut [u8], capacity: usize) -> Result<Self, ArenaError> {
        Self::with_hasher(buffer, capacity, RandomState::new())
    }
}

impl<'a, K, V, S> ArenaHashMap<'a, K, V, S>
where
    K: Copy + Hash + Eq,
    V: Copy,
    S: BuildHasher,
{
    /// Creates an empty map that hashes keys with `hasher`.
    ///
    /// # Errors
    ///
    /// As for [`new`](ArenaHashMap::new).
    pub fn with_hasher(buffer: &'a mut [u8], capacity: usize, hasher: S) -> Result<Self, ArenaError> {
        Ok(Self {
            table: ChainedTable::new(buffer, capacity, hasher)?,
        })
    }

    /// Creates an empty map over a buffer the caller has already zeroed,
    /// skipping the bucket fill.
    ///
    /// # Errors
    ///
    /// As for [`new`](ArenaHashMap::new).
    ///
    /// # Safety
    ///
    /// Every byte of `buffer` that the bucket array occupies must be zero,
    /// for example because the buffer came from `vec![0u8; n]` or
    /// `alloc_zeroed` and has not been used since. Zeroing the whole buffer
    /// satisfies this.
    pub unsafe fn from_zeroed(
        buffer: &'a mut [u8],
        capacity: usize,
        hasher: S,
    ) -> Result<Self, ArenaError> {
        // SAFETY: forwarded from the caller.
        let table = unsafe { ChainedTable::from_zeroed(buffer, capacity, hasher)? };
        Ok(Self { table })
    }

    /// Adds `key` unless it is already present.
    ///
    /// Returns [`InsertResult::Success`], [`InsertResult::AlreadyExists`]
    /// (the stored value is kept), or [`InsertResult::InsufficientCapacity`].
    pub fn try_add(&mut self, key: K, value: V) -> InsertResult {
        self.table.insert(key, value, Policy::RejectDuplicate).0
    }

    /// Inserts `key`, replacing the value if it is already present.
    ///
    /// Returns [`InsertResult::Success`], [`InsertResult::Overwritten`], or
    /// [`InsertResult::InsufficientCapacity`].
    pub fn try_insert(&mut self, key: K, value: V) -> InsertResult {
        self.table.insert(key, value, Policy::Overwrite).0
    }

    /// Returns the value for `key`, inserting `V::default()` first if the key
    /// is absent. The flag is `true` if the key already existed.
    ///
    /// Returns `None` if the key is absent and the map is full.
    ///
    /// # Example
    ///
    /// ```
    /// use arena_collections::ArenaHashMap;
    ///
    /// let mut buf = vec![0u8; ArenaHashMap::<char, u32>::byte_count(8)];
    /// let mut counts: ArenaHashMap<char, u32> = ArenaHashMap::new(&mut buf, 8).unwrap();
    /// for c in "abca".chars() {
    ///     let (n, _) = counts.get_or_add_default(c).unwrap();
    ///     *n += 1;
    /// }
    /// assert_eq!(counts.get(&'a'), Some(&2));
    /// ```
    pub fn get_or_add_default(&mut self, key: K) -> Option<(&mut V, bool)>
    where
        V: Default,
    {
        let (result, index) = self.table.insert(key, V::default(), Policy::GetOrAdd);
        let index = index?;
        Some((self.table.entry_mut(index).1, result == InsertResult::AlreadyExists))
    }

    /// Returns a reference to the value for `key`.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.find(key).map(|index| self.table.entry(index).1)
    }

    /// Returns the stored key and value for `key`.
    #[must_use]
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.find(key).map(|index| self.table.entry(index))
    }

    /// Returns a mutable reference to the value for `key`, updated in place.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.table.find(key)?;
        Some(self.table.entry_mut(index).1)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.find(key).is_some()
    }

    /// Removes `key`, returning its value. The slot is reused by a later
    /// insert.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.remove(key).map(|(_, value)| value)
    }

    /// Removes `key`, returning the stored key and value.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.remove(key)
    }
}

impl<K, V, S> ArenaHashMap<'_, K, V, S>
where
    K: Copy,
    V: Copy,
{
    /// Returns the number of live entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map holds no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    /// Returns the fixed number of entries the map can hold.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the number of buckets (the smallest table prime at or above
    /// the capacity).
    #[must_use]
    pub const fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    /// Returns the current mutation stamp.
    #[must_use]
    pub const fn version(&self) -> Version {
        self.table.version()
    }

    /// Returns the map's hasher.
    #[must_use]
    pub const fn hasher(&self) -> &S {
        self.table.hasher()
    }

    /// Removes every entry. Capacity is unchanged.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Iterates over `(key, value)` pairs in slot order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.entries(),
        }
    }

    /// Iterates over `(key, value)` pairs with mutable values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.table.entries_mut(),
        }
    }

    /// Iterates over keys.
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Iterates over values.
    pub fn values(&self) -> impl ExactSizeIterator<Item = &V> + '_ {
        self.iter().map(|(_, value)| value)
    }

    /// Iterates over mutable values.
    pub fn values_mut(&mut self) -> impl ExactSizeIterator<Item = &mut V> + '_ {
        self.iter_mut().map(|(_, value)| value)
    }

    /// Returns a detached cursor positioned before the first entry.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.table.version(), self.table.identity())
    }
}

impl<K, V, S> Sealed for ArenaHashMap<'_, K, V, S> {}

impl<K: Copy, V: Copy, S> CursorSource for ArenaHashMap<'_, K, V, S> {
    type Item<'s>
        = (&'s K, &'s V)
    where
        Self: 's;

    fn version(&self) -> Version {
        self.table.version()
    }

    fn identity(&self) -> usize {
        self.table.identity()
    }

    fn next_position(&self, from: usize) -> Option<usize> {
        self.table.next_live(from)
    }

    fn item_at(&self, position: usize) -> Self::Item<'_> {
        self.table.entry(position)
    }
}

impl<K, V, S> std::fmt::Debug for ArenaHashMap<'_, K, V, S>
where
    K: Copy + std::fmt::Debug,
    V: Copy + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'m, K: Copy, V: Copy, S> IntoIterator for &'m ArenaHashMap<'_, K, V, S> {
    type Item = (&'m K, &'m V);
    type IntoIter = Iter<'m, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'m, K: Copy, V: Copy, S> IntoIterator for &'m mut ArenaHashMap<'_, K, V, S> {
    type Item = (&'m K, &'m mut V);
    type IntoIter = IterMut<'m, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// Iterator over the entries of an [`ArenaHashMap`].
pub struct Iter<'m, K, V> {
    inner: Entries<'m, K, V>,
}

impl<'m, K, V> Iterator for Iter<'m, K, V> {
    type Item = (&'m K, &'m V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Iterator over the entries of an [`ArenaHashMap`] with mutable values.
pub struct IterMut<'m, K, V> {
    inner: EntriesMut<'m, K, V>,
}

impl<'m, K, V> Iterator for IterMut<'m, K, V> {
    type Item = (&'m K, &'m mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

#[cfg(test)]
impl<K: Copy, V: Copy, S> ArenaHashMap<'_, K, V, S> {
    /// Cross-checks live count, chains and free list.
    pub(crate) fn assert_consistent(&self) {
        assert_eq!(self.table.chained_len(), self.len(), "chains disagree with len");
        self.table.free_list_len();
        assert_eq!(self.iter().count(), self.len(), "iteration disagrees with len");
    }
}
