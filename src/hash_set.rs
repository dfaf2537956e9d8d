//! Unordered hash set over a caller-supplied buffer.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

use crate::chained::{ChainedTable, Entries, Policy, plan};
use crate::iter::{CursorSource, Sealed};
use crate::{ArenaError, ArenaLayout, Cursor, InsertResult, Version};

/// Fixed-capacity hash set living in a caller-supplied buffer.
///
/// The same chained engine as [`ArenaHashMap`](crate::ArenaHashMap) with no
/// value stored per entry.
///
/// # Example
///
/// ```
/// use arena_collections::{ArenaHashSet, InsertResult};
///
/// let mut buf = vec![0u8; ArenaHashSet::<u16>::byte_count(2)];
/// let mut seen: ArenaHashSet<u16> = ArenaHashSet::new(&mut buf, 2).unwrap();
///
/// assert_eq!(seen.try_add(80), InsertResult::Success);
/// assert_eq!(seen.try_add(443), InsertResult::Success);
/// assert_eq!(seen.try_add(80), InsertResult::AlreadyExists);
/// assert_eq!(seen.try_add(22), InsertResult::InsufficientCapacity);
/// assert!(seen.contains(&443));
/// ```
pub struct ArenaHashSet<'a, T, S = RandomState> {
    table: ChainedTable<'a, T, (), S>,
}

impl<T, S> ArenaHashSet<'_, T, S> {
    /// Plans the arena for `capacity` values.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::CapacityOverflow`] if `capacity` cannot be laid
    /// out.
    pub fn layout(capacity: usize) -> Result<ArenaLayout, ArenaError> {
        plan::<T, ()>(capacity).map(|(layout, _)| layout)
    }

    /// Bytes a buffer needs to hold a set of `capacity` values.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` cannot be laid out.
    #[must_use]
    pub fn byte_count(capacity: usize) -> usize {
        match Self::layout(capacity) {
            Ok(layout) => layout.byte_count(),
            Err(err) => panic!("{err}"),
        }
    }
}

impl<'a, T> ArenaHashSet<'a, T, RandomState>
where
    T: Copy + Hash + Eq,
{
    /// Creates an empty set of `capacity` values over `buffer`.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::BufferTooSmall`] if `buffer` is shorter than
    /// `byte_count(capacity)`, or [`ArenaError::CapacityOverflow`].
    pub fn new(buffer: &'a mut [u8], capacity: usize) -> Result<Self, ArenaError> {
        Self::with_hasher(buffer, capacity, RandomState::new())
    }
}

impl<'a, T, S> ArenaHashSet<'a, T, S>
where
    T: Copy + Hash + Eq,
    S: BuildHasher,
{
    /// Creates an empty set that hashes values with `hasher`.
    ///
    /// # Errors
    ///
    /// As for [`new`](ArenaHashSet::new).
    pub fn with_hasher(buffer: &'a mut [u8], capacity: usize, hasher: S) -> Result<Self, ArenaError> {
        Ok(Self {
            table: ChainedTable::new(buffer, capacity, hasher)?,
        })
    }

    /// Creates an empty set over an already zeroed buffer.
    ///
    /// # Errors
    ///
    /// As for [`new`](ArenaHashSet::new).
    ///
    /// # Safety
    ///
    /// Same contract as
    /// [`ArenaHashMap::from_zeroed`](crate::ArenaHashMap::from_zeroed): the
    /// bucket bytes of `buffer` must be zero.
    pub unsafe fn from_zeroed(
        buffer: &'a mut [u8],
        capacity: usize,
        hasher: S,
    ) -> Result<Self, ArenaError> {
        // SAFETY: forwarded from the caller.
        let table = unsafe { ChainedTable::from_zeroed(buffer, capacity, hasher)? };
        Ok(Self { table })
    }

    /// Adds `value` unless an equal value is present.
    pub fn try_add(&mut self, value: T) -> InsertResult {
        self.table.insert(value, (), Policy::RejectDuplicate).0
    }

    /// Adds `value`. If an equal value is already stored, reports
    /// [`InsertResult::Overwritten`] and advances the version.
    pub fn try_insert(&mut self, value: T) -> InsertResult {
        self.table.insert(value, (), Policy::Overwrite).0
    }

    /// Returns `true` if an equal value is present.
    #[must_use]
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.find(value).is_some()
    }

    /// Returns the stored value equal to `value`.
    #[must_use]
    pub fn get<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.find(value).map(|index| self.table.entry(index).0)
    }

    /// Removes the value equal to `value`. Returns `true` if one was present.
    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.remove(value).is_some()
    }

    /// Removes and returns the stored value equal to `value`.
    pub fn take<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.remove(value).map(|(stored, ())| stored)
    }
}

impl<T: Copy, S> ArenaHashSet<'_, T, S> {
    /// Returns the number of values.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    /// Returns the fixed number of values the set can hold.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the current mutation stamp.
    #[must_use]
    pub const fn version(&self) -> Version {
        self.table.version()
    }

    /// Removes every value.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Iterates over the values in slot order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.table.entries(),
        }
    }

    /// Returns a detached cursor positioned before the first value.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.table.version(), self.table.identity())
    }
}

impl<T, S> Sealed for ArenaHashSet<'_, T, S> {}

impl<T: Copy, S> CursorSource for ArenaHashSet<'_, T, S> {
    type Item<'s>
        = &'s T
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
        self.table.entry(position).0
    }
}

impl<T: Copy + std::fmt::Debug, S> std::fmt::Debug for ArenaHashSet<'_, T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'s, T: Copy, S> IntoIterator for &'s ArenaHashSet<'_, T, S> {
    type Item = &'s T;
    type IntoIter = Iter<'s, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the values of an [`ArenaHashSet`].
pub struct Iter<'s, T> {
    inner: Entries<'s, T, ()>,
}

impl<'s, T> Iterator for Iter<'s, T> {
    type Item = &'s T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(value, _)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

#[cfg(test)]
impl<T: Copy, S> ArenaHashSet<'_, T, S> {
    pub(crate) fn assert_consistent(&self) {
        assert_eq!(self.table.chained_len(), self.len(), "chains disagree with len");
        self.table.free_list_len();
    }
}
