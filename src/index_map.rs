//! Insertion-ordered hash map.
//!
//! Lookup is the same bucket/chain walk as the unordered map, but entries are
//! kept dense in positional order instead of being recycled through a free
//! list:
//!
//! ```text
//! buckets: [u32; prime >= capacity]   1-based head of each chain, 0 = empty
//! entries: [Entry<K, V>; capacity]    positions 0..len, in insertion order
//! ```
//!
//! Inserting at or removing from the middle moves every later entry by one
//! position, so every chain link and bucket head that names a moved position
//! is shifted by one as well. That makes positional insert and removal O(n)
//! and buys stable iteration order plus addressing by position.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::mem::MaybeUninit;
use std::collections::hash_map::RandomState;

use crate::chained::corrupted;
use crate::hashing::{BucketIndexer, bucket_count, hash_code};
use crate::iter::{CursorSource, Sealed};
use crate::layout::{Carver, check_capacity};
use crate::link::Link;
use crate::{ArenaError, ArenaLayout, Cursor, InsertResult, Version};

#[derive(Clone, Copy)]
struct Entry<K, V> {
    hash: u32,
    next: Link,
    key: K,
    value: V,
}

fn plan<K, V>(capacity: usize) -> Result<(ArenaLayout, u32), ArenaError> {
    check_capacity(capacity)?;
    let min = u32::try_from(capacity).map_err(|_| ArenaError::CapacityOverflow { capacity })?;
    let buckets = bucket_count(min);
    let layout = ArenaLayout::new()
        .array::<u32>(buckets as usize)?
        .array::<Entry<K, V>>(capacity)?;
    Ok((layout, buckets))
}

/// Direction of a positional shift.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Shift {
    Up,
    Down,
}

/// Fixed-capacity hash map that remembers insertion order.
///
/// Iteration visits entries in the order they occupy positions
/// `0..len()`: insertion order, adjusted for removals and positional
/// inserts. Entries are also addressable by position
/// ([`get_at`](Self::get_at), [`set_at`](Self::set_at),
/// [`remove_at`](Self::remove_at), [`try_add_at`](Self::try_add_at)).
///
/// Removal is O(n): later entries move down one position.
///
/// # Example
///
/// ```
/// use arena_collections::{ArenaIndexMap, InsertResult};
///
/// let mut buf = vec![0u8; ArenaIndexMap::<&str, u32>::byte_count(4)];
/// let mut map: ArenaIndexMap<&str, u32> = ArenaIndexMap::new(&mut buf, 4).unwrap();
///
/// assert_eq!(map.try_add("a", 1), InsertResult::Success);
/// assert_eq!(map.try_add("b", 2), InsertResult::Success);
/// assert_eq!(map.try_add("c", 3), InsertResult::Success);
///
/// map.remove_at(0);
/// let keys: Vec<_> = map.keys().copied().collect();
/// assert_eq!(keys, ["b", "c"]);
/// assert_eq!(map.index_of("c"), Some(1));
/// ```
pub struct ArenaIndexMap<'a, K, V, S = RandomState> {
    buckets: &'a mut [u32],
    entries: &'a mut [MaybeUninit<Entry<K, V>>],
    indexer: BucketIndexer,
    len: usize,
    version: Version,
    hasher: S,
}

impl<K, V, S> ArenaIndexMap<'_, K, V, S> {
    /// Plans the arena for `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::CapacityOverflow`] if `capacity` cannot be laid
    /// out.
    pub fn layout(capacity: usize) -> Result<ArenaLayout, ArenaError> {
        plan::<K, V>(capacity).map(|(layout, _)| layout)
    }

    /// Bytes a buffer needs to hold a map of `capacity` entries.
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

impl<'a, K, V> ArenaIndexMap<'a, K, V, RandomState>
where
    K: Copy + Hash + Eq,
    V: Copy,
{
    /// Creates an empty map of `capacity` entries over `buffer`, zeroing
    /// its bucket region.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::BufferTooSmall`] if `buffer` is shorter than
    /// `byte_count(capacity)`, or [`ArenaError::CapacityOverflow`].
    pub fn new(buffer: &'a mut [u8], capacity: usize) -> Result<Self, ArenaError> {
        Self::with_hasher(buffer, capacity, RandomState::new())
    }
}

impl<'a, K, V, S> ArenaIndexMap<'a, K, V, S>
where
    K: Copy,
    V: Copy,
{
    fn carve(buffer: &'a mut [u8], capacity: usize, hasher: S) -> Result<Self, ArenaError> {
        let (layout, buckets) = plan::<K, V>(capacity)?;
        let mut carver = Carver::new(buffer, layout)?;
        let bucket_words = carver.take_words(buckets as usize);
        let entries = carver.take::<Entry<K, V>>(capacity);
        Ok(Self {
            buckets: bucket_words,
            entries,
            indexer: BucketIndexer::new(buckets),
            len: 0,
            version: Version::initial(),
            hasher,
        })
    }

    /// Returns the number of entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the map is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the fixed number of entries the map can hold.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Returns the current mutation stamp.
    #[must_use]
    pub const fn version(&self) -> Version {
        self.version
    }

    /// Returns the map's hasher.
    #[must_use]
    pub const fn hasher(&self) -> &S {
        &self.hasher
    }

    #[inline]
    fn entry(&self, position: usize) -> &Entry<K, V> {
        debug_assert!(position < self.len);
        // SAFETY: positions `0..len` are always initialized; every operation
        // that grows `len` writes the new position first.
        unsafe { self.entries[position].assume_init_ref() }
    }

    #[inline]
    fn entry_mut(&mut self, position: usize) -> &mut Entry<K, V> {
        debug_assert!(position < self.len);
        // SAFETY: as in `entry`.
        unsafe { self.entries[position].assume_init_mut() }
    }

    #[track_caller]
    fn check_position(&self, position: usize) {
        assert!(
            position < self.len,
            "index out of bounds: index is {position} but len is {}",
            self.len,
        );
    }

    /// Returns the key and value at `position`.
    ///
    /// # Panics
    ///
    /// Panics if `position >= len()`.
    #[must_use]
    #[track_caller]
    pub fn get_at(&self, position: usize) -> (&K, &V) {
        self.check_position(position);
        let entry = self.entry(position);
        (&entry.key, &entry.value)
    }

    /// Returns the key and a mutable value at `position`.
    ///
    /// # Panics
    ///
    /// Panics if `position >= len()`.
    #[track_caller]
    pub fn get_at_mut(&mut self, position: usize) -> (&K, &mut V) {
        self.check_position(position);
        let entry = self.entry_mut(position);
        (&entry.key, &mut entry.value)
    }

    /// Returns the key and value at `position`, or `None` if out of bounds.
    #[must_use]
    pub fn try_get_at(&self, position: usize) -> Option<(&K, &V)> {
        (position < self.len).then(|| {
            let entry = self.entry(position);
            (&entry.key, &entry.value)
        })
    }

    /// Returns the first entry in positional order.
    #[must_use]
    pub fn first(&self) -> Option<(&K, &V)> {
        self.try_get_at(0)
    }

    /// Returns the last entry in positional order.
    #[must_use]
    pub fn last(&self) -> Option<(&K, &V)> {
        self.len.checked_sub(1).and_then(|last| self.try_get_at(last))
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.buckets.fill(0);
        self.len = 0;
        self.version.bump();
    }

    /// Iterates over `(key, value)` pairs in positional order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.entries[..self.len].iter(),
        }
    }

    /// Iterates over `(key, value)` pairs in positional order with mutable
    /// values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.entries[..self.len].iter_mut(),
        }
    }

    /// Iterates over keys in positional order.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Iterates over values in positional order.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator + '_ {
        self.iter().map(|(_, value)| value)
    }

    /// Iterates over mutable values in positional order.
    pub fn values_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut V> + ExactSizeIterator + '_ {
        self.iter_mut().map(|(_, value)| value)
    }

    /// Returns a detached cursor positioned before the first entry.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.version, self.buckets.as_ptr().addr())
    }

    /// Walks one chain looking for `key`.
    fn find_in_bucket<Q>(&self, bucket: usize, hash: u32, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let mut link = Link::from_bucket(self.buckets[bucket]);
        let mut walked = 0usize;
        while let Some(position) = link.index() {
            let entry = self.entry(position);
            if entry.hash == hash && <K as Borrow<Q>>::borrow(&entry.key) == key {
                return Some(position);
            }
            link = entry.next;
            walked += 1;
            if walked > self.entries.len() {
                corrupted();
            }
        }
        None
    }

    /// Makes `position` the head of its bucket's chain.
    fn push_into_bucket(&mut self, position: usize) {
        let bucket = self.indexer.index(self.entry(position).hash);
        let head = Link::from_bucket(self.buckets[bucket]);
        self.entry_mut(position).next = head;
        self.buckets[bucket] = Link::to(position).to_bucket();
    }

    /// Splices `position` out of its bucket's chain.
    fn remove_from_bucket(&mut self, position: usize) {
        let Entry { hash, next, .. } = *self.entry(position);
        let bucket = self.indexer.index(hash);
        let mut previous = Link::NONE;
        let mut link = Link::from_bucket(self.buckets[bucket]);
        let mut walked = 0usize;
        while let Some(current) = link.index() {
            if current == position {
                match previous.index() {
                    None => self.buckets[bucket] = next.to_bucket(),
                    Some(previous) => self.entry_mut(previous).next = next,
                }
                return;
            }
            previous = link;
            link = self.entry(current).next;
            walked += 1;
            if walked > self.entries.len() {
                break;
            }
        }
        corrupted();
    }

    /// Moves every bucket head and chain link naming a position `>= from`
    /// one step in `shift`'s direction.
    fn shift_links(&mut self, from: usize, shift: Shift) {
        let moved = |link: Link| match link.index() {
            Some(position) if position >= from => match shift {
                Shift::Up => Link::to(position + 1),
                Shift::Down => Link::to(position - 1),
            },
            _ => link,
        };
        for head in self.buckets.iter_mut() {
            *head = moved(Link::from_bucket(*head)).to_bucket();
        }
        for position in 0..self.len {
            let entry = self.entry_mut(position);
            entry.next = moved(entry.next);
        }
    }

    /// Appends a new entry. The caller has checked the key is absent.
    fn append(&mut self, hash: u32, key: K, value: V) -> InsertResult {
        if self.len == self.entries.len() {
            return InsertResult::InsufficientCapacity;
        }
        let position = self.len;
        self.entries[position].write(Entry {
            hash,
            next: Link::NONE,
            key,
            value,
        });
        self.len += 1;
        self.push_into_bucket(position);
        self.version.bump();
        InsertResult::Success
    }

    /// Removes the entry at `position`, closing the gap.
    ///
    /// # Panics
    ///
    /// Panics if `position >= len()`.
    #[track_caller]
    pub fn remove_at(&mut self, position: usize) -> (K, V) {
        self.check_position(position);
        let Entry { key, value, .. } = *self.entry(position);
        self.remove_from_bucket(position);
        self.entries.copy_within(position + 1..self.len, position);
        self.len -= 1;
        self.entries[self.len] = MaybeUninit::zeroed();
        self.shift_links(position + 1, Shift::Down);
        self.version.bump();
        (key, value)
    }
}

impl<'a, K, V, S> ArenaIndexMap<'a, K, V, S>
where
    K: Copy + Hash + Eq,
    V: Copy,
    S: BuildHasher,
{
    /// Creates an empty map that hashes keys with `hasher`.
    ///
    /// # Errors
    ///
    /// As for [`new`](ArenaIndexMap::new).
    pub fn with_hasher(buffer: &'a mut [u8], capacity: usize, hasher: S) -> Result<Self, ArenaError> {
        let map = Self::carve(buffer, capacity, hasher)?;
        map.buckets.fill(0);
        Ok(map)
    }

    /// Creates an empty map over an already zeroed buffer.
    ///
    /// # Errors
    ///
    /// As for [`new`](ArenaIndexMap::new).
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
        Self::carve(buffer, capacity, hasher)
    }

    /// Position of `key`, if present.
    #[must_use]
    pub fn index_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = hash_code(&self.hasher, key);
        self.find_in_bucket(self.indexer.index(hash), hash, key)
    }

    /// Appends `key` unless it is already present.
    pub fn try_add(&mut self, key: K, value: V) -> InsertResult {
        let hash = hash_code(&self.hasher, &key);
        if self.find_in_bucket(self.indexer.index(hash), hash, &key).is_some() {
            return InsertResult::AlreadyExists;
        }
        self.append(hash, key, value)
    }

    /// Appends `key`, or replaces its value in place (keeping its position)
    /// if it is already present.
    pub fn try_insert(&mut self, key: K, value: V) -> InsertResult {
        let hash = hash_code(&self.hasher, &key);
        if let Some(position) = self.find_in_bucket(self.indexer.index(hash), hash, &key) {
            self.entry_mut(position).value = value;
            self.version.bump();
            return InsertResult::Overwritten;
        }
        self.append(hash, key, value)
    }

    /// Inserts `key` at `position`, moving the entries at and after it one
    /// position up. `position == len()` appends.
    ///
    /// Returns [`InsertResult::AlreadyExists`] if the key is present anywhere
    /// (nothing moves), or [`InsertResult::InsufficientCapacity`].
    ///
    /// # Panics
    ///
    /// Panics if `position > len()`.
    #[track_caller]
    pub fn try_add_at(&mut self, position: usize, key: K, value: V) -> InsertResult {
        assert!(
            position <= self.len,
            "insertion index (is {position}) should be <= len (is {})",
            self.len,
        );
        let hash = hash_code(&self.hasher, &key);
        if self.find_in_bucket(self.indexer.index(hash), hash, &key).is_some() {
            return InsertResult::AlreadyExists;
        }
        if self.len == self.entries.len() {
            return InsertResult::InsufficientCapacity;
        }
        self.shift_links(position, Shift::Up);
        self.entries.copy_within(position..self.len, position + 1);
        self.entries[position].write(Entry {
            hash,
            next: Link::NONE,
            key,
            value,
        });
        self.len += 1;
        self.push_into_bucket(position);
        self.version.bump();
        InsertResult::Success
    }

    /// Returns the value for `key`, appending `V::default()` first if the
    /// key is absent. The flag is `true` if the key already existed.
    ///
    /// Returns `None` if the key is absent and the map is full.
    pub fn get_or_add_default(&mut self, key: K) -> Option<(&mut V, bool)>
    where
        V: Default,
    {
        let hash = hash_code(&self.hasher, &key);
        let existing = self.find_in_bucket(self.indexer.index(hash), hash, &key);
        let position = match existing {
            Some(position) => position,
            None => {
                if !self.append(hash, key, V::default()).is_success() {
                    return None;
                }
                self.len - 1
            }
        };
        Some((&mut self.entry_mut(position).value, existing.is_some()))
    }

    /// Replaces the key and value at `position`. The entry keeps its
    /// position; if the key changes, it moves to the new key's chain.
    ///
    /// # Panics
    ///
    /// Panics if `position >= len()`, or if `key` is already stored at a
    /// different position (two entries would share a key).
    #[track_caller]
    pub fn set_at(&mut self, position: usize, key: K, value: V) {
        self.check_position(position);
        if self.entry(position).key == key {
            self.entry_mut(position).value = value;
            self.version.bump();
            return;
        }
        let hash = hash_code(&self.hasher, &key);
        if let Some(other) = self.find_in_bucket(self.indexer.index(hash), hash, &key) {
            panic!("duplicate key: set_at({position}) with a key already stored at position {other}");
        }
        self.remove_from_bucket(position);
        let entry = self.entry_mut(position);
        entry.hash = hash;
        entry.key = key;
        entry.value = value;
        self.push_into_bucket(position);
        self.version.bump();
    }

    /// Returns a reference to the value for `key`.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index_of(key).map(|position| &self.entry(position).value)
    }

    /// Returns the stored key and value for `key`.
    #[must_use]
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index_of(key).map(|position| {
            let entry = self.entry(position);
            (&entry.key, &entry.value)
        })
    }

    /// Returns a mutable reference to the value for `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let position = self.index_of(key)?;
        Some(&mut self.entry_mut(position).value)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index_of(key).is_some()
    }

    /// Removes `key`, closing the gap it leaves. O(n).
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let position = self.index_of(key)?;
        Some(self.remove_at(position).1)
    }
}

impl<K, V, S> Sealed for ArenaIndexMap<'_, K, V, S> {}

impl<K: Copy, V: Copy, S> CursorSource for ArenaIndexMap<'_, K, V, S> {
    type Item<'s>
        = (&'s K, &'s V)
    where
        Self: 's;

    fn version(&self) -> Version {
        self.version
    }

    fn identity(&self) -> usize {
        self.buckets.as_ptr().addr()
    }

    fn next_position(&self, from: usize) -> Option<usize> {
        (from < self.len).then_some(from)
    }

    fn item_at(&self, position: usize) -> Self::Item<'_> {
        self.get_at(position)
    }
}

impl<K, V, S> std::fmt::Debug for ArenaIndexMap<'_, K, V, S>
where
    K: Copy + std::fmt::Debug,
    V: Copy + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'m, K: Copy, V: Copy, S> IntoIterator for &'m ArenaIndexMap<'_, K, V, S> {
    type Item = (&'m K, &'m V);
    type IntoIter = Iter<'m, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'m, K: Copy, V: Copy, S> IntoIterator for &'m mut ArenaIndexMap<'_, K, V, S> {
    type Item = (&'m K, &'m mut V);
    type IntoIter = IterMut<'m, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// Iterator over an [`ArenaIndexMap`] in positional order.
pub struct Iter<'m, K, V> {
    inner: core::slice::Iter<'m, MaybeUninit<Entry<K, V>>>,
}

impl<'m, K, V> Iterator for Iter<'m, K, V> {
    type Item = (&'m K, &'m V);

    fn next(&mut self) -> Option<Self::Item> {
        // SAFETY: the iterator covers positions `0..len` only.
        let entry = unsafe { self.inner.next()?.assume_init_ref() };
        Some((&entry.key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        // SAFETY: the iterator covers positions `0..len` only.
        let entry = unsafe { self.inner.next_back()?.assume_init_ref() };
        Some((&entry.key, &entry.value))
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

/// Iterator over an [`ArenaIndexMap`] in positional order with mutable
/// values.
pub struct IterMut<'m, K, V> {
    inner: core::slice::IterMut<'m, MaybeUninit<Entry<K, V>>>,
}

impl<'m, K, V> Iterator for IterMut<'m, K, V> {
    type Item = (&'m K, &'m mut V);

    fn next(&mut self) -> Option<Self::Item> {
        // SAFETY: the iterator covers positions `0..len` only.
        let entry = unsafe { self.inner.next()?.assume_init_mut() };
        Some((&entry.key, &mut entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        // SAFETY: the iterator covers positions `0..len` only.
        let entry = unsafe { self.inner.next_back()?.assume_init_mut() };
        Some((&entry.key, &mut entry.value))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

#[cfg(test)]
impl<K: Copy + Eq, V: Copy, S> ArenaIndexMap<'_, K, V, S> {
    /// Checks that every position is reachable from exactly the bucket its
    /// hash selects.
    pub(crate) fn assert_consistent(&self) {
        let mut seen = vec![false; self.len];
        for (bucket, &head) in self.buckets.iter().enumerate() {
            let mut link = Link::from_bucket(head);
            while let Some(position) = link.index() {
                assert!(position < self.len, "chain names position {position} past len {}", self.len);
                assert!(!seen[position], "position {position} reached twice");
                seen[position] = true;
                let entry = self.entry(position);
                assert_eq!(self.indexer.index(entry.hash), bucket, "entry chained in wrong bucket");
                link = entry.next;
            }
        }
        assert!(seen.iter().all(|&reached| reached), "position unreachable from buckets");
    }
}
