//! Chained hash engine shared by [`ArenaHashMap`](crate::ArenaHashMap) and
//! [`ArenaHashSet`](crate::ArenaHashSet).
//!
//! Two arrays are carved from the arena:
//!
//! ```text
//! buckets: [u32; prime >= capacity]   1-based head of each chain, 0 = empty
//! entries: [Slot<K, V>; capacity]     live entries and freed slots
//! ```
//!
//! Slots below `count` (the high-water mark) are initialized; slots above it
//! have never been touched. A removed slot becomes `Slot::Free` and is pushed
//! onto the free list, which is threaded through the freed slots themselves,
//! so reuse is O(1) without extra storage.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::mem::MaybeUninit;

use crate::hashing::{BucketIndexer, bucket_count, hash_code};
use crate::layout::{ArenaLayout, Carver, check_capacity};
use crate::link::Link;
use crate::{ArenaError, InsertResult, Version};

/// One entry slot.
///
/// A live slot with `next == NONE` ends its collision chain; a free slot with
/// `next_free == NONE` ends the free list.
#[derive(Clone, Copy)]
pub(crate) enum Slot<K, V> {
    Live {
        hash: u32,
        next: Link,
        key: K,
        value: V,
    },
    Free {
        next_free: Link,
    },
}

/// What an insert does when the key is already present.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Policy {
    /// Leave the entry alone, report `AlreadyExists`.
    RejectDuplicate,
    /// Replace the value, report `Overwritten`.
    Overwrite,
    /// Leave the entry alone, hand back its slot.
    GetOrAdd,
}

/// Bucket count and layout for `capacity` entries.
pub(crate) fn plan<K, V>(capacity: usize) -> Result<(ArenaLayout, u32), ArenaError> {
    check_capacity(capacity)?;
    let min = u32::try_from(capacity).map_err(|_| ArenaError::CapacityOverflow { capacity })?;
    let buckets = bucket_count(min);
    let layout = ArenaLayout::new()
        .array::<u32>(buckets as usize)?
        .array::<Slot<K, V>>(capacity)?;
    Ok((layout, buckets))
}

#[cold]
#[track_caller]
pub(crate) fn corrupted() -> ! {
    panic!(
        "hash chain corrupted: walk hit a cycle or a freed slot \
         (concurrent mutation is not supported)"
    )
}

pub(crate) struct ChainedTable<'a, K, V, S> {
    buckets: &'a mut [u32],
    entries: &'a mut [MaybeUninit<Slot<K, V>>],
    indexer: BucketIndexer,
    /// High-water mark: slots `0..count` are initialized.
    count: usize,
    free_list: Link,
    free_count: usize,
    version: Version,
    hasher: S,
}

impl<'a, K, V, S> ChainedTable<'a, K, V, S>
where
    K: Copy,
    V: Copy,
{
    /// Carves the table and zeroes its buckets.
    pub(crate) fn new(buffer: &'a mut [u8], capacity: usize, hasher: S) -> Result<Self, ArenaError> {
        let table = Self::carve(buffer, capacity, hasher)?;
        table.buckets.fill(0);
        Ok(table)
    }

    /// Carves the table, trusting the bucket bytes to be zero already.
    ///
    /// # Safety
    ///
    /// The bucket region of `buffer` must be zero. A non-zero head names a
    /// slot that has never been written and reading it is undefined
    /// behavior.
    pub(crate) unsafe fn from_zeroed(
        buffer: &'a mut [u8],
        capacity: usize,
        hasher: S,
    ) -> Result<Self, ArenaError> {
        Self::carve(buffer, capacity, hasher)
    }

    fn carve(buffer: &'a mut [u8], capacity: usize, hasher: S) -> Result<Self, ArenaError> {
        let (layout, buckets) = plan::<K, V>(capacity)?;
        let mut carver = Carver::new(buffer, layout)?;
        let bucket_words = carver.take_words(buckets as usize);
        let entries = carver.take::<Slot<K, V>>(capacity);
        Ok(Self {
            buckets: bucket_words,
            entries,
            indexer: BucketIndexer::new(buckets),
            count: 0,
            free_list: Link::NONE,
            free_count: 0,
            version: Version::initial(),
            hasher,
        })
    }

    pub(crate) const fn len(&self) -> usize {
        self.count - self.free_count
    }

    pub(crate) const fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub(crate) const fn bucket_count(&self) -> usize {
        self.indexer.buckets()
    }

    pub(crate) const fn version(&self) -> Version {
        self.version
    }

    pub(crate) const fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Address of the bucket array, unique among live tables.
    pub(crate) fn identity(&self) -> usize {
        self.buckets.as_ptr().addr()
    }

    #[inline]
    #[track_caller]
    fn slot(&self, index: usize) -> &Slot<K, V> {
        assert!(index < self.count, "slot {index} above high-water mark {}", self.count);
        // SAFETY: every slot below the high-water mark was written when
        // `count` first passed it, and slots are only ever overwritten.
        unsafe { self.entries[index].assume_init_ref() }
    }

    #[inline]
    #[track_caller]
    fn slot_mut(&mut self, index: usize) -> &mut Slot<K, V> {
        assert!(index < self.count, "slot {index} above high-water mark {}", self.count);
        // SAFETY: as in `slot`.
        unsafe { self.entries[index].assume_init_mut() }
    }

    /// Key and value of a live slot.
    pub(crate) fn entry(&self, index: usize) -> (&K, &V) {
        match self.slot(index) {
            Slot::Live { key, value, .. } => (key, value),
            Slot::Free { .. } => corrupted(),
        }
    }

    /// Key and mutable value of a live slot.
    pub(crate) fn entry_mut(&mut self, index: usize) -> (&K, &mut V) {
        match self.slot_mut(index) {
            Slot::Live { key, value, .. } => (&*key, value),
            Slot::Free { .. } => corrupted(),
        }
    }

    /// First live slot at or after `from`.
    pub(crate) fn next_live(&self, from: usize) -> Option<usize> {
        (from..self.count).find(|&index| matches!(self.slot(index), Slot::Live { .. }))
    }

    /// Walks one chain looking for `key`.
    fn find_in_bucket<Q>(&self, bucket: usize, hash: u32, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let mut link = Link::from_bucket(self.buckets[bucket]);
        let mut walked = 0usize;
        while let Some(index) = link.index() {
            match self.slot(index) {
                Slot::Live {
                    hash: entry_hash,
                    next,
                    key: entry_key,
                    ..
                } => {
                    if *entry_hash == hash && <K as Borrow<Q>>::borrow(entry_key) == key {
                        return Some(index);
                    }
                    link = *next;
                }
                Slot::Free { .. } => corrupted(),
            }
            walked += 1;
            if walked > self.entries.len() {
                corrupted();
            }
        }
        None
    }

    /// Pops the free list, or extends the high-water mark.
    fn claim_slot(&mut self) -> Option<usize> {
        if let Some(index) = self.free_list.index() {
            let Slot::Free { next_free } = *self.slot(index) else {
                corrupted()
            };
            self.free_list = next_free;
            self.free_count -= 1;
            Some(index)
        } else if self.count < self.entries.len() {
            let index = self.count;
            self.count += 1;
            Some(index)
        } else {
            None
        }
    }

    fn unlink(&mut self, bucket: usize, previous: Link, next: Link) {
        match previous.index() {
            None => self.buckets[bucket] = next.to_bucket(),
            Some(previous) => match self.slot_mut(previous) {
                Slot::Live { next: link, .. } => *link = next,
                Slot::Free { .. } => corrupted(),
            },
        }
    }
}

impl<K, V, S> ChainedTable<'_, K, V, S>
where
    K: Copy + Hash + Eq,
    V: Copy,
    S: BuildHasher,
{
    /// Slot holding `key`, if present.
    pub(crate) fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = hash_code(&self.hasher, key);
        self.find_in_bucket(self.indexer.index(hash), hash, key)
    }

    /// Inserts under `policy`. Returns the outcome and, unless the table is
    /// full, the slot now holding `key`.
    pub(crate) fn insert(&mut self, key: K, value: V, policy: Policy) -> (InsertResult, Option<usize>) {
        let hash = hash_code(&self.hasher, &key);
        let bucket = self.indexer.index(hash);

        if let Some(index) = self.find_in_bucket(bucket, hash, &key) {
            return match policy {
                Policy::Overwrite => {
                    *self.entry_mut(index).1 = value;
                    self.version.bump();
                    (InsertResult::Overwritten, Some(index))
                }
                Policy::RejectDuplicate | Policy::GetOrAdd => {
                    (InsertResult::AlreadyExists, Some(index))
                }
            };
        }

        let Some(index) = self.claim_slot() else {
            return (InsertResult::InsufficientCapacity, None);
        };
        let next = Link::from_bucket(self.buckets[bucket]);
        self.entries[index].write(Slot::Live {
            hash,
            next,
            key,
            value,
        });
        self.buckets[bucket] = Link::to(index).to_bucket();
        self.version.bump();
        (InsertResult::Success, Some(index))
    }

    /// Unlinks `key` and pushes its slot onto the free list.
    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = hash_code(&self.hasher, key);
        let bucket = self.indexer.index(hash);
        let mut previous = Link::NONE;
        let mut link = Link::from_bucket(self.buckets[bucket]);
        let mut walked = 0usize;

        while let Some(index) = link.index() {
            let Slot::Live {
                hash: entry_hash,
                next,
                key: entry_key,
                value,
            } = *self.slot(index)
            else {
                corrupted()
            };

            if entry_hash == hash && <K as Borrow<Q>>::borrow(&entry_key) == key {
                self.unlink(bucket, previous, next);
                self.entries[index].write(Slot::Free {
                    next_free: self.free_list,
                });
                self.free_list = link;
                self.free_count += 1;
                self.version.bump();
                return Some((entry_key, value));
            }

            previous = link;
            link = next;
            walked += 1;
            if walked > self.entries.len() {
                corrupted();
            }
        }
        None
    }
}

impl<K, V, S> ChainedTable<'_, K, V, S> {
    /// Forgets every entry. Slots are reclaimed from the start again.
    pub(crate) fn clear(&mut self) {
        self.buckets.fill(0);
        self.count = 0;
        self.free_list = Link::NONE;
        self.free_count = 0;
        self.version.bump();
    }

    pub(crate) fn entries(&self) -> Entries<'_, K, V> {
        Entries {
            slots: self.entries[..self.count].iter(),
            remaining: self.count - self.free_count,
        }
    }

    pub(crate) fn entries_mut(&mut self) -> EntriesMut<'_, K, V> {
        EntriesMut {
            remaining: self.count - self.free_count,
            slots: self.entries[..self.count].iter_mut(),
        }
    }

    /// Length of the free list, for invariant checks.
    #[cfg(test)]
    pub(crate) fn free_list_len(&self) -> usize {
        let mut len = 0;
        let mut link = self.free_list;
        while let Some(index) = link.index() {
            // SAFETY: freed slots lie below the high-water mark.
            match unsafe { self.entries[index].assume_init_ref() } {
                Slot::Free { next_free } => link = *next_free,
                Slot::Live { .. } => corrupted(),
            }
            len += 1;
            assert!(len <= self.count, "free list longer than high-water mark");
        }
        assert_eq!(len, self.free_count, "free list length disagrees with free count");
        len
    }

    /// Sum of every chain's length, for invariant checks.
    #[cfg(test)]
    pub(crate) fn chained_len(&self) -> usize {
        let mut total = 0;
        for &head in self.buckets.iter() {
            let mut link = Link::from_bucket(head);
            while let Some(index) = link.index() {
                assert!(index < self.count, "chain points above high-water mark");
                // SAFETY: checked against the high-water mark above.
                match unsafe { self.entries[index].assume_init_ref() } {
                    Slot::Live { next, .. } => link = *next,
                    Slot::Free { .. } => corrupted(),
                }
                total += 1;
                assert!(total <= self.count, "chains longer than high-water mark");
            }
        }
        total
    }
}

/// Live entries in slot order.
pub(crate) struct Entries<'t, K, V> {
    slots: core::slice::Iter<'t, MaybeUninit<Slot<K, V>>>,
    remaining: usize,
}

impl<'t, K, V> Iterator for Entries<'t, K, V> {
    type Item = (&'t K, &'t V);

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            // SAFETY: the iterator covers slots below the high-water mark only.
            if let Slot::Live { key, value, .. } = unsafe { slot.assume_init_ref() } {
                self.remaining -= 1;
                return Some((key, value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Entries<'_, K, V> {}

impl<K, V> Clone for Entries<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            remaining: self.remaining,
        }
    }
}

/// Live entries in slot order, values mutable.
pub(crate) struct EntriesMut<'t, K, V> {
    slots: core::slice::IterMut<'t, MaybeUninit<Slot<K, V>>>,
    remaining: usize,
}

impl<'t, K, V> Iterator for EntriesMut<'t, K, V> {
    type Item = (&'t K, &'t mut V);

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            // SAFETY: the iterator covers slots below the high-water mark only.
            if let Slot::Live { key, value, .. } = unsafe { slot.assume_init_mut() } {
                self.remaining -= 1;
                return Some((&*key, value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for EntriesMut<'_, K, V> {}
