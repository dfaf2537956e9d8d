use core::mem::MaybeUninit;

use crate::layout::Carver;
use crate::link::Link;
use crate::{ArenaError, ArenaLayout};

/// Fixed-capacity slot pool carved out of an arena.
///
/// Free slots are kept on an index stack (`free[..available]`), so renting
/// and releasing are a single pop or push. A fresh pool hands out slot `0`
/// first.
///
/// Slots below `written` have held a node since this pool was carved; only
/// those are ever read.
pub(crate) struct NodePool<'a, T> {
    slots: &'a mut [MaybeUninit<T>],
    free: &'a mut [u32],
    available: usize,
    written: usize,
}

impl<T> NodePool<'_, T> {
    /// Appends the pool's arrays to `layout`.
    pub(crate) fn extend_layout(layout: ArenaLayout, capacity: usize) -> Result<ArenaLayout, ArenaError> {
        layout.array::<T>(capacity)?.array::<u32>(capacity)
    }

    /// Address of the slot array, unique among live pools with slots.
    pub(crate) fn identity(&self) -> usize {
        self.slots.as_ptr().addr()
    }
}

impl<'a, T: Copy> NodePool<'a, T> {
    /// Carves the pool's arrays in the order [`extend_layout`](Self::extend_layout)
    /// planned them, with every slot free.
    pub(crate) fn carve(carver: &mut Carver<'a>, capacity: usize) -> Self {
        let slots = carver.take::<T>(capacity);
        let free = carver.take_words(capacity);
        let mut pool = Self {
            slots,
            free,
            available: 0,
            written: 0,
        };
        pool.reset();
        pool
    }

    /// Returns the number of slots.
    pub(crate) const fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of free slots.
    pub(crate) const fn available(&self) -> usize {
        self.available
    }

    /// Marks every slot free. Rented links become dangling.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn reset(&mut self) {
        let capacity = self.free.len();
        // Highest index at the bottom, so pops hand out 0, 1, 2, ...
        for (depth, word) in self.free.iter_mut().enumerate() {
            *word = (capacity - 1 - depth) as u32;
        }
        self.available = capacity;
    }

    /// Moves `node` into a free slot, or returns `None` if the pool is empty.
    pub(crate) fn try_rent(&mut self, node: T) -> Option<Link> {
        self.available = self.available.checked_sub(1)?;
        let index = self.free[self.available] as usize;
        self.slots[index].write(node);
        self.written = self.written.max(index + 1);
        Some(Link::to(index))
    }

    /// Frees the slot behind `link` and returns the node it held.
    #[allow(clippy::cast_possible_truncation)]
    #[track_caller]
    pub(crate) fn release(&mut self, link: Link) -> T {
        let index = self.written_index(link);
        debug_assert!(self.available < self.free.len(), "released into a full pool");
        // SAFETY: slots below `written` hold a node written by `try_rent`.
        let node = unsafe { self.slots[index].assume_init_read() };
        self.free[self.available] = index as u32;
        self.available += 1;
        node
    }

    /// Returns the node behind a rented `link`.
    ///
    /// # Panics
    ///
    /// Panics if `link` names a slot this pool has never written, which only
    /// a link carried over from another pool can do.
    #[inline]
    #[track_caller]
    pub(crate) fn node(&self, link: Link) -> &T {
        let index = self.written_index(link);
        // SAFETY: slots below `written` were written by `try_rent` and are
        // never de-initialized.
        unsafe { self.slots[index].assume_init_ref() }
    }

    /// Returns the node behind a rented `link` mutably.
    #[inline]
    #[track_caller]
    pub(crate) fn node_mut(&mut self, link: Link) -> &mut T {
        let index = self.written_index(link);
        // SAFETY: as in `node`.
        unsafe { self.slots[index].assume_init_mut() }
    }

    #[inline]
    #[track_caller]
    fn written_index(&self, link: Link) -> usize {
        let index = link.get();
        assert!(
            index < self.written,
            "link {index} names a slot this pool never handed out"
        );
        index
    }
}
