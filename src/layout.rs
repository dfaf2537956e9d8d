//! Arena layout planning and carving.
//!
//! Every container stores its arrays back to back inside one caller-owned
//! byte buffer. [`ArenaLayout`] plans the arrays in carve order (the same
//! `Layout::extend` chain a single-allocation storage would use) and reports
//! how many bytes a buffer must have. The crate-private `Carver` then splits
//! a buffer into typed slices following that plan.
//!
//! A `&mut [u8]` may start at any address, so the planned byte count carries
//! `align - 1` bytes of slack: whatever the buffer's start address, the
//! aligned start plus the planned size still fits.

use core::alloc::Layout;
use core::mem::{MaybeUninit, align_of, size_of};

use crate::ArenaError;

/// Largest capacity any container accepts.
///
/// Slot indices are stored as `u32` with `u32::MAX` reserved as a sentinel
/// and bucket heads are stored 1-based, so capacities stay well below
/// `u32::MAX`. The bound also keeps the prime search for bucket counts inside
/// `u32`.
pub const MAX_CAPACITY: usize = 0x7FFF_FFC3;

/// Planned memory layout of a container's arrays.
///
/// Obtained from a container's `layout(capacity)` function. The load-bearing
/// number is [`byte_count`](Self::byte_count): a buffer of at least that many
/// bytes is accepted by the matching constructor regardless of its start
/// address.
///
/// # Example
///
/// ```
/// use arena_collections::ArenaHashMap;
///
/// let layout = ArenaHashMap::<u64, u64>::layout(100).unwrap();
/// assert!(layout.byte_count() >= layout.size());
/// assert_eq!(layout.byte_count(), ArenaHashMap::<u64, u64>::byte_count(100));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArenaLayout {
    layout: Layout,
}

impl ArenaLayout {
    /// An empty plan (zero bytes, alignment 1).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            layout: Layout::new::<()>(),
        }
    }

    /// Appends an array of `len` values of `T` to the plan.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::CapacityOverflow`] if the array, or the plan
    /// with it appended, exceeds `isize::MAX` bytes.
    pub fn array<T>(self, len: usize) -> Result<Self, ArenaError> {
        let overflow = ArenaError::CapacityOverflow { capacity: len };
        let array = Layout::array::<T>(len).map_err(|_| overflow)?;
        let (layout, _) = self.layout.extend(array).map_err(|_| overflow)?;
        Ok(Self { layout })
    }

    /// Bytes covered by the arrays once the start is aligned.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.layout.size()
    }

    /// Strictest alignment among the planned arrays.
    #[must_use]
    pub const fn align(&self) -> usize {
        self.layout.align()
    }

    /// Bytes a caller must provide: [`size`](Self::size) plus
    /// `align - 1` bytes of slack for an arbitrarily aligned buffer.
    #[must_use]
    pub const fn byte_count(&self) -> usize {
        self.layout.size() + (self.layout.align() - 1)
    }
}

impl Default for ArenaLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ArenaLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArenaLayout")
            .field("size", &self.size())
            .field("align", &self.align())
            .field("byte_count", &self.byte_count())
            .finish()
    }
}

/// Rejects capacities the `u32` link space cannot address.
pub(crate) const fn check_capacity(capacity: usize) -> Result<(), ArenaError> {
    if capacity > MAX_CAPACITY {
        Err(ArenaError::CapacityOverflow { capacity })
    } else {
        Ok(())
    }
}

/// Splits a caller buffer into the typed slices an [`ArenaLayout`] planned.
///
/// Slices must be taken in the same order the plan appended them. Each slice
/// borrows a disjoint part of the buffer for `'a`.
pub(crate) struct Carver<'a> {
    rest: &'a mut [u8],
}

impl<'a> Carver<'a> {
    /// Aligns the start of `buffer` for `layout` and checks it is long enough.
    pub(crate) fn new(buffer: &'a mut [u8], layout: ArenaLayout) -> Result<Self, ArenaError> {
        let required = layout.byte_count();
        let actual = buffer.len();
        if actual < required {
            return Err(ArenaError::BufferTooSmall { required, actual });
        }
        // At most `align - 1` for a byte pointer, which the slack covers.
        let pad = buffer.as_ptr().align_offset(layout.align());
        if pad.checked_add(layout.size()).is_none_or(|end| end > actual) {
            return Err(ArenaError::BufferTooSmall { required, actual });
        }
        let (_, rest) = buffer.split_at_mut(pad);
        Ok(Self { rest })
    }

    /// Carves `len` uninitialized values of `T`.
    pub(crate) fn take<T>(&mut self, len: usize) -> &'a mut [MaybeUninit<T>] {
        let rest = core::mem::take(&mut self.rest);
        let pad = rest.as_ptr().align_offset(align_of::<T>());
        let (_, rest) = rest.split_at_mut(pad);
        let (chunk, rest) = rest.split_at_mut(len * size_of::<T>());
        self.rest = rest;
        // SAFETY: `chunk` starts at an address aligned for `T` and spans
        // exactly `len * size_of::<T>()` bytes that nothing else borrows for
        // `'a`. `MaybeUninit<T>` has no validity requirement.
        unsafe { core::slice::from_raw_parts_mut(chunk.as_mut_ptr().cast(), len) }
    }

    /// Carves `len` words, keeping whatever bytes the buffer held.
    pub(crate) fn take_words(&mut self, len: usize) -> &'a mut [u32] {
        let words = self.take::<u32>(len);
        // SAFETY: the bytes come from an initialized `&mut [u8]`, and every
        // bit pattern is a valid `u32`.
        unsafe { core::slice::from_raw_parts_mut(words.as_mut_ptr().cast(), words.len()) }
    }
}
