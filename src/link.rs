/// Compact optional index into an arena-carved slot array.
///
/// Stored as a `u32` with `u32::MAX` reserved as the "no slot" sentinel, so a
/// link costs four bytes where `Option<usize>` would cost sixteen. Used for
/// collision chains, the hash free list, and red-black child pointers.
///
/// Bucket arrays use a different encoding (1-based, `0` = empty) so that a
/// zero-filled buffer reads as "every bucket empty"; [`Link::from_bucket`] and
/// [`Link::to_bucket`] convert between the two.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Link(u32);

impl Link {
    /// The "no slot" sentinel.
    pub(crate) const NONE: Self = Self(u32::MAX);

    /// Creates a link to slot `index`.
    ///
    /// Callers keep `index` below [`MAX_CAPACITY`](crate::MAX_CAPACITY), which
    /// is checked once when a container's layout is planned.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) const fn to(index: usize) -> Self {
        debug_assert!(index < u32::MAX as usize);
        Self(index as u32)
    }

    /// Returns `true` if this is the sentinel.
    #[must_use]
    pub(crate) const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    /// Returns `true` if this points at a slot.
    #[must_use]
    pub(crate) const fn is_some(self) -> bool {
        !self.is_none()
    }

    /// Returns the slot index, or `None` for the sentinel.
    #[must_use]
    pub(crate) const fn index(self) -> Option<usize> {
        if self.is_none() {
            None
        } else {
            Some(self.0 as usize)
        }
    }

    /// Returns the slot index of a link known to be set.
    #[must_use]
    pub(crate) const fn get(self) -> usize {
        debug_assert!(self.is_some(), "dereferenced an empty link");
        self.0 as usize
    }

    /// Decodes a 1-based bucket head (`0` = empty bucket).
    #[must_use]
    pub(crate) const fn from_bucket(head: u32) -> Self {
        if head == 0 { Self::NONE } else { Self(head - 1) }
    }

    /// Encodes as a 1-based bucket head.
    #[must_use]
    pub(crate) const fn to_bucket(self) -> u32 {
        if self.is_none() { 0 } else { self.0 + 1 }
    }
}

impl std::fmt::Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.index() {
            Some(index) => write!(f, "Link({index})"),
            None => f.write_str("Link(NONE)"),
        }
    }
}
