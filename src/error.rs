//! Construction errors.

/// Errors raised while planning a layout or constructing a container over a
/// buffer.
///
/// Expected runtime outcomes (duplicate keys, full containers) are reported
/// through [`InsertResult`](crate::InsertResult) instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ArenaError {
    /// The buffer handed to a constructor is shorter than the planned
    /// byte count.
    #[error("buffer of {actual} bytes is smaller than the {required} bytes the layout requires")]
    BufferTooSmall {
        /// Bytes the layout needs, alignment slack included.
        required: usize,
        /// Bytes the caller supplied.
        actual: usize,
    },

    /// The requested capacity cannot be laid out: it exceeds
    /// [`MAX_CAPACITY`](crate::MAX_CAPACITY) or the arrays overflow `isize`.
    #[error("capacity {capacity} cannot be laid out in a single arena")]
    CapacityOverflow {
        /// The rejected capacity.
        capacity: usize,
    },
}
