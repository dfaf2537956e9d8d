/// Outcome of an insert-like operation.
///
/// Expected outcomes (duplicates, a full container) are reported here rather
/// than through panics or `Result`, so callers branch on them in ordinary
/// control flow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[must_use = "an insert may have been rejected"]
pub enum InsertResult {
    /// Never returned by an operation; the `Default` value.
    #[default]
    None,
    /// A new entry was created.
    Success,
    /// The key was already present and nothing changed.
    AlreadyExists,
    /// The key was already present and its value was replaced.
    Overwritten,
    /// No free slot was left; nothing changed.
    InsufficientCapacity,
}

impl InsertResult {
    /// Returns `true` if the value passed in is now stored
    /// ([`Success`](Self::Success) or [`Overwritten`](Self::Overwritten)).
    #[must_use]
    pub const fn is_stored(self) -> bool {
        matches!(self, Self::Success | Self::Overwritten)
    }

    /// Returns `true` if a new entry was created.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}
