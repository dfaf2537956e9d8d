/// Mutation stamp of a container.
///
/// Every structural mutation (insert, remove, overwrite, clear) advances the
/// stamp. A [`Cursor`](crate::Cursor) or [`TreeCursor`](crate::TreeCursor)
/// records the stamp it was created at and refuses to step once the source
/// has moved on.
///
/// The counter wraps; a cursor would have to sit idle across exactly
/// 2<sup>32</sup> mutations to miss one.
#[derive(Clone, Copy, Default)]
pub struct Version(u32);

impl Version {
    /// The stamp of a freshly constructed container.
    #[must_use]
    pub const fn initial() -> Self {
        Self(0)
    }

    /// Returns the raw counter value.
    #[must_use]
    pub const fn into_raw(self) -> u32 {
        self.0
    }

    /// Advances the stamp after a structural mutation.
    pub(crate) const fn bump(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }

    /// Panics unless `current` still equals the stamp a cursor captured.
    ///
    /// # Panics
    ///
    /// Panics if the container was mutated after the cursor was created.
    #[track_caller]
    pub(crate) fn ensure_unchanged(self, current: Self) {
        assert!(
            self.0 == current.0,
            "container mutated during enumeration: cursor version {} but container version {}",
            self.0,
            current.0,
        );
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Version {}

impl std::hash::Hash for Version {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl std::fmt::Debug for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Version({})", self.0)
    }
}
