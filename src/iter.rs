use crate::Version;

/// Detached, version-stamped enumeration position over a hash container.
///
/// A `Cursor` does not borrow its container, so the container can be mutated
/// while one is alive. Stepping a cursor after such a mutation panics: the
/// cursor's position no longer means anything. So does handing it a
/// container other than the one that created it. Borrowing iterators
/// (`iter()`, `keys()`, `values()`) cannot observe mutation at all and are
/// the usual way to walk a container.
///
/// Created by [`ArenaHashMap::cursor`](crate::ArenaHashMap::cursor),
/// [`ArenaHashSet::cursor`](crate::ArenaHashSet::cursor) or
/// [`ArenaIndexMap::cursor`](crate::ArenaIndexMap::cursor).
///
/// # Example
///
/// ```
/// use arena_collections::{ArenaHashMap, InsertResult};
///
/// let mut buf = vec![0u8; ArenaHashMap::<u32, u32>::byte_count(8)];
/// let mut map: ArenaHashMap<u32, u32> = ArenaHashMap::new(&mut buf, 8).unwrap();
/// assert_eq!(map.try_add(1, 10), InsertResult::Success);
///
/// let mut cursor = map.cursor();
/// let mut total = 0;
/// while cursor.move_next(&map) {
///     let (_, v) = cursor.current(&map).unwrap();
///     total += v;
/// }
/// assert_eq!(total, 10);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Cursor {
    next: usize,
    current: Option<usize>,
    version: Version,
    source: usize,
}

impl Cursor {
    pub(crate) const fn new(version: Version, source: usize) -> Self {
        Self {
            next: 0,
            current: None,
            version,
            source,
        }
    }

    #[track_caller]
    fn ensure_source<C: CursorSource + ?Sized>(&self, source: &C) {
        assert!(
            self.source == source.identity(),
            "cursor used with a container other than the one that created it"
        );
        self.version.ensure_unchanged(source.version());
    }

    /// Advances to the next entry of `source`. Returns `false` once every
    /// entry has been visited.
    ///
    /// # Panics
    ///
    /// Panics if `source` did not create this cursor or was mutated after it
    /// was created.
    #[track_caller]
    pub fn move_next<C: CursorSource + ?Sized>(&mut self, source: &C) -> bool {
        self.ensure_source(source);
        if let Some(position) = source.next_position(self.next) {
            self.current = Some(position);
            self.next = position + 1;
            true
        } else {
            self.current = None;
            self.next = usize::MAX;
            false
        }
    }

    /// Returns the entry the cursor rests on, or `None` before the first
    /// [`move_next`](Self::move_next) and after the last.
    ///
    /// # Panics
    ///
    /// As for [`move_next`](Self::move_next).
    #[track_caller]
    #[must_use]
    pub fn current<'s, C: CursorSource + ?Sized>(&self, source: &'s C) -> Option<C::Item<'s>> {
        self.ensure_source(source);
        self.current.map(|position| source.item_at(position))
    }

    /// Returns the version this cursor was created at.
    #[must_use]
    pub const fn version(&self) -> Version {
        self.version
    }
}

mod sealed {
    pub trait Sealed {}
}

pub(crate) use sealed::Sealed;

/// Containers a [`Cursor`] can walk.
///
/// Sealed: implemented by the hash containers of this crate only.
pub trait CursorSource: Sealed {
    /// What the cursor yields, borrowed from the container.
    type Item<'s>
    where
        Self: 's;

    /// Current mutation stamp.
    fn version(&self) -> Version;

    /// Address that tells this container's arena apart from every other
    /// live one.
    fn identity(&self) -> usize;

    /// First occupied position at or after `from`.
    fn next_position(&self, from: usize) -> Option<usize>;

    /// Entry at an occupied `position`.
    fn item_at(&self, position: usize) -> Self::Item<'_>;
}
