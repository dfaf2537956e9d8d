//! Red-black tree map over pool-allocated nodes.
//!
//! Nodes live in a pool carved from the caller's buffer and refer to
//! each other by `u32` links. Both insertion and removal are top-down (one pass
//! from the root, restructuring on the way down), so no parent pointers or
//! recursion are needed:
//!
//! - insertion splits every 4-node (a black node with two red children) it
//!   passes and fixes a resulting red-red pair at once with a single or double
//!   rotation;
//! - removal turns every 2-node it passes into a 3- or 4-node (recolor, merge
//!   with a 2-node sibling, or borrow from a richer sibling by rotation), so the
//!   node finally unlinked is never the last black node on its path.
//!
//! Traversal uses an explicit `ArrayVec` stack of 64 links: a red-black tree
//! of `n` nodes is at most `2 * log2(n + 1)` high, and pools hold fewer than
//! `u32::MAX` nodes.

use core::borrow::Borrow;
use core::cmp::Ordering;

use arrayvec::ArrayVec;

use crate::layout::{Carver, check_capacity};
use crate::link::Link;
use crate::pool::NodePool;
use crate::{ArenaError, ArenaLayout, InsertResult, Version};

const TREE_HEIGHT_LIMIT: usize = 64;

type Stack = ArrayVec<Link, TREE_HEIGHT_LIMIT>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Color {
    Red,
    Black,
}

#[derive(Clone, Copy)]
struct Node<K, V> {
    key: K,
    value: V,
    left: Link,
    right: Link,
    color: Color,
}

fn plan<K, V>(capacity: usize) -> Result<ArenaLayout, ArenaError> {
    check_capacity(capacity)?;
    NodePool::<Node<K, V>>::extend_layout(ArenaLayout::new(), capacity)
}

/// Fixed-capacity ordered map living in a caller-supplied buffer.
///
/// A red-black tree whose nodes come from a pool of exactly `capacity`
/// slots. When the pool is empty, inserting a new key returns
/// [`InsertResult::InsufficientCapacity`] and leaves the tree untouched.
/// Iteration is in ascending key order.
///
/// # Example
///
/// ```
/// use arena_collections::{ArenaTreeMap, InsertResult};
///
/// let mut buf = vec![0u8; ArenaTreeMap::<i32, ()>::byte_count(7)];
/// let mut tree: ArenaTreeMap<i32, ()> = ArenaTreeMap::new(&mut buf, 7).unwrap();
///
/// for key in [5, 3, 8, 1, 4, 7, 9] {
///     assert_eq!(tree.try_add(key, ()), InsertResult::Success);
/// }
/// assert_eq!(tree.try_add(2, ()), InsertResult::InsufficientCapacity);
///
/// assert_eq!(tree.min(), Some((&1, &())));
/// assert_eq!(tree.max(), Some((&9, &())));
/// assert_eq!(tree.keys().copied().collect::<Vec<_>>(), [1, 3, 4, 5, 7, 8, 9]);
/// ```
pub struct ArenaTreeMap<'a, K, V> {
    pool: NodePool<'a, Node<K, V>>,
    root: Link,
    count: usize,
    version: Version,
}

impl<K, V> ArenaTreeMap<'_, K, V> {
    /// Plans the arena for `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::CapacityOverflow`] if `capacity` cannot be laid
    /// out.
    pub fn layout(capacity: usize) -> Result<ArenaLayout, ArenaError> {
        plan::<K, V>(capacity)
    }

    /// Bytes a buffer needs to hold a tree of `capacity` entries.
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

impl<K, V> ArenaTreeMap<'_, K, V>
where
    K: Copy,
    V: Copy,
{
    /// Returns the number of entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Returns `true` if the tree is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the fixed number of entries the tree can hold.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Returns the current mutation stamp.
    #[must_use]
    pub const fn version(&self) -> Version {
        self.version
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.pool.reset();
        self.root = Link::NONE;
        self.count = 0;
        self.version.bump();
    }

    /// Returns the entry with the smallest key.
    #[must_use]
    pub fn min(&self) -> Option<(&K, &V)> {
        let mut link = self.root;
        while self.left(link).is_some() {
            link = self.left(link);
        }
        self.pair(link)
    }

    /// Returns the entry with the largest key.
    #[must_use]
    pub fn max(&self) -> Option<(&K, &V)> {
        let mut link = self.root;
        while self.right(link).is_some() {
            link = self.right(link);
        }
        self.pair(link)
    }

    /// Iterates over `(key, value)` pairs in ascending key order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut iter = Iter {
            pool: &self.pool,
            stack: Stack::new(),
            remaining: self.count,
        };
        push_left(&self.pool, &mut iter.stack, self.root);
        iter
    }

    /// Iterates over keys in ascending order.
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Iterates over values in ascending key order.
    pub fn values(&self) -> impl ExactSizeIterator<Item = &V> + '_ {
        self.iter().map(|(_, value)| value)
    }

    /// Returns a detached cursor positioned before the smallest key.
    #[must_use]
    pub fn cursor(&self) -> TreeCursor {
        TreeCursor {
            stack: Stack::new(),
            current: Link::NONE,
            started: false,
            version: self.version,
            source: self.pool.identity(),
        }
    }

    fn pair(&self, link: Link) -> Option<(&K, &V)> {
        link.is_some().then(|| {
            let node = self.pool.node(link);
            (&node.key, &node.value)
        })
    }

    // Node accessors. `NONE` reads as a black leaf with no children.

    fn left(&self, link: Link) -> Link {
        if link.is_none() { Link::NONE } else { self.pool.node(link).left }
    }

    fn right(&self, link: Link) -> Link {
        if link.is_none() { Link::NONE } else { self.pool.node(link).right }
    }

    fn is_red(&self, link: Link) -> bool {
        link.is_some() && self.pool.node(link).color == Color::Red
    }

    fn is_black(&self, link: Link) -> bool {
        link.is_some() && self.pool.node(link).color == Color::Black
    }

    fn color(&self, link: Link) -> Color {
        self.pool.node(link).color
    }

    fn set_color(&mut self, link: Link, color: Color) {
        self.pool.node_mut(link).color = color;
    }

    fn set_left(&mut self, link: Link, child: Link) {
        self.pool.node_mut(link).left = child;
    }

    fn set_right(&mut self, link: Link, child: Link) {
        self.pool.node_mut(link).right = child;
    }

    /// Black node with no red child.
    fn is_2node(&self, link: Link) -> bool {
        self.is_black(link) && !self.is_red(self.left(link)) && !self.is_red(self.right(link))
    }

    /// Node with two red children.
    fn is_4node(&self, link: Link) -> bool {
        self.is_red(self.left(link)) && self.is_red(self.right(link))
    }

    fn sibling(&self, parent: Link, child: Link) -> Link {
        if self.left(parent) == child {
            self.right(parent)
        } else {
            self.left(parent)
        }
    }

    fn split_4node(&mut self, link: Link) {
        self.set_color(link, Color::Red);
        self.set_color(self.left(link), Color::Black);
        self.set_color(self.right(link), Color::Black);
    }

    fn merge_2nodes(&mut self, link: Link) {
        self.set_color(link, Color::Black);
        self.set_color(self.left(link), Color::Red);
        self.set_color(self.right(link), Color::Red);
    }

    // Rotations return the new subtree root; the caller re-attaches it.

    fn rotate_left(&mut self, link: Link) -> Link {
        let child = self.right(link);
        self.set_right(link, self.left(child));
        self.set_left(child, link);
        child
    }

    fn rotate_right(&mut self, link: Link) -> Link {
        let child = self.left(link);
        self.set_left(link, self.right(child));
        self.set_right(child, link);
        child
    }

    fn rotate_left_right(&mut self, link: Link) -> Link {
        let child = self.left(link);
        let grand_child = self.right(child);
        self.set_left(link, self.right(grand_child));
        self.set_right(grand_child, link);
        self.set_right(child, self.left(grand_child));
        self.set_left(grand_child, child);
        grand_child
    }

    fn rotate_right_left(&mut self, link: Link) -> Link {
        let child = self.right(link);
        let grand_child = self.left(child);
        self.set_right(link, self.left(grand_child));
        self.set_left(grand_child, link);
        self.set_left(child, self.right(grand_child));
        self.set_right(grand_child, child);
        grand_child
    }

    fn replace_child_or_root(&mut self, parent: Link, child: Link, new_child: Link) {
        if parent.is_none() {
            self.root = new_child;
        } else if self.left(parent) == child {
            self.set_left(parent, new_child);
        } else {
            self.set_right(parent, new_child);
        }
    }

    /// Fixes a red `current` under a red `parent` by rotating at
    /// `grand_parent`. Returns `current`'s parent after the rotation.
    fn insertion_balance(
        &mut self,
        current: Link,
        parent: Link,
        grand_parent: Link,
        great_grand_parent: Link,
    ) -> Link {
        let parent_on_right = self.right(grand_parent) == parent;
        let current_on_right = self.right(parent) == current;
        let (top, new_parent) = if parent_on_right == current_on_right {
            let top = if current_on_right {
                self.rotate_left(grand_parent)
            } else {
                self.rotate_right(grand_parent)
            };
            (top, parent)
        } else {
            let top = if current_on_right {
                self.rotate_left_right(grand_parent)
            } else {
                self.rotate_right_left(grand_parent)
            };
            (top, great_grand_parent)
        };
        self.set_color(grand_parent, Color::Red);
        self.set_color(top, Color::Black);
        self.replace_child_or_root(great_grand_parent, grand_parent, top);
        new_parent
    }

    /// Rotates `parent` so that the 2-node `current` borrows from its 3- or
    /// 4-node `sibling`. Returns the new subtree root.
    fn borrow_from_sibling(&mut self, parent: Link, current: Link, sibling: Link) -> Link {
        let current_is_left = self.left(parent) == current;
        if self.is_red(self.left(sibling)) {
            if current_is_left {
                self.rotate_right_left(parent)
            } else {
                self.set_color(self.left(sibling), Color::Black);
                self.rotate_right(parent)
            }
        } else if current_is_left {
            self.set_color(self.right(sibling), Color::Black);
            self.rotate_left(parent)
        } else {
            self.rotate_left_right(parent)
        }
    }

    /// Puts `successor` (the last node of the removal walk) where `matched`
    /// was.
    fn replace_node(&mut self, matched: Link, parent_of_match: Link, successor: Link, parent_of_successor: Link) {
        let replacement = if successor == matched {
            debug_assert!(self.right(matched).is_none());
            self.left(matched)
        } else {
            debug_assert!(self.left(successor).is_none());
            let successor_right = self.right(successor);
            if successor_right.is_some() {
                self.set_color(successor_right, Color::Black);
            }
            if parent_of_successor != matched {
                self.set_left(parent_of_successor, successor_right);
                self.set_right(successor, self.right(matched));
            }
            self.set_left(successor, self.left(matched));
            successor
        };
        if replacement.is_some() {
            self.set_color(replacement, self.color(matched));
        }
        self.replace_child_or_root(parent_of_match, matched, replacement);
    }
}

impl<'a, K, V> ArenaTreeMap<'a, K, V>
where
    K: Copy + Ord,
    V: Copy,
{
    /// Creates an empty tree of `capacity` entries over `buffer`.
    ///
    /// The buffer's contents are irrelevant; nothing is read before it is
    /// written.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::BufferTooSmall`] if `buffer` is shorter than
    /// `byte_count(capacity)`, or [`ArenaError::CapacityOverflow`].
    pub fn new(buffer: &'a mut [u8], capacity: usize) -> Result<Self, ArenaError> {
        let layout = plan::<K, V>(capacity)?;
        let mut carver = Carver::new(buffer, layout)?;
        Ok(Self {
            pool: NodePool::carve(&mut carver, capacity),
            root: Link::NONE,
            count: 0,
            version: Version::initial(),
        })
    }

    fn find<Q>(&self, key: &Q) -> Link
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut link = self.root;
        while link.is_some() {
            let node = self.pool.node(link);
            link = match key.cmp(<K as Borrow<Q>>::borrow(&node.key)) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return link,
            };
        }
        Link::NONE
    }

    /// Adds `key` unless it is already present.
    pub fn try_add(&mut self, key: K, value: V) -> InsertResult {
        self.insert(key, value, false)
    }

    /// Adds `key`, or replaces its value if it is already present
    /// ([`InsertResult::Overwritten`]; the tree's shape is unchanged).
    pub fn try_insert(&mut self, key: K, value: V) -> InsertResult {
        self.insert(key, value, true)
    }

    fn insert(&mut self, key: K, value: V, overwrite: bool) -> InsertResult {
        if self.pool.available() == 0 {
            // Nothing to rent, so don't restructure on the way down.
            let found = self.find(&key);
            if found.is_none() {
                return InsertResult::InsufficientCapacity;
            }
            return self.found_existing(found, value, overwrite, false);
        }

        let fresh = |color| Node {
            key,
            value,
            left: Link::NONE,
            right: Link::NONE,
            color,
        };

        if self.root.is_none() {
            let Some(root) = self.pool.try_rent(fresh(Color::Black)) else {
                return InsertResult::InsufficientCapacity;
            };
            self.root = root;
            self.count = 1;
            self.version.bump();
            return InsertResult::Success;
        }

        let mut current = self.root;
        let mut parent = Link::NONE;
        let mut grand_parent = Link::NONE;
        let mut great_grand_parent = Link::NONE;
        let mut order = Ordering::Equal;
        let mut restructured = false;

        while current.is_some() {
            order = key.cmp(&self.pool.node(current).key);
            if order == Ordering::Equal {
                // Splits on the way down may have reddened the root.
                self.set_color(self.root, Color::Black);
                return self.found_existing(current, value, overwrite, restructured);
            }
            if self.is_4node(current) {
                self.split_4node(current);
                restructured = true;
                if self.is_red(parent) {
                    parent = self.insertion_balance(current, parent, grand_parent, great_grand_parent);
                }
            }
            great_grand_parent = grand_parent;
            grand_parent = parent;
            parent = current;
            current = if order == Ordering::Less {
                self.left(current)
            } else {
                self.right(current)
            };
        }

        let Some(node) = self.pool.try_rent(fresh(Color::Red)) else {
            return InsertResult::InsufficientCapacity;
        };
        if order == Ordering::Greater {
            self.set_right(parent, node);
        } else {
            self.set_left(parent, node);
        }
        if self.is_red(parent) {
            self.insertion_balance(node, parent, grand_parent, great_grand_parent);
        }
        self.set_color(self.root, Color::Black);
        self.count += 1;
        self.version.bump();
        InsertResult::Success
    }

    fn found_existing(&mut self, link: Link, value: V, overwrite: bool, restructured: bool) -> InsertResult {
        if overwrite {
            self.pool.node_mut(link).value = value;
            self.version.bump();
            InsertResult::Overwritten
        } else {
            if restructured {
                self.version.bump();
            }
            InsertResult::AlreadyExists
        }
    }

    /// Returns a reference to the value for `key`.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.pair(self.find(key)).map(|(_, value)| value)
    }

    /// Returns the stored key and value for `key`.
    #[must_use]
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.pair(self.find(key))
    }

    /// Returns a mutable reference to the value for `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let link = self.find(key);
        link.is_some().then(|| &mut self.pool.node_mut(link).value)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Removes `key` and returns its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes `key` and returns the stored key and value.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if self.root.is_none() {
            return None;
        }

        let mut current = self.root;
        let mut parent = Link::NONE;
        let mut grand_parent = Link::NONE;
        let mut matched = Link::NONE;
        let mut parent_of_match = Link::NONE;
        let mut found = false;
        let mut rotated = false;

        while current.is_some() {
            if self.is_2node(current) {
                if parent.is_none() {
                    self.set_color(current, Color::Red);
                } else {
                    let mut sibling = self.sibling(parent, current);
                    if self.is_red(sibling) {
                        // Parent is a 3-node leaning the wrong way: flip it.
                        debug_assert!(self.is_black(parent));
                        if self.right(parent) == sibling {
                            self.rotate_left(parent);
                        } else {
                            self.rotate_right(parent);
                        }
                        self.set_color(parent, Color::Red);
                        self.set_color(sibling, Color::Black);
                        self.replace_child_or_root(grand_parent, parent, sibling);
                        grand_parent = sibling;
                        if parent == matched {
                            parent_of_match = sibling;
                        }
                        sibling = self.sibling(parent, current);
                        rotated = true;
                    }
                    debug_assert!(self.is_black(sibling));
                    if self.is_2node(sibling) {
                        self.merge_2nodes(parent);
                    } else {
                        let top = self.borrow_from_sibling(parent, current, sibling);
                        self.set_color(top, self.color(parent));
                        self.set_color(parent, Color::Black);
                        self.set_color(current, Color::Red);
                        self.replace_child_or_root(grand_parent, parent, top);
                        if parent == matched {
                            parent_of_match = top;
                        }
                        rotated = true;
                    }
                }
            }

            // Past the match, head for its in-order successor.
            let order = if found {
                Ordering::Less
            } else {
                key.cmp(<K as Borrow<Q>>::borrow(&self.pool.node(current).key))
            };
            if order == Ordering::Equal {
                found = true;
                matched = current;
                parent_of_match = parent;
            }
            grand_parent = parent;
            parent = current;
            current = if order == Ordering::Less {
                self.left(current)
            } else {
                self.right(current)
            };
        }

        let removed = if found {
            self.replace_node(matched, parent_of_match, parent, grand_parent);
            let node = self.pool.release(matched);
            self.count -= 1;
            Some((node.key, node.value))
        } else {
            None
        };
        if self.root.is_some() {
            self.set_color(self.root, Color::Black);
        }
        if found || rotated {
            self.version.bump();
        }
        removed
    }
}

fn push_left<K, V>(pool: &NodePool<'_, Node<K, V>>, stack: &mut Stack, mut link: Link)
where
    K: Copy,
    V: Copy,
{
    while link.is_some() {
        stack.push(link);
        link = pool.node(link).left;
    }
}

impl<K, V> std::fmt::Debug for ArenaTreeMap<'_, K, V>
where
    K: Copy + std::fmt::Debug,
    V: Copy + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'t, K: Copy, V: Copy> IntoIterator for &'t ArenaTreeMap<'_, K, V> {
    type Item = (&'t K, &'t V);
    type IntoIter = Iter<'t, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator over an [`ArenaTreeMap`].
pub struct Iter<'t, K, V> {
    pool: &'t NodePool<'t, Node<K, V>>,
    stack: Stack,
    remaining: usize,
}

impl<'t, K: Copy, V: Copy> Iterator for Iter<'t, K, V> {
    type Item = (&'t K, &'t V);

    fn next(&mut self) -> Option<Self::Item> {
        let link = self.stack.pop()?;
        let pool = self.pool;
        let node = pool.node(link);
        push_left(pool, &mut self.stack, node.right);
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Copy, V: Copy> ExactSizeIterator for Iter<'_, K, V> {}

/// Detached, version-stamped in-order position over an [`ArenaTreeMap`].
///
/// Like [`Cursor`](crate::Cursor) for the hash containers: it does not borrow
/// the tree, and stepping it after the tree was restructured, or over a tree
/// other than the one that created it, panics.
///
/// # Example
///
/// ```
/// use arena_collections::ArenaTreeMap;
///
/// let mut buf = vec![0u8; ArenaTreeMap::<u8, char>::byte_count(3)];
/// let mut tree: ArenaTreeMap<u8, char> = ArenaTreeMap::new(&mut buf, 3).unwrap();
/// let _ = tree.try_add(2, 'b');
/// let _ = tree.try_add(1, 'a');
///
/// let mut cursor = tree.cursor();
/// let mut seen = String::new();
/// while cursor.move_next(&tree) {
///     seen.push(*cursor.current(&tree).unwrap().1);
/// }
/// assert_eq!(seen, "ab");
/// ```
#[derive(Clone, Debug)]
pub struct TreeCursor {
    stack: Stack,
    current: Link,
    started: bool,
    version: Version,
    source: usize,
}

impl TreeCursor {
    #[track_caller]
    fn ensure_source<K: Copy, V: Copy>(&self, tree: &ArenaTreeMap<'_, K, V>) {
        assert!(
            self.source == tree.pool.identity(),
            "cursor used with a container other than the one that created it"
        );
        self.version.ensure_unchanged(tree.version);
    }

    /// Advances to the next key in ascending order. Returns `false` once every
    /// entry has been visited.
    ///
    /// # Panics
    ///
    /// Panics if `tree` did not create this cursor or was mutated after it
    /// was created.
    #[track_caller]
    pub fn move_next<K: Copy, V: Copy>(&mut self, tree: &ArenaTreeMap<'_, K, V>) -> bool {
        self.ensure_source(tree);
        if !self.started {
            self.started = true;
            push_left(&tree.pool, &mut self.stack, tree.root);
        }
        match self.stack.pop() {
            Some(link) => {
                push_left(&tree.pool, &mut self.stack, tree.pool.node(link).right);
                self.current = link;
                true
            }
            None => {
                self.current = Link::NONE;
                false
            }
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
    pub fn current<'t, K: Copy, V: Copy>(&self, tree: &'t ArenaTreeMap<'_, K, V>) -> Option<(&'t K, &'t V)> {
        self.ensure_source(tree);
        tree.pair(self.current)
    }

    /// Returns the version this cursor was created at.
    #[must_use]
    pub const fn version(&self) -> Version {
        self.version
    }
}

#[cfg(test)]
impl<K: Copy + Ord + std::fmt::Debug, V: Copy> ArenaTreeMap<'_, K, V> {
    /// Checks the red-black rules, key order and node accounting.
    pub(crate) fn assert_invariants(&self) {
        assert!(!self.is_red(self.root), "root is red");
        let mut reachable = 0;
        self.check_subtree(self.root, None, None, &mut reachable);
        assert_eq!(reachable, self.count, "reachable nodes disagree with len");
        assert_eq!(self.pool.available() + self.count, self.pool.capacity(), "pool leaked a node");
    }

    /// Returns the black height of the subtree at `link`.
    fn check_subtree(&self, link: Link, low: Option<&K>, high: Option<&K>, reachable: &mut usize) -> usize {
        if link.is_none() {
            return 1;
        }
        *reachable += 1;
        let node = self.pool.node(link);
        if let Some(low) = low {
            assert!(low < &node.key, "{low:?} not below {:?}", node.key);
        }
        if let Some(high) = high {
            assert!(&node.key < high, "{:?} not below {high:?}", node.key);
        }
        if node.color == Color::Red {
            assert!(
                !self.is_red(node.left) && !self.is_red(node.right),
                "red node {:?} has a red child",
                node.key
            );
        }
        let left = self.check_subtree(node.left, low, Some(&node.key), reachable);
        let right = self.check_subtree(node.right, Some(&node.key), high, reachable);
        assert_eq!(left, right, "black height differs under {:?}", node.key);
        left + usize::from(node.color == Color::Black)
    }
}
