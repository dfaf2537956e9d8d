//! Fixed-capacity collections that live inside one caller-supplied buffer.
//!
//! `arena-collections` provides hash maps, hash sets, insertion-ordered maps
//! and red-black tree maps that never allocate. Each container is built over a
//! `&mut [u8]` the caller owns (a stack array, a pooled buffer, a
//! `vec![0u8; n]`) and carves all of its internal arrays out of it.
//!
//! # Containers
//!
//! - [`ArenaHashMap<K, V>`]: chained hash map with O(1) insert, lookup and
//!   removal; freed slots are reused through a free list
//! - [`ArenaHashSet<T>`]: the same engine without values
//! - [`ArenaIndexMap<K, V>`]: hash map that keeps insertion order and
//!   addresses entries by position; removal is O(n)
//! - [`ArenaTreeMap<K, V>`]: red-black tree with ascending iteration
//!
//! # Key properties
//!
//! - **Exact sizing**: `byte_count(capacity)` (or `layout(capacity)`) tells
//!   how many bytes a buffer needs, whatever its start address
//! - **No surprises on full**: inserting into a full container returns
//!   [`InsertResult::InsufficientCapacity`] and changes nothing
//! - **Plain data**: keys and values are `Copy`, so dropping a container or
//!   its buffer needs no cleanup
//! - **Checked enumeration**: detached [`Cursor`]/[`TreeCursor`] values panic
//!   if the container was mutated since they were created
//!
//! # Example
//!
//! ```
//! use arena_collections::{ArenaHashMap, InsertResult};
//!
//! let mut buf = [0u8; 512];
//! assert!(ArenaHashMap::<u32, u32>::byte_count(4) <= buf.len());
//!
//! let mut map: ArenaHashMap<u32, u32> = ArenaHashMap::new(&mut buf, 4).unwrap();
//! for key in 0..4 {
//!     assert_eq!(map.try_add(key, key * 10), InsertResult::Success);
//! }
//! assert_eq!(map.try_add(4, 40), InsertResult::InsufficientCapacity);
//!
//! assert_eq!(map.remove(&2), Some(20));
//! assert_eq!(map.try_add(4, 40), InsertResult::Success);
//! assert_eq!(map.len(), 4);
//! ```

#![deny(missing_docs)]

mod chained;
mod error;
pub mod hash_map;
pub mod hash_set;
mod hashing;
pub mod index_map;
mod iter;
mod layout;
mod link;
mod pool;
mod result;
pub mod tree;
mod version;

pub use error::ArenaError;
pub use hash_map::ArenaHashMap;
pub use hash_set::ArenaHashSet;
pub use index_map::ArenaIndexMap;
pub use iter::{Cursor, CursorSource};
pub use layout::{ArenaLayout, MAX_CAPACITY};
pub use result::InsertResult;
pub use tree::{ArenaTreeMap, TreeCursor};
pub use version::Version;

#[cfg(test)]
mod tests;
