use std::hash::{BuildHasher, Hasher};

use super::*;

/// Buffer of `bytes` bytes filled with a non-zero pattern, so a container
/// that reads memory it never wrote shows up as garbage.
fn dirty_buffer(bytes: usize) -> Vec<u8> {
    vec![0xA5; bytes]
}

/// Hashes every key to the same code: one long collision chain.
#[derive(Clone, Copy, Default)]
struct Collide;

struct CollideHasher;

impl Hasher for CollideHasher {
    fn finish(&self) -> u64 {
        7
    }

    fn write(&mut self, _bytes: &[u8]) {}
}

impl BuildHasher for Collide {
    type Hasher = CollideHasher;

    fn build_hasher(&self) -> CollideHasher {
        CollideHasher
    }
}

mod proptests;
mod tree_map;
