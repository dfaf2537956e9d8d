//! Bucket sizing and selection shared by the hash containers.
//!
//! Bucket counts are primes, which keeps clustering low when hash codes
//! share low-order structure. Selecting a bucket uses Lemire's division-free
//! modulus on 64-bit targets: with `m = u64::MAX / d + 1` precomputed,
//! `h % d == ((m * h mod 2^64) * d) >> 64` for every 32-bit `h` and `d`.

use core::hash::{BuildHasher, Hash};

/// Ascending primes covering the common capacities, each roughly 1.2x the
/// previous one.
const PRIMES: [u32; 72] = [
    3, 7, 11, 17, 23, 29, 37, 47, 59, 71, 89, 107, 131, 163, 197, 239, 293, 353, 431, 521, 631,
    761, 919, 1103, 1327, 1597, 1931, 2333, 2801, 3371, 4049, 4861, 5839, 7013, 8419, 10103,
    12143, 14591, 17519, 21023, 25229, 30293, 36353, 43627, 52361, 62851, 75431, 90523, 108631,
    130363, 156437, 187751, 225307, 270371, 324449, 389357, 467237, 560689, 672827, 807403,
    968897, 1162687, 1395263, 1674319, 2009191, 2411033, 2893249, 3471899, 4166287, 4999559,
    5999471, 7199369,
];

/// Primes `p` with `(p - 1) % HASH_PRIME == 0` are skipped past the table.
const HASH_PRIME: u32 = 101;

/// Returns `true` if `candidate` is prime.
#[must_use]
pub(crate) const fn is_prime(candidate: u32) -> bool {
    if candidate & 1 == 0 {
        return candidate == 2;
    }
    let mut divisor = 3u32;
    while divisor <= candidate / divisor {
        if candidate % divisor == 0 {
            return false;
        }
        divisor += 2;
    }
    candidate != 1
}

/// Smallest bucket count that is prime and `>= min`.
///
/// `min` is bounded by [`MAX_CAPACITY`](crate::MAX_CAPACITY), below which a
/// prime is always found.
#[must_use]
pub(crate) fn bucket_count(min: u32) -> u32 {
    if let Some(&prime) = PRIMES.iter().find(|&&prime| prime >= min) {
        return prime;
    }
    let mut candidate = min | 1;
    while candidate < u32::MAX {
        if is_prime(candidate) && (candidate - 1) % HASH_PRIME != 0 {
            return candidate;
        }
        candidate += 2;
    }
    min
}

/// Maps 32-bit hash codes onto a fixed prime number of buckets.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BucketIndexer {
    buckets: u32,
    #[cfg(target_pointer_width = "64")]
    multiplier: u64,
}

impl BucketIndexer {
    /// Precomputes the fast-modulus multiplier for `buckets` (non-zero).
    #[must_use]
    pub(crate) const fn new(buckets: u32) -> Self {
        debug_assert!(buckets > 0);
        Self {
            buckets,
            #[cfg(target_pointer_width = "64")]
            multiplier: u64::MAX / buckets as u64 + 1,
        }
    }

    /// Number of buckets.
    #[must_use]
    pub(crate) const fn buckets(self) -> usize {
        self.buckets as usize
    }

    /// Bucket for `hash`, always `< buckets`.
    #[must_use]
    #[inline]
    pub(crate) const fn index(self, hash: u32) -> usize {
        #[cfg(target_pointer_width = "64")]
        {
            let low = self.multiplier.wrapping_mul(hash as u64);
            ((low as u128 * self.buckets as u128) >> 64) as usize
        }
        #[cfg(not(target_pointer_width = "64"))]
        {
            (hash % self.buckets) as usize
        }
    }
}

/// Hashes `key` and folds the 64-bit result into the 32-bit code stored with
/// each entry.
#[must_use]
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn hash_code<Q, S>(hasher: &S, key: &Q) -> u32
where
    Q: Hash + ?Sized,
    S: BuildHasher,
{
    let full = hasher.hash_one(key);
    (full ^ (full >> 32)) as u32
}
