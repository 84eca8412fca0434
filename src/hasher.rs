//! Bucket hashers map a string key onto a bucket index for a given capacity.
//!
//! Unlike [`core::hash::BuildHasher`], a [`BucketHasher`] sees the table's
//! capacity, so it can reduce the hash as it goes. That makes the index a
//! function of the capacity and forces a full rehash whenever the capacity
//! changes.

use core::hash::BuildHasher;

/// The prime multiplier used by [`PositionalHasher`].
const HASH_PRIME: u128 = 31;

/// Maps keys to bucket indices.
///
/// Conforming implementations return a value in `0..capacity` for every
/// non-zero `capacity`. [`HashMap`](crate::HashMap) checks this on every
/// operation and reports a violation as
/// [`Error::BucketOutOfBounds`](crate::Error::BucketOutOfBounds).
pub trait BucketHasher {
    /// Returns the bucket index for `key` in a table of `capacity` buckets.
    fn bucket(&self, key: &str, capacity: usize) -> usize;
}

/// The default bucket hasher.
///
/// Folds over the key's UTF-16 code units, weighting each unit by its
/// 1-based position:
///
/// ```text
/// h = (31 * (h + code(i) * (i + 1))) mod capacity
/// ```
///
/// The reduction happens at every step, not only at the end.
///
/// # Examples
///
/// ```rust
/// use chain_hash::hasher::BucketHasher;
/// use chain_hash::hasher::PositionalHasher;
///
/// // 'a' is 97: (31 * (0 + 97 * 1)) % 16 == 15
/// assert_eq!(PositionalHasher.bucket("a", 16), 15);
/// assert_eq!(PositionalHasher.bucket("", 16), 0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionalHasher;

impl BucketHasher for PositionalHasher {
    fn bucket(&self, key: &str, capacity: usize) -> usize {
        if capacity == 0 {
            return 0;
        }

        let capacity = capacity as u128;
        let mut hash: u128 = 0;
        for (i, unit) in key.encode_utf16().enumerate() {
            // hash < capacity <= 2^64 and unit * position < 2^80, so this
            // never overflows.
            let weighted = u128::from(unit) * (i as u128 + 1);
            hash = (HASH_PRIME * (hash + weighted)) % capacity;
        }

        hash as usize
    }
}

/// Adapts any [`BuildHasher`] into a [`BucketHasher`] by reducing the full
/// 64-bit hash modulo the capacity.
///
/// # Examples
///
/// ```rust
/// # #[cfg(feature = "std")]
/// # {
/// use std::collections::hash_map::RandomState;
///
/// use chain_hash::HashMap;
/// use chain_hash::hasher::Modular;
///
/// let mut map = HashMap::with_hasher(Modular(RandomState::new()));
/// map.set("key", 1);
/// assert_eq!(map.get("key"), Some(&1));
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Modular<S>(pub S);

impl<S> BucketHasher for Modular<S>
where
    S: BuildHasher,
{
    fn bucket(&self, key: &str, capacity: usize) -> usize {
        if capacity == 0 {
            return 0;
        }
        (self.0.hash_one(key) % capacity as u64) as usize
    }
}

/// A bucket hasher backed by `foldhash` with a fixed seed.
#[cfg(feature = "foldhash")]
pub type FoldHasher = Modular<foldhash::fast::FixedState>;
