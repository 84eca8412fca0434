#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod chain;

mod error;

/// A string-keyed hash map using separate chaining.
///
/// This module provides a `HashMap` whose buckets are lazily created
/// [`Chain`](crate::chain::Chain)s and whose bucket indices come from a
/// capacity-aware [`BucketHasher`](crate::hasher::BucketHasher).
pub mod hash_map;

pub mod hasher;

pub use chain::Chain;
pub use error::Error;
pub use hash_map::HashMap;
pub use hasher::BucketHasher;
pub use hasher::PositionalHasher;
