use thiserror::Error;

/// Errors reported by [`HashMap`](crate::HashMap).
///
/// Absent keys are not errors; lookups report them as `None`. The only
/// failure is a broken [`BucketHasher`](crate::hasher::BucketHasher), which
/// indicates a defect rather than a condition callers are expected to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The hasher produced a bucket index outside `0..capacity`.
    #[error("bucket index {index} out of bounds for capacity {capacity}")]
    BucketOutOfBounds {
        /// The index the hasher returned.
        index: usize,
        /// The table's capacity at the time of the lookup.
        capacity: usize,
    },
}
