use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::chain;
use crate::chain::Chain;
use crate::error::Error;
use crate::hasher::BucketHasher;
use crate::hasher::PositionalHasher;

/// The number of buckets a table created with [`HashMap::new`] starts with.
pub const DEFAULT_CAPACITY: usize = 16;

/// The ratio of stored keys to buckets that, once exceeded, doubles the
/// table.
pub const LOAD_FACTOR_THRESHOLD: f64 = 0.75;

/// `occupied / capacity > 0.75` in integer arithmetic.
#[inline(always)]
fn exceeds_load_factor(occupied: usize, capacity: usize) -> bool {
    occupied as u128 * 4 > capacity as u128 * 3
}

type Bucket<V> = Option<Chain<(String, V)>>;

fn empty_buckets<V>(capacity: usize) -> Vec<Bucket<V>> {
    let mut buckets = Vec::with_capacity(capacity);
    buckets.resize_with(capacity, || None);
    buckets
}

/// Panics with the error's message. Reaching this means the hasher is broken.
#[inline]
#[track_caller]
fn in_bounds<T>(result: Result<T, Error>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("{err}"),
    }
}

/// Chain-length statistics for a [`HashMap`].
#[cfg(feature = "stats")]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of keys currently in the map
    pub populated: usize,
    /// Number of buckets
    pub capacity: usize,
    /// Buckets holding a chain, including chains emptied by removals
    pub allocated_chains: usize,
    /// Buckets holding at least one entry
    pub used_buckets: usize,
    /// Length of the longest chain
    pub longest_chain: usize,
    /// Load factor (populated / capacity)
    pub load_factor: f64,
    /// Bucket utilization (used_buckets / capacity)
    pub bucket_utilization: f64,
}

#[cfg(feature = "stats")]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Map Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.populated,
            self.capacity,
            self.load_factor * 100.0
        );
        println!(
            "Bucket Usage: {}/{} ({:.2}% utilization)",
            self.used_buckets,
            self.capacity,
            self.bucket_utilization * 100.0
        );
        println!("Allocated Chains: {}", self.allocated_chains);
        println!("Longest Chain: {}", self.longest_chain);
    }
}

/// A histogram of chain lengths, indexed by length.
///
/// `counts[n]` is the number of buckets whose chain holds `n` entries.
/// Buckets without a chain count as length 0.
#[cfg(feature = "stats")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainHistogram {
    /// Bucket counts per chain length.
    pub counts: Vec<usize>,
}

#[cfg(feature = "stats")]
impl ChainHistogram {
    /// Pretty-prints the histogram horizontally using stdout.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        let max = self.counts.iter().copied().max().unwrap_or(0);
        if max == 0 {
            println!("chain histogram: empty");
            return;
        }

        let max_bar = 60usize;
        let total_units = max_bar * 8;
        println!("chain histogram ({} buckets):", self.counts.iter().sum::<usize>());

        let make_bar = |count: usize| -> String {
            if count == 0 {
                return String::new();
            }
            let units = ((count as u128 * total_units as u128).div_ceil(max as u128)) as usize;
            let mut bar = "█".repeat(units / 8);
            let partial = ['▏', '▎', '▍', '▌', '▋', '▊', '▉'];
            if units % 8 > 0 {
                bar.push(partial[units % 8 - 1]);
            }
            bar
        };

        for (len, &count) in self.counts.iter().enumerate() {
            println!("{:>3} | {} ({})", len, make_bar(count), count);
        }
    }
}

/// A string-keyed hash map using separate chaining.
///
/// `HashMap<V, H>` stores `(String, V)` entries in a vector of buckets. Each
/// bucket is either empty or holds a [`Chain`] of every entry whose key hashed
/// to it. The bucket index comes from a [`BucketHasher`] `H`, which sees the
/// current capacity and reduces the key against it.
///
/// The table starts with [`DEFAULT_CAPACITY`] buckets. Whenever inserting a
/// new key pushes `len / capacity` above [`LOAD_FACTOR_THRESHOLD`], the
/// capacity doubles and every entry is reinserted, since each key's bucket
/// index depends on the capacity. Removing keys never shrinks the table.
///
/// # Examples
///
/// ```rust
/// use chain_hash::HashMap;
///
/// let mut map = HashMap::new();
/// for (key, color) in [("apple", "red"), ("banana", "yellow"), ("carrot", "orange")] {
///     map.set(key, color);
/// }
///
/// assert_eq!(map.get("banana"), Some(&"yellow"));
/// assert_eq!(map.len(), 3);
/// assert_eq!(map.capacity(), 16);
/// ```
pub struct HashMap<V, H = PositionalHasher> {
    buckets: Vec<Bucket<V>>,
    capacity: usize,
    occupied: usize,
    hasher: H,
}

impl<V, H> Debug for HashMap<V, H>
where
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<V, H> Clone for HashMap<V, H>
where
    V: Clone,
    H: Clone,
{
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
            capacity: self.capacity,
            occupied: self.occupied,
            hasher: self.hasher.clone(),
        }
    }
}

impl<V> HashMap<V, PositionalHasher> {
    /// Creates an empty map with [`DEFAULT_CAPACITY`] buckets and the
    /// [`PositionalHasher`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::HashMap;
    ///
    /// let map: HashMap<i32> = HashMap::new();
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), 16);
    /// ```
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an empty map with `capacity` buckets and the
    /// [`PositionalHasher`].
    ///
    /// A capacity of zero is raised to one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::HashMap;
    ///
    /// let map: HashMap<i32> = HashMap::with_capacity(4);
    /// assert_eq!(map.capacity(), 4);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, PositionalHasher)
    }
}

impl<V> Default for HashMap<V, PositionalHasher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, H> HashMap<V, H>
where
    H: BucketHasher,
{
    /// Creates an empty map with [`DEFAULT_CAPACITY`] buckets and the given
    /// hasher.
    pub fn with_hasher(hasher: H) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, hasher)
    }

    /// Creates an empty map with `capacity` buckets and the given hasher.
    ///
    /// A capacity of zero is raised to one.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: H) -> Self {
        let capacity = capacity.max(1);
        Self {
            buckets: empty_buckets(capacity),
            capacity,
            occupied: 0,
            hasher,
        }
    }

    /// Returns the bucket index of `key` at the current capacity.
    ///
    /// The index changes with the capacity.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::HashMap;
    ///
    /// let map: HashMap<()> = HashMap::new();
    /// assert_eq!(map.hash("a"), 15);
    /// ```
    pub fn hash(&self, key: &str) -> usize {
        self.hasher.bucket(key, self.capacity)
    }

    /// Hashes `key` and verifies the index addresses an existing bucket.
    fn bucket_index(&self, key: &str) -> Result<usize, Error> {
        debug_assert_eq!(self.buckets.len(), self.capacity);

        let index = self.hash(key);
        if index >= self.capacity {
            return Err(Error::BucketOutOfBounds {
                index,
                capacity: self.capacity,
            });
        }
        Ok(index)
    }

    /// Inserts or overwrites the value for `key`, returning the previous
    /// value if there was one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BucketOutOfBounds`] if the hasher maps `key`, or any
    /// key reinserted by a resulting rehash, outside the table. In the
    /// rehash case `key` has already been stored and the table keeps its
    /// old capacity with every entry intact.
    pub fn try_set(&mut self, key: impl Into<String>, value: V) -> Result<Option<V>, Error> {
        let key = key.into();
        let index = self.bucket_index(&key)?;

        let bucket = &mut self.buckets[index];
        match bucket {
            Some(chain) => {
                if let Some(entry) = chain.search_mut(|(k, _)| *k == key) {
                    return Ok(Some(core::mem::replace(&mut entry.1, value)));
                }
                chain.append((key, value));
            }
            None => {
                log::trace!("creating chain for bucket {index}");
                *bucket = Some(Chain::singleton((key, value)));
            }
        }

        self.occupied += 1;
        if exceeds_load_factor(self.occupied, self.capacity) {
            self.rehash()?;
        }

        Ok(None)
    }

    /// Inserts or overwrites the value for `key`, returning the previous
    /// value if there was one.
    ///
    /// Overwriting never changes the capacity. Adding a key may double it.
    ///
    /// # Panics
    ///
    /// Panics if the hasher returns an index outside the table. See
    /// [`HashMap::try_set`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// assert_eq!(map.set("Steve", "Carell"), None);
    /// assert_eq!(map.set("Adam", "Sandler"), None);
    /// assert_eq!(map.set("Steve", "Johnson"), Some("Carell"));
    /// assert_eq!(map.get("Steve"), Some(&"Johnson"));
    /// assert_eq!(map.len(), 2);
    /// ```
    #[track_caller]
    pub fn set(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        in_bounds(self.try_set(key, value))
    }

    /// Returns the value for `key`, or `None` if it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BucketOutOfBounds`] if the hasher maps `key` outside
    /// the table.
    pub fn try_get(&self, key: &str) -> Result<Option<&V>, Error> {
        let index = self.bucket_index(key)?;
        Ok(self.buckets[index]
            .as_ref()
            .and_then(|chain| chain.search(|(k, _)| k == key))
            .map(|(_, v)| v))
    }

    /// Returns the value for `key`, or `None` if it is absent.
    ///
    /// # Panics
    ///
    /// Panics if the hasher returns an index outside the table.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.set("kite", "pink");
    /// assert_eq!(map.get("kite"), Some(&"pink"));
    /// assert_eq!(map.get("lion"), None);
    /// ```
    #[track_caller]
    pub fn get(&self, key: &str) -> Option<&V> {
        in_bounds(self.try_get(key))
    }

    /// Returns a mutable reference to the value for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BucketOutOfBounds`] if the hasher maps `key` outside
    /// the table.
    pub fn try_get_mut(&mut self, key: &str) -> Result<Option<&mut V>, Error> {
        let index = self.bucket_index(key)?;
        Ok(self.buckets[index]
            .as_mut()
            .and_then(|chain| chain.search_mut(|(k, _)| k == key))
            .map(|(_, v)| v))
    }

    /// Returns a mutable reference to the value for `key`.
    ///
    /// # Panics
    ///
    /// Panics if the hasher returns an index outside the table.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.set("count", 1);
    /// if let Some(count) = map.get_mut("count") {
    ///     *count += 1;
    /// }
    /// assert_eq!(map.get("count"), Some(&2));
    /// ```
    #[track_caller]
    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        in_bounds(self.try_get_mut(key))
    }

    /// Returns `true` if the map holds `key`.
    ///
    /// # Panics
    ///
    /// Panics if the hasher returns an index outside the table.
    #[track_caller]
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Removes `key`, returning the stored key and value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BucketOutOfBounds`] if the hasher maps `key` outside
    /// the table.
    pub fn try_remove_entry(&mut self, key: &str) -> Result<Option<(String, V)>, Error> {
        let index = self.bucket_index(key)?;
        let Some(chain) = self.buckets[index].as_mut() else {
            return Ok(None);
        };
        let Some(position) = chain.position(|(k, _)| k == key) else {
            return Ok(None);
        };

        let removed = chain.remove_at(position);
        if removed.is_some() {
            self.occupied -= 1;
        }
        Ok(removed)
    }

    /// Removes `key`, returning the stored key and value.
    ///
    /// # Panics
    ///
    /// Panics if the hasher returns an index outside the table.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.set("hat", "black");
    /// assert_eq!(map.remove_entry("hat"), Some(("hat".to_string(), "black")));
    /// assert_eq!(map.remove_entry("hat"), None);
    /// ```
    #[track_caller]
    pub fn remove_entry(&mut self, key: &str) -> Option<(String, V)> {
        in_bounds(self.try_remove_entry(key))
    }

    /// Removes `key`, returning whether it was present.
    ///
    /// The capacity never shrinks.
    ///
    /// # Panics
    ///
    /// Panics if the hasher returns an index outside the table.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.set("a", 1);
    /// assert!(map.remove("a"));
    /// assert!(!map.remove("a"));
    /// assert!(!map.has("a"));
    /// ```
    #[track_caller]
    pub fn remove(&mut self, key: &str) -> bool {
        self.remove_entry(key).is_some()
    }

    /// Doubles the capacity and reinserts every entry against it.
    ///
    /// Every new index is computed before any entry moves, so a failure
    /// leaves the table at its old capacity with all entries in place.
    #[cold]
    fn rehash(&mut self) -> Result<(), Error> {
        let previous = self.capacity;
        let capacity = previous.checked_mul(2).expect("capacity overflow");

        let mut indices = Vec::with_capacity(self.occupied);
        for (key, _) in self.iter() {
            let index = self.hasher.bucket(key, capacity);
            if index >= capacity {
                return Err(Error::BucketOutOfBounds { index, capacity });
            }
            indices.push(index);
        }

        log::debug!(
            "rehashing {} entries: capacity {previous} -> {capacity}",
            indices.len()
        );

        let mut buckets = empty_buckets(capacity);
        let entries = core::mem::take(&mut self.buckets).into_iter().flatten().flatten();
        for (entry, index) in entries.zip(indices) {
            match &mut buckets[index] {
                Some(chain) => chain.append(entry),
                slot @ None => *slot = Some(Chain::singleton(entry)),
            }
        }

        self.buckets = buckets;
        self.capacity = capacity;
        debug_assert_eq!(self.occupied, self.length());
        Ok(())
    }
}

impl<V, H> HashMap<V, H> {
    /// Returns the number of keys in the map.
    ///
    /// This is the counter the load factor is computed from. See
    /// [`HashMap::length`] for a count by traversal.
    pub fn len(&self) -> usize {
        self.occupied
    }

    /// Returns `true` if the map holds no keys.
    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// Counts the entries by walking every bucket.
    ///
    /// Always equal to [`HashMap::len`]; useful to cross-check the counter.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.set("a", 1);
    /// map.set("b", 2);
    /// map.set("a", 3);
    /// assert_eq!(map.length(), 2);
    /// assert_eq!(map.length(), map.len());
    /// ```
    pub fn length(&self) -> usize {
        self.buckets.iter().flatten().map(Chain::size).sum()
    }

    /// Returns the number of buckets.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `len / capacity`.
    pub fn load_factor(&self) -> f64 {
        self.occupied as f64 / self.capacity as f64
    }

    /// Removes every entry. The capacity is kept.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::with_capacity(4);
    /// for key in ["a", "b", "c", "d"] {
    ///     map.set(key, ());
    /// }
    /// let capacity = map.capacity();
    ///
    /// map.clear();
    /// assert_eq!(map.length(), 0);
    /// assert_eq!(map.capacity(), capacity);
    /// ```
    pub fn clear(&mut self) {
        self.buckets.fill_with(|| None);
        self.occupied = 0;
    }

    /// Returns an iterator over the entries, bucket by bucket and within a
    /// bucket in chain order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            buckets: self.buckets.iter(),
            chain: None,
        }
    }

    /// Returns every key, in iteration order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.set("a", 1);
    /// map.set("b", 2);
    ///
    /// let mut keys = map.keys();
    /// keys.sort();
    /// assert_eq!(keys, ["a", "b"]);
    /// ```
    pub fn keys(&self) -> Vec<&str> {
        self.iter().map(|(k, _)| k).collect()
    }

    /// Returns every value, in iteration order.
    pub fn values(&self) -> Vec<&V> {
        self.iter().map(|(_, v)| v).collect()
    }

    /// Returns every key-value pair, in iteration order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.set("apple", "red");
    /// map.set("banana", "yellow");
    ///
    /// let rebuilt: HashMap<&str> = map
    ///     .entries()
    ///     .into_iter()
    ///     .map(|(k, v)| (k, *v))
    ///     .collect();
    /// assert_eq!(rebuilt.get("apple"), Some(&"red"));
    /// assert_eq!(rebuilt.len(), map.len());
    /// ```
    pub fn entries(&self) -> Vec<(&str, &V)> {
        self.iter().collect()
    }

    /// Removes every entry and returns them as an owning iterator. The
    /// capacity is kept.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.set("a", 1);
    /// map.set("b", 2);
    ///
    /// let pairs: Vec<_> = map.drain().collect();
    /// assert!(map.is_empty());
    /// assert_eq!(pairs.len(), 2);
    /// ```
    pub fn drain(&mut self) -> IntoIter<V> {
        let buckets = core::mem::replace(&mut self.buckets, empty_buckets(self.capacity));
        self.occupied = 0;
        IntoIter {
            inner: buckets.into_iter().flatten().flatten(),
        }
    }

    /// Returns chain-length statistics for inspecting bucket utilization.
    #[cfg(feature = "stats")]
    pub fn debug_stats(&self) -> DebugStats {
        let allocated_chains = self.buckets.iter().flatten().count();
        let lengths = self.buckets.iter().flatten().map(Chain::size);
        let used_buckets = lengths.clone().filter(|&len| len > 0).count();
        let longest_chain = lengths.max().unwrap_or(0);

        DebugStats {
            populated: self.occupied,
            capacity: self.capacity,
            allocated_chains,
            used_buckets,
            longest_chain,
            load_factor: self.load_factor(),
            bucket_utilization: used_buckets as f64 / self.capacity as f64,
        }
    }

    /// Computes how many buckets hold chains of each length.
    #[cfg(feature = "stats")]
    pub fn chain_histogram(&self) -> ChainHistogram {
        let mut counts = alloc::vec![0usize; 1];
        for bucket in &self.buckets {
            let len = bucket.as_ref().map_or(0, Chain::size);
            if len >= counts.len() {
                counts.resize(len + 1, 0);
            }
            counts[len] += 1;
        }
        ChainHistogram { counts }
    }
}

impl<K, V> FromIterator<(K, V)> for HashMap<V, PositionalHasher>
where
    K: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K, V, H> Extend<(K, V)> for HashMap<V, H>
where
    K: Into<String>,
    H: BucketHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

/// An iterator over the entries of a [`HashMap`].
///
/// Created by [`HashMap::iter`]. Yields `(&str, &V)` in bucket order, then
/// chain order.
pub struct Iter<'a, V> {
    buckets: core::slice::Iter<'a, Bucket<V>>,
    chain: Option<chain::Iter<'a, (String, V)>>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((k, v)) = self.chain.as_mut().and_then(Iterator::next) {
                return Some((k.as_str(), v));
            }
            self.chain = self.buckets.next()?.as_ref().map(Chain::iter);
        }
    }
}

impl<'a, V, H> IntoIterator for &'a HashMap<V, H> {
    type Item = (&'a str, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An owning iterator over the entries of a [`HashMap`].
///
/// Created by [`HashMap::drain`] or by consuming the map.
pub struct IntoIter<V> {
    inner: core::iter::Flatten<core::iter::Flatten<alloc::vec::IntoIter<Bucket<V>>>>,
}

impl<V> Iterator for IntoIter<V> {
    type Item = (String, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl<V, H> IntoIterator for HashMap<V, H> {
    type Item = (String, V);
    type IntoIter = IntoIter<V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.buckets.into_iter().flatten().flatten(),
        }
    }
}
