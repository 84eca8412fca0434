//! A singly linked list used as the collision chain of one bucket.
//!
//! Every node owns the node after it, and the [`Chain`] owns the head. The
//! chain additionally caches a pointer to its last node so [`Chain::append`]
//! runs in constant time. That pointer is never an owner; every method that
//! changes the shape of the list keeps it pointing at the final node.

use alloc::boxed::Box;
use core::fmt;
use core::fmt::Debug;
use core::fmt::Display;
use core::marker::PhantomData;
use core::ptr::NonNull;

type Link<T> = Option<NonNull<Node<T>>>;

struct Node<T> {
    value: T,
    next: Link<T>,
}

impl<T> Node<T> {
    /// Allocates a node and leaks it into a link. Ownership passes to whatever
    /// link the result is stored in.
    #[inline]
    fn alloc(value: T, next: Link<T>) -> NonNull<Node<T>> {
        NonNull::from(Box::leak(Box::new(Node { value, next })))
    }

    /// Reclaims a node previously produced by [`Node::alloc`].
    ///
    /// # Safety
    ///
    /// `node` must come from [`Node::alloc`], must no longer be reachable from
    /// any link, and must not be reclaimed twice.
    #[inline]
    unsafe fn reclaim(node: NonNull<Node<T>>) -> Box<Node<T>> {
        // SAFETY: Caller guarantees `node` was leaked from a `Box` and is
        // uniquely owned here.
        unsafe { Box::from_raw(node.as_ptr()) }
    }
}

/// A singly linked list with a cached tail pointer.
///
/// Positions are 0-based. [`Chain::at`] additionally accepts negative
/// positions counted from the end, so `-1` is the last element.
///
/// # Examples
///
/// ```rust
/// use chain_hash::chain::Chain;
///
/// let mut chain = Chain::new();
/// chain.append(2);
/// chain.append(3);
/// chain.prepend(1);
///
/// assert_eq!(chain.size(), 3);
/// assert_eq!(chain.at(0), Some(&1));
/// assert_eq!(chain.at(-1), Some(&3));
/// assert_eq!(chain.to_string(), "( 1 ) -> ( 2 ) -> ( 3 ) -> null");
/// ```
pub struct Chain<T> {
    head: Link<T>,
    tail: Link<T>,
    _marker: PhantomData<Box<Node<T>>>,
}

// SAFETY: `Chain<T>` uniquely owns its nodes, exactly like a `Box`-linked
// list, so it is as thread-safe as the values it stores.
unsafe impl<T: Send> Send for Chain<T> {}
// SAFETY: Shared access only ever hands out `&T`.
unsafe impl<T: Sync> Sync for Chain<T> {}

impl<T> Chain<T> {
    /// Creates an empty chain.
    pub const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            _marker: PhantomData,
        }
    }

    /// Creates a chain holding exactly one value.
    pub fn singleton(value: T) -> Self {
        let node = Node::alloc(value, None);
        Self {
            head: Some(node),
            tail: Some(node),
            _marker: PhantomData,
        }
    }

    /// Returns `true` if the chain holds no values.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Counts the values by walking the whole chain.
    ///
    /// The chain does not cache its length, so this is O(n).
    pub fn size(&self) -> usize {
        self.iter().count()
    }

    /// Returns the first value.
    pub fn first(&self) -> Option<&T> {
        // SAFETY: `head` is either `None` or a live node owned by `self`.
        self.head.map(|node| unsafe { &(*node.as_ptr()).value })
    }

    /// Returns the last value, read through the cached tail pointer.
    pub fn last(&self) -> Option<&T> {
        // SAFETY: `tail` is either `None` or the live final node of `self`.
        self.tail.map(|node| unsafe { &(*node.as_ptr()).value })
    }

    /// Adds a value after the current last value in O(1).
    pub fn append(&mut self, value: T) {
        let node = Node::alloc(value, None);
        match self.tail {
            // SAFETY: `tail` points at the live final node of `self`, and we
            // hold `&mut self`, so nothing else observes it.
            Some(tail) => unsafe { (*tail.as_ptr()).next = Some(node) },
            None => self.head = Some(node),
        }
        self.tail = Some(node);
    }

    /// Adds a value before the current first value in O(1).
    pub fn prepend(&mut self, value: T) {
        let node = Node::alloc(value, self.head);
        if self.tail.is_none() {
            self.tail = Some(node);
        }
        self.head = Some(node);
    }

    /// Resolves a possibly negative position to an index in `0..size`.
    fn resolve(&self, index: isize) -> Option<usize> {
        let size = self.size();
        let effective = if index < 0 {
            index.checked_add_unsigned(size)?
        } else {
            index
        };

        usize::try_from(effective).ok().filter(|&i| i < size)
    }

    /// Walks `index` links from the head.
    fn node_at(&self, index: usize) -> Link<T> {
        let mut current = self.head;
        for _ in 0..index {
            // SAFETY: every link reachable from `head` is a live node.
            current = unsafe { (*current?.as_ptr()).next };
        }
        current
    }

    /// Returns the value at `index`.
    ///
    /// Negative indices count back from the end: `index + size()` is used
    /// when `index < 0`. Out-of-range indices yield `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::chain::Chain;
    ///
    /// let chain: Chain<_> = ["a", "b", "c"].into_iter().collect();
    /// assert_eq!(chain.at(1), Some(&"b"));
    /// assert_eq!(chain.at(-3), Some(&"a"));
    /// assert_eq!(chain.at(3), None);
    /// assert_eq!(chain.at(-4), None);
    /// ```
    pub fn at(&self, index: isize) -> Option<&T> {
        let node = self.node_at(self.resolve(index)?)?;
        // SAFETY: `node` is live and borrowed for the lifetime of `&self`.
        Some(unsafe { &(*node.as_ptr()).value })
    }

    /// Returns a mutable reference to the value at `index`, with the same
    /// addressing as [`Chain::at`].
    pub fn at_mut(&mut self, index: isize) -> Option<&mut T> {
        let node = self.node_at(self.resolve(index)?)?;
        // SAFETY: `node` is live and we hold `&mut self`.
        Some(unsafe { &mut (*node.as_ptr()).value })
    }

    /// Inserts `value` so that it ends up at `index`.
    ///
    /// Index `0` prepends. Any other index splices the value after the node
    /// at `index - 1`; `index == size()` therefore appends. If there is no
    /// node at `index - 1` the chain is left untouched and the value is
    /// handed back.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::chain::Chain;
    ///
    /// let mut chain: Chain<_> = [1, 3].into_iter().collect();
    /// assert_eq!(chain.insert_at(2, 1), Ok(()));
    /// assert_eq!(chain.insert_at(4, 3), Ok(()));
    /// assert_eq!(chain.insert_at(9, 9), Err(9));
    /// assert_eq!(chain.to_string(), "( 1 ) -> ( 2 ) -> ( 3 ) -> ( 4 ) -> null");
    /// ```
    pub fn insert_at(&mut self, value: T, index: usize) -> Result<(), T> {
        if index == 0 {
            self.prepend(value);
            return Ok(());
        }

        let Some(previous) = self.node_at(index - 1) else {
            return Err(value);
        };

        // SAFETY: `previous` is a live node of `self` and we hold `&mut self`.
        unsafe {
            let previous = &mut *previous.as_ptr();
            let node = Node::alloc(value, previous.next);
            previous.next = Some(node);
            if (*node.as_ptr()).next.is_none() {
                self.tail = Some(node);
            }
        }

        Ok(())
    }

    /// Removes and returns the value at `index`.
    ///
    /// Returns `None` and leaves the chain untouched when `index` is out of
    /// range, including on an empty chain.
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        let head = self.head?;

        if index == 0 {
            // SAFETY: `head` is unlinked below before being reclaimed.
            let node = unsafe { Node::reclaim(head) };
            self.head = node.next;
            if self.head.is_none() {
                self.tail = None;
            }
            return Some(node.value);
        }

        let previous = self.node_at(index - 1)?;
        // SAFETY: `previous` is a live node of `self`; its successor is
        // unlinked before it is reclaimed.
        unsafe {
            let previous_ref = &mut *previous.as_ptr();
            let removed = Node::reclaim(previous_ref.next?);
            previous_ref.next = removed.next;
            if previous_ref.next.is_none() {
                self.tail = Some(previous);
            }
            Some(removed.value)
        }
    }

    /// Removes and returns the last value.
    ///
    /// The list is singly linked, so finding the new tail is O(n).
    pub fn pop(&mut self) -> Option<T> {
        let size = self.size();
        if size == 0 {
            return None;
        }
        self.remove_at(size - 1)
    }

    /// Removes every value.
    pub fn clear(&mut self) {
        let mut current = self.head.take();
        self.tail = None;
        while let Some(node) = current {
            // SAFETY: each node is reclaimed once, after its predecessor has
            // already been released, so nothing else links to it.
            let node = unsafe { Node::reclaim(node) };
            current = node.next;
        }
    }

    /// Returns the position of the first value matching `predicate`.
    pub fn position(&self, predicate: impl Fn(&T) -> bool) -> Option<usize> {
        self.iter().position(predicate)
    }

    /// Returns the first value matching `predicate`.
    pub fn search(&self, predicate: impl Fn(&T) -> bool) -> Option<&T> {
        self.iter().find(|value| predicate(value))
    }

    /// Returns a mutable reference to the first value matching `predicate`.
    pub fn search_mut(&mut self, predicate: impl Fn(&T) -> bool) -> Option<&mut T> {
        self.iter_mut().find(|value| predicate(value))
    }

    /// Returns an iterator over the values, head to tail.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            next: self.head,
            _marker: PhantomData,
        }
    }

    /// Returns an iterator over mutable references to the values, head to
    /// tail.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut {
            next: self.head,
            _marker: PhantomData,
        }
    }

    /// Checks that the cached tail is the node reached by walking from head.
    #[cfg(test)]
    fn assert_tail_consistent(&self) {
        let mut last = None;
        let mut current = self.head;
        while let Some(node) = current {
            last = Some(node);
            // SAFETY: every link reachable from `head` is a live node.
            current = unsafe { (*node.as_ptr()).next };
        }
        assert_eq!(last, self.tail);
    }
}

impl<T> Chain<T>
where
    T: PartialEq,
{
    /// Returns `true` if some value equals `value`.
    pub fn contains(&self, value: &T) -> bool {
        self.iter().any(|v| v == value)
    }

    /// Returns the position of the first value equal to `value`.
    pub fn find(&self, value: &T) -> Option<usize> {
        self.iter().position(|v| v == value)
    }
}

impl<T> Drop for Chain<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T> Default for Chain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Chain<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        self.iter().cloned().collect()
    }
}

impl<T> PartialEq for Chain<T>
where
    T: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl<T> Eq for Chain<T> where T: Eq {}

impl<T> Debug for Chain<T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Renders `( v1 ) -> ( v2 ) -> ... -> null`.
impl<T> Display for Chain<T>
where
    T: Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for value in self.iter() {
            write!(f, "( {value} ) -> ")?;
        }
        f.write_str("null")
    }
}

impl<T> FromIterator<T> for Chain<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut chain = Self::new();
        chain.extend(iter);
        chain
    }
}

impl<T> Extend<T> for Chain<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.append(value);
        }
    }
}

/// An iterator over the values of a [`Chain`].
pub struct Iter<'a, T> {
    next: Link<T>,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        // SAFETY: the chain outlives `'a` and is not mutated while borrowed.
        unsafe {
            let node = &*node.as_ptr();
            self.next = node.next;
            Some(&node.value)
        }
    }
}

/// A mutable iterator over the values of a [`Chain`].
pub struct IterMut<'a, T> {
    next: Link<T>,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        // SAFETY: the chain is exclusively borrowed for `'a` and each node is
        // yielded at most once.
        unsafe {
            let node = &mut *node.as_ptr();
            self.next = node.next;
            Some(&mut node.value)
        }
    }
}

/// An owning iterator over the values of a [`Chain`].
pub struct IntoIter<T> {
    chain: Chain<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.chain.remove_at(0)
    }
}

impl<T> IntoIterator for Chain<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { chain: self }
    }
}

impl<'a, T> IntoIterator for &'a Chain<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut Chain<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::Cell;

    use rand::Rng;
    use rand::SeedableRng;
    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn collect<T: Clone>(chain: &Chain<T>) -> Vec<T> {
        chain.iter().cloned().collect()
    }

    #[test]
    fn append_then_at_last() {
        let mut chain = Chain::new();
        for i in 0..10 {
            chain.append(i);
            let size = chain.size() as isize;
            assert_eq!(chain.at(size - 1), Some(&i));
            assert_eq!(chain.last(), Some(&i));
            chain.assert_tail_consistent();
        }
        assert_eq!(chain.first(), Some(&0));
    }

    #[test]
    fn negative_index_mirrors_positive() {
        let chain: Chain<_> = (0..7).collect();
        let size = chain.size() as isize;
        for i in 1..=size {
            assert_eq!(chain.at(-i), chain.at(size - i));
        }
        assert_eq!(chain.at(-1), chain.at(size - 1));
        assert_eq!(chain.at(-(size + 1)), None);
        assert_eq!(chain.at(size), None);
        assert_eq!(chain.at(isize::MIN), None);
        assert_eq!(chain.at(isize::MAX), None);
    }

    #[test]
    fn empty_chain_is_total() {
        let mut chain: Chain<i32> = Chain::new();
        assert!(chain.is_empty());
        assert_eq!(chain.size(), 0);
        assert_eq!(chain.at(0), None);
        assert_eq!(chain.at(-1), None);
        assert_eq!(chain.first(), None);
        assert_eq!(chain.last(), None);
        assert_eq!(chain.pop(), None);
        assert_eq!(chain.remove_at(0), None);
        assert_eq!(chain.remove_at(3), None);
        assert_eq!(chain.insert_at(1, 1), Err(1));
        assert_eq!(chain.find(&1), None);
        assert!(!chain.contains(&1));
        assert_eq!(chain.to_string(), "null");
        chain.assert_tail_consistent();
    }

    #[test]
    fn prepend_on_empty_sets_both_ends() {
        let mut chain = Chain::new();
        chain.prepend("only");
        assert_eq!(chain.first(), Some(&"only"));
        assert_eq!(chain.last(), Some(&"only"));
        chain.assert_tail_consistent();

        chain.prepend("front");
        assert_eq!(collect(&chain), vec!["front", "only"]);
        assert_eq!(chain.last(), Some(&"only"));
        chain.assert_tail_consistent();

        chain.append("back");
        assert_eq!(collect(&chain), vec!["front", "only", "back"]);
        chain.assert_tail_consistent();
    }

    #[test]
    fn remove_only_element_empties_chain() {
        let mut chain = Chain::singleton(5);
        assert_eq!(chain.remove_at(0), Some(5));
        assert_eq!(chain.size(), 0);
        assert_eq!(chain.at(0), None);
        assert!(chain.is_empty());
        chain.assert_tail_consistent();

        chain.append(6);
        assert_eq!(collect(&chain), vec![6]);
        chain.assert_tail_consistent();
    }

    #[test]
    fn remove_last_moves_tail_back() {
        let mut chain: Chain<_> = (0..4).collect();
        assert_eq!(chain.remove_at(3), Some(3));
        assert_eq!(chain.last(), Some(&2));
        chain.assert_tail_consistent();

        chain.append(9);
        assert_eq!(collect(&chain), vec![0, 1, 2, 9]);
        chain.assert_tail_consistent();
    }

    #[test]
    fn remove_middle_keeps_tail() {
        let mut chain: Chain<_> = (0..4).collect();
        assert_eq!(chain.remove_at(1), Some(1));
        assert_eq!(collect(&chain), vec![0, 2, 3]);
        assert_eq!(chain.last(), Some(&3));
        assert_eq!(chain.remove_at(3), None);
        assert_eq!(chain.remove_at(10), None);
        chain.assert_tail_consistent();
    }

    #[test]
    fn insert_at_positions() {
        let mut chain: Chain<_> = [1, 3].into_iter().collect();
        assert_eq!(chain.insert_at(0, 0), Ok(()));
        assert_eq!(chain.insert_at(2, 2), Ok(()));
        assert_eq!(chain.insert_at(4, 4), Ok(()));
        assert_eq!(collect(&chain), vec![0, 1, 2, 3, 4]);
        assert_eq!(chain.last(), Some(&4));
        chain.assert_tail_consistent();

        assert_eq!(chain.insert_at(7, 7), Err(7));
        assert_eq!(collect(&chain), vec![0, 1, 2, 3, 4]);

        let mut empty = Chain::new();
        assert_eq!(empty.insert_at("x", 0), Ok(()));
        assert_eq!(empty.last(), Some(&"x"));
        empty.assert_tail_consistent();
    }

    #[test]
    fn pop_until_empty() {
        let mut chain: Chain<_> = (0..3).collect();
        assert_eq!(chain.pop(), Some(2));
        assert_eq!(chain.last(), Some(&1));
        chain.assert_tail_consistent();
        assert_eq!(chain.pop(), Some(1));
        assert_eq!(chain.pop(), Some(0));
        assert!(chain.is_empty());
        assert_eq!(chain.last(), None);
        assert_eq!(chain.pop(), None);
        chain.assert_tail_consistent();
    }

    #[test]
    fn contains_and_find_use_value_equality() {
        let chain: Chain<String> = ["adam", "steve", "adam"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(chain.contains(&"steve".to_string()));
        assert_eq!(chain.find(&"adam".to_string()), Some(0));
        assert_eq!(chain.find(&"steve".to_string()), Some(1));
        assert_eq!(chain.find(&"carell".to_string()), None);
    }

    #[test]
    fn search_mut_updates_in_place() {
        let mut chain: Chain<(String, i32)> = Chain::new();
        chain.append(("a".to_string(), 1));
        chain.append(("b".to_string(), 2));

        if let Some(entry) = chain.search_mut(|(k, _)| k == "b") {
            entry.1 = 20;
        }
        assert_eq!(chain.search(|(k, _)| k == "b"), Some(&("b".to_string(), 20)));
        assert_eq!(chain.position(|(k, _)| k == "b"), Some(1));
        assert_eq!(chain.size(), 2);
    }

    #[test]
    fn at_mut_and_iter_mut() {
        let mut chain: Chain<_> = (1..=3).collect();
        if let Some(v) = chain.at_mut(-1) {
            *v *= 10;
        }
        for v in &mut chain {
            *v += 1;
        }
        assert_eq!(collect(&chain), vec![2, 3, 31]);
    }

    #[test]
    fn display_format() {
        let chain: Chain<_> = ["Adam", "Steve"].into_iter().collect();
        assert_eq!(chain.to_string(), "( Adam ) -> ( Steve ) -> null");
    }

    #[test]
    fn clone_eq_and_into_iter() {
        let chain: Chain<_> = (0..5).map(|i| i.to_string()).collect();
        let copy = chain.clone();
        assert_eq!(chain, copy);
        copy.assert_tail_consistent();

        let owned: Vec<String> = copy.into_iter().collect();
        assert_eq!(owned, collect(&chain));
    }

    #[test]
    fn drops_every_value_once() {
        let drops = Rc::new(Cell::new(0));

        struct Counted(Rc<Cell<usize>>);
        impl Drop for Counted {
            fn drop(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        {
            let mut chain = Chain::new();
            for _ in 0..10 {
                chain.append(Counted(drops.clone()));
            }
            drop(chain.remove_at(4));
            drop(chain.pop());
            assert_eq!(drops.get(), 2);

            let mut partial = chain.into_iter();
            drop(partial.next());
        }
        assert_eq!(drops.get(), 10);
    }

    #[test]
    fn long_chain_drops_without_recursion() {
        let chain: Chain<_> = (0..200_000).collect();
        assert_eq!(chain.size(), 200_000);
        drop(chain);
    }

    #[test]
    fn random_operations_match_vec() {
        let mut rng = SmallRng::seed_from_u64(OsRng.try_next_u64().unwrap_or(0));
        let mut chain = Chain::new();
        let mut model: Vec<u32> = Vec::new();

        for step in 0..5_000u32 {
            match rng.random_range(0..6) {
                0 => {
                    chain.append(step);
                    model.push(step);
                }
                1 => {
                    chain.prepend(step);
                    model.insert(0, step);
                }
                2 => {
                    let index = rng.random_range(0..=model.len() + 1);
                    let result = chain.insert_at(step, index);
                    if index <= model.len() {
                        assert_eq!(result, Ok(()));
                        model.insert(index, step);
                    } else {
                        assert_eq!(result, Err(step));
                    }
                }
                3 => {
                    let index = rng.random_range(0..=model.len());
                    let expected = (index < model.len()).then(|| model.remove(index));
                    assert_eq!(chain.remove_at(index), expected);
                }
                4 => assert_eq!(chain.pop(), model.pop()),
                _ => {
                    let len = model.len() as isize;
                    let index = rng.random_range(-(len as i64) - 1..=len as i64) as isize;
                    let expected = if index < 0 {
                        (index + len >= 0).then(|| &model[(index + len) as usize])
                    } else {
                        model.get(index as usize)
                    };
                    assert_eq!(chain.at(index), expected);
                }
            }

            chain.assert_tail_consistent();
            assert_eq!(chain.size(), model.len());
            assert_eq!(chain.last(), model.last());
        }

        assert_eq!(collect(&chain), model);
    }
}
