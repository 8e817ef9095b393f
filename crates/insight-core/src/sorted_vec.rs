//! Ordered container
//!
//! A vector that is sorted at all times. Elements may be mutated in place through
//! [`SortedVec::modify`], after which only the mutated element is relocated to its new slot by
//! rotating the contiguous run between its old and new position.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Index;
use thiserror::Error;

/// Comparator used to order a [`SortedVec`].
///
/// Implemented by zero-sized marker types so the order is part of the container type.
pub trait SortOrder<T> {
    /// Compare two elements.
    fn compare(a: &T, b: &T) -> Ordering;
}

/// Natural order of `T` (via [`Ord`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Natural;

impl<T: Ord> SortOrder<T> for Natural {
    fn compare(a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// Out-of-range element access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("index {index} is out of bounds for length {len}")]
pub struct OutOfBounds {
    /// Requested index.
    pub index: usize,
    /// Container length at the time of the request.
    pub len: usize,
}

/// A vector kept sorted by `O` at all times.
pub struct SortedVec<T, O = Natural> {
    items: Vec<T>,
    _order: PhantomData<O>,
}

impl<T, O: SortOrder<T>> SortedVec<T, O> {
    /// Create an empty container.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            _order: PhantomData,
        }
    }

    /// Create an empty container with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            _order: PhantomData,
        }
    }

    /// Build from an arbitrary vector (stable sort).
    pub fn from_vec(mut items: Vec<T>) -> Self {
        items.sort_by(O::compare);
        Self {
            items,
            _order: PhantomData,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove all elements.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sorted view of all elements.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Iterate in order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Element at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Element at `index`, reporting a bounds error otherwise.
    pub fn at(&self, index: usize) -> Result<&T, OutOfBounds> {
        self.items.get(index).ok_or(OutOfBounds {
            index,
            len: self.items.len(),
        })
    }

    /// First element (smallest).
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    /// Last element (largest).
    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    /// Index of the first element not less than `value`.
    pub fn lower_bound(&self, value: &T) -> usize {
        self.items
            .partition_point(|e| O::compare(e, value) == Ordering::Less)
    }

    /// Index of the first element greater than `value`.
    pub fn upper_bound(&self, value: &T) -> usize {
        self.items
            .partition_point(|e| O::compare(e, value) != Ordering::Greater)
    }

    /// Insert a value, returning its index. Equal elements keep the new value first.
    pub fn insert(&mut self, value: T) -> usize {
        let pos = self.lower_bound(&value);
        self.items.insert(pos, value);
        pos
    }

    /// Insert a value starting the search at `hint`.
    ///
    /// The hint only affects how many comparisons are made: the resulting index is always the
    /// one [`SortedVec::insert`] would pick.
    pub fn insert_with_hint(&mut self, value: T, hint: usize) -> usize {
        let pos = self.lower_bound_from(&value, hint);
        self.items.insert(pos, value);
        pos
    }

    fn lower_bound_from(&self, value: &T, hint: usize) -> usize {
        let len = self.items.len();
        let hint = hint.min(len);
        let is_less = |i: usize| O::compare(&self.items[i], value) == Ordering::Less;

        if hint < len && is_less(hint) {
            // Gallop right: `hint + bound / 2` is known to be less than `value`.
            let mut bound = 1;
            while hint + bound < len && is_less(hint + bound) {
                bound *= 2;
            }
            let lo = hint + bound / 2 + 1;
            let hi = (hint + bound).min(len);
            lo + self.items[lo..hi].partition_point(|e| O::compare(e, value) == Ordering::Less)
        } else {
            // Gallop left: `hint - bound / 2` is known to be not less (or the end).
            let mut bound = 1;
            while bound <= hint && !is_less(hint - bound) {
                bound *= 2;
            }
            let hi = hint - bound / 2;
            let lo = if bound > hint { 0 } else { hint - bound + 1 };
            lo + self.items[lo..hi].partition_point(|e| O::compare(e, value) == Ordering::Less)
        }
    }

    /// Index of the first element comparing equal to `value`.
    pub fn find(&self, value: &T) -> Option<usize> {
        let pos = self.lower_bound(value);
        match self.items.get(pos) {
            Some(found) if O::compare(found, value) == Ordering::Equal => Some(pos),
            _ => None,
        }
    }

    /// Index of the first element matching `pred` (linear scan).
    pub fn position<P: FnMut(&T) -> bool>(&self, pred: P) -> Option<usize> {
        self.items.iter().position(pred)
    }

    /// Remove the element at `index`.
    pub fn remove(&mut self, index: usize) -> Result<T, OutOfBounds> {
        if index >= self.items.len() {
            return Err(OutOfBounds {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    /// Keep only the elements matching `keep`. Order is preserved.
    pub fn retain<F: FnMut(&T) -> bool>(&mut self, keep: F) {
        self.items.retain(keep);
    }

    /// Mutate the element at `index` and move it to its sorted slot.
    ///
    /// Returns the element's new index.
    pub fn modify<F: FnOnce(&mut T)>(
        &mut self,
        index: usize,
        mutate: F,
    ) -> Result<usize, OutOfBounds> {
        let len = self.items.len();
        let item = self
            .items
            .get_mut(index)
            .ok_or(OutOfBounds { index, len })?;
        mutate(item);
        Ok(self.relocate(index))
    }

    /// Mutate every element, then restore the order.
    ///
    /// Runs in `O(n + d)` where `d` is the total distance elements had to move.
    /// Returns `true` if any element changed its index.
    pub fn modify_all<F: FnMut(&mut T)>(&mut self, mutate: F) -> bool {
        self.items.iter_mut().for_each(mutate);
        self.restore_order()
    }

    fn restore_order(&mut self) -> bool {
        let mut moved = false;
        for i in 1..self.items.len() {
            if O::compare(&self.items[i - 1], &self.items[i]) == Ordering::Greater {
                let item = &self.items[i];
                let target = self.items[..i]
                    .partition_point(|e| O::compare(e, item) != Ordering::Greater);
                self.items[target..=i].rotate_right(1);
                moved = true;
            }
        }
        moved
    }

    fn relocate(&mut self, index: usize) -> usize {
        let item = &self.items[index];

        if index > 0 && O::compare(&self.items[index - 1], item) == Ordering::Greater {
            let target = self.items[..index]
                .partition_point(|e| O::compare(e, item) != Ordering::Greater);
            self.items[target..=index].rotate_right(1);
            return target;
        }

        if index + 1 < self.items.len()
            && O::compare(&self.items[index + 1], item) == Ordering::Less
        {
            let target = index
                + 1
                + self.items[index + 1..]
                    .partition_point(|e| O::compare(e, item) == Ordering::Less);
            self.items[index..target].rotate_left(1);
            return target - 1;
        }

        index
    }

    /// Consume the container, returning the sorted vector.
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T, O: SortOrder<T>> Default for SortedVec<T, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, O> Clone for SortedVec<T, O> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            _order: PhantomData,
        }
    }
}

impl<T: fmt::Debug, O> fmt::Debug for SortedVec<T, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<T, O> Index<usize> for SortedVec<T, O> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<T, O: SortOrder<T>> From<Vec<T>> for SortedVec<T, O> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}

impl<T, O: SortOrder<T>> FromIterator<T> for SortedVec<T, O> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<'a, T, O> IntoIterator for &'a SortedVec<T, O> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_sorted(v: &SortedVec<i32>) -> bool {
        v.as_slice().windows(2).all(|w| w[0] <= w[1])
    }

    #[test]
    fn test_construction_sorts() {
        let v: SortedVec<i32> = SortedVec::from_vec(vec![1, 6, 3, 9]);
        assert!(is_sorted(&v));
        assert_eq!(v.as_slice(), &[1, 3, 6, 9]);

        let v: SortedVec<i32> = [5, 8, 3].into_iter().collect();
        assert_eq!(v.as_slice(), &[3, 5, 8]);
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut v: SortedVec<i32> = SortedVec::from_vec(vec![-7, 1, 4, 7]);
        for value in [0, 1, 10, -1, -100] {
            v.insert(value);
            assert!(is_sorted(&v));
        }
        assert_eq!(v.len(), 9);
    }

    #[test]
    fn test_insert_goes_before_equal_elements() {
        let mut v: SortedVec<i32> = SortedVec::from_vec(vec![1, 4, 4, 7]);
        assert_eq!(v.insert(4), 1);
    }

    #[test]
    fn test_insert_with_hint_matches_plain_insert() {
        let base: Vec<i32> = (0..64).map(|i| (i / 3) * 2).collect();
        for value in [-5, 0, 1, 2, 17, 20, 41, 42, 43, 100] {
            let mut plain: SortedVec<i32> = SortedVec::from_vec(base.clone());
            let expected = plain.insert(value);
            for hint in [0, 1, 5, 31, 32, 63, 64, 1000] {
                let mut hinted: SortedVec<i32> = SortedVec::from_vec(base.clone());
                assert_eq!(
                    hinted.insert_with_hint(value, hint),
                    expected,
                    "value {value} hint {hint}"
                );
                assert_eq!(hinted.as_slice(), plain.as_slice());
            }
        }
    }

    #[test]
    fn test_modify_first_last_middle() {
        let base = vec![-99, -7, 1, 4, 7, 10000];
        for (index, value) in [
            (0, -800),
            (0, -99),
            (0, 0),
            (0, 999_999),
            (5, -999_999),
            (5, 0),
            (5, 10000),
            (5, 10900),
            (3, -999_999),
            (3, 0),
            (3, 4),
            (3, 14),
            (3, 10900),
        ] {
            let mut v: SortedVec<i32> = SortedVec::from_vec(base.clone());
            let pos = v.modify(index, |e| *e = value).unwrap();
            assert!(is_sorted(&v), "{v:?}");
            assert_eq!(v[pos], value);
        }
    }

    #[test]
    fn test_modify_out_of_bounds() {
        let mut v: SortedVec<i32> = SortedVec::from_vec(vec![1, 2, 3]);
        let err = v.modify(3, |e| *e = 0).unwrap_err();
        assert_eq!(err, OutOfBounds { index: 3, len: 3 });
        assert_eq!(v.as_slice(), &[1, 2, 3]);
        assert!(v.remove(7).is_err());
        assert!(v.at(3).is_err());
        assert_eq!(v.at(2), Ok(&3));
    }

    #[test]
    fn test_modify_all_restores_order() {
        let mut v: SortedVec<i32> = SortedVec::from_vec(vec![1, 2, 3, 4, 5]);
        let moved = v.modify_all(|e| {
            if *e % 2 == 0 {
                *e *= 10;
            }
        });
        assert!(moved);
        assert_eq!(v.as_slice(), &[1, 3, 5, 20, 40]);

        assert!(!v.modify_all(|e| *e += 1));
    }

    #[test]
    fn test_find() {
        let v: SortedVec<i32> = SortedVec::from_vec(vec![1, 3, 3, 9]);
        assert_eq!(v.find(&3), Some(1));
        assert_eq!(v.find(&9), Some(3));
        assert_eq!(v.find(&4), None);
        assert_eq!(v.upper_bound(&3), 3);
    }
}
