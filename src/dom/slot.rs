//! Dual single-value / list storage
//!
//! Most elements hold zero or one child and zero or one attribute, so a
//! slot stores a lone value inline and only allocates a `Vec` once a second
//! value arrives. A promoted slot stays list-backed for the rest of its
//! life, even if removals bring it back down to one or zero values.

use crate::error::{Result, TreeError};

/// Storage cell used for both element content and element attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DualSlot<T> {
    /// No values
    Empty,
    /// Exactly one value, no allocation
    One(T),
    /// List-backed storage (any length once promoted)
    Many(Vec<T>),
}

impl<T> Default for DualSlot<T> {
    fn default() -> Self {
        DualSlot::Empty
    }
}

impl<T: Copy + PartialEq> DualSlot<T> {
    /// Create an empty slot
    pub fn new() -> Self {
        DualSlot::Empty
    }

    /// Create a slot pre-sized for `capacity` values.
    ///
    /// Capacities above one start list-backed so the expected values never
    /// pay for a promotion.
    pub fn with_capacity(capacity: usize) -> Self {
        if capacity > 1 {
            DualSlot::Many(Vec::with_capacity(capacity))
        } else {
            DualSlot::Empty
        }
    }

    /// Number of values
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            DualSlot::Empty => 0,
            DualSlot::One(_) => 1,
            DualSlot::Many(list) => list.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the slot has been promoted to list storage
    #[inline]
    pub fn is_promoted(&self) -> bool {
        matches!(self, DualSlot::Many(_))
    }

    /// Value at `index`, or `None` outside the current cardinality
    pub fn get(&self, index: usize) -> Option<T> {
        match self {
            DualSlot::Empty => None,
            DualSlot::One(value) => (index == 0).then_some(*value),
            DualSlot::Many(list) => list.get(index).copied(),
        }
    }

    /// First position of `value`
    pub fn position(&self, value: T) -> Option<usize> {
        match self {
            DualSlot::Empty => None,
            DualSlot::One(v) => (*v == value).then_some(0),
            DualSlot::Many(list) => list.iter().position(|v| *v == value),
        }
    }

    /// Last position of `value`
    pub fn last_position(&self, value: T) -> Option<usize> {
        match self {
            DualSlot::Many(list) => list.iter().rposition(|v| *v == value),
            _ => self.position(value),
        }
    }

    #[inline]
    pub fn contains(&self, value: T) -> bool {
        self.position(value).is_some()
    }

    /// Append a value: Empty becomes One, One is promoted to Many.
    pub fn push(&mut self, value: T) {
        match self {
            DualSlot::Empty => *self = DualSlot::One(value),
            DualSlot::One(existing) => {
                let existing = *existing;
                tracing::debug!("promoting single-value slot to list storage");
                *self = DualSlot::Many(vec![existing, value]);
            }
            DualSlot::Many(list) => list.push(value),
        }
    }

    /// Insert `value` at `index`, shifting later values.
    ///
    /// Bounds are checked before anything changes: an out-of-range index
    /// leaves the slot untouched.
    pub fn insert(&mut self, index: usize, value: T) -> Result<()> {
        let len = self.len();
        if index > len {
            return Err(TreeError::IndexOutOfRange { index, len });
        }

        match self {
            DualSlot::Empty => *self = DualSlot::One(value),
            DualSlot::One(existing) => {
                let existing = *existing;
                tracing::debug!("promoting single-value slot to list storage");
                let list = if index == 0 {
                    vec![value, existing]
                } else {
                    vec![existing, value]
                };
                *self = DualSlot::Many(list);
            }
            DualSlot::Many(list) => list.insert(index, value),
        }
        Ok(())
    }

    /// Replace the value at `index`, returning the previous occupant
    pub fn set(&mut self, index: usize, value: T) -> Result<T> {
        let len = self.len();
        match self {
            DualSlot::One(existing) if index == 0 => Ok(std::mem::replace(existing, value)),
            DualSlot::Many(list) if index < list.len() => {
                Ok(std::mem::replace(&mut list[index], value))
            }
            _ => Err(TreeError::IndexOutOfRange { index, len }),
        }
    }

    /// Remove and return the value at `index`.
    ///
    /// A `One` slot becomes `Empty`; a `Many` slot shifts and stays `Many`.
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        match self {
            DualSlot::Empty => None,
            DualSlot::One(value) => {
                if index == 0 {
                    let value = *value;
                    *self = DualSlot::Empty;
                    Some(value)
                } else {
                    None
                }
            }
            DualSlot::Many(list) => (index < list.len()).then(|| list.remove(index)),
        }
    }

    /// Remove the first occurrence of `value`
    pub fn remove_value(&mut self, value: T) -> bool {
        match self.position(value) {
            Some(index) => self.remove_at(index).is_some(),
            None => false,
        }
    }

    /// Remove every value contained in `values`, returning whether any went
    pub fn remove_all(&mut self, values: &[T]) -> bool {
        let before = self.len();
        match self {
            DualSlot::Empty => {}
            DualSlot::One(value) => {
                if values.contains(value) {
                    *self = DualSlot::Empty;
                }
            }
            DualSlot::Many(list) => list.retain(|v| !values.contains(v)),
        }
        self.len() != before
    }

    /// Drop all values, keeping list storage if the slot was promoted
    pub fn clear(&mut self) {
        match self {
            DualSlot::Many(list) => list.clear(),
            _ => *self = DualSlot::Empty,
        }
    }

    /// Reset to `Empty`, discarding any list storage
    pub fn reset(&mut self) {
        *self = DualSlot::Empty;
    }

    /// Materialize list storage, promoting if needed, and return it
    pub fn as_vec_mut(&mut self) -> &mut Vec<T> {
        match self {
            DualSlot::Empty => *self = DualSlot::Many(Vec::new()),
            DualSlot::One(value) => {
                let value = *value;
                *self = DualSlot::Many(vec![value]);
            }
            DualSlot::Many(_) => {}
        }
        match self {
            DualSlot::Many(list) => list,
            _ => unreachable!("slot was promoted above"),
        }
    }

    /// Values as a slice, without promoting
    pub fn as_slice(&self) -> &[T] {
        match self {
            DualSlot::Empty => &[],
            DualSlot::One(value) => std::slice::from_ref(value),
            DualSlot::Many(list) => list.as_slice(),
        }
    }

    /// Iterate values in order
    pub fn iter(&self) -> SlotIter<'_, T> {
        SlotIter {
            inner: self.as_slice().iter(),
        }
    }

    /// Copy values out
    pub fn to_vec(&self) -> Vec<T> {
        self.as_slice().to_vec()
    }
}

/// Restartable iterator over a slot's values
#[derive(Debug, Clone)]
pub struct SlotIter<'a, T> {
    inner: std::slice::Iter<'a, T>,
}

impl<'a, T: Copy> Iterator for SlotIter<'a, T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.inner.next().copied()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, T: Copy> DoubleEndedIterator for SlotIter<'a, T> {
    fn next_back(&mut self) -> Option<T> {
        self.inner.next_back().copied()
    }
}

impl<'a, T: Copy> ExactSizeIterator for SlotIter<'a, T> {}
