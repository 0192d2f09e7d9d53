//! Growable typed buffer
//!
//! Backs command history, search strings and highlight coordinates.
//! Capacity grows geometrically and is only ever released by dropping
//! the buffer; emptying keeps the allocation around for reuse.

use crate::error::{Error, Result};

/// Smallest capacity allocated on first growth
const MIN_CAPACITY: usize = 16;

/// Append/random-access buffer with geometric growth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrowableBuffer<T> {
    items: Vec<T>,
}

impl<T> GrowableBuffer<T> {
    /// Create an empty buffer without allocating
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Create an empty buffer with room for `capacity` elements
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of elements that fit without reallocating
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// Append an element, doubling the capacity when full
    pub fn push(&mut self, item: T) -> Result<()> {
        if self.items.len() == self.items.capacity() {
            let target = (self.items.capacity() * 2).max(MIN_CAPACITY);
            let additional = target - self.items.len();
            self.items
                .try_reserve_exact(additional)
                .map_err(|_| Error::Alloc(additional))?;
        }
        self.items.push(item);
        Ok(())
    }

    /// Remove and return the last element
    pub fn pop(&mut self) -> Result<T> {
        self.items.pop().ok_or(Error::Empty)
    }

    /// Element at `index` counted from the front
    pub fn get(&self, index: usize) -> Result<&T> {
        self.items.get(index).ok_or(Error::OutOfBounds {
            index,
            len: self.items.len(),
        })
    }

    /// Element at `index` counted from the back (0 is the last element)
    pub fn get_from_end(&self, index: usize) -> Result<&T> {
        let len = self.items.len();
        if index >= len {
            return Err(Error::OutOfBounds { index, len });
        }
        Ok(&self.items[len - 1 - index])
    }

    /// Last element, if any
    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    /// Drop all elements, keeping the capacity
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T: Clone> GrowableBuffer<T> {
    /// Append every element of `items`
    pub fn extend_from_slice(&mut self, items: &[T]) -> Result<()> {
        for item in items {
            self.push(item.clone())?;
        }
        Ok(())
    }
}

impl<T> Default for GrowableBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> IntoIterator for &'a GrowableBuffer<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_round_trip_keeps_capacity() {
        let mut buf = GrowableBuffer::new();
        for i in 0..100 {
            buf.push(i).unwrap();
        }
        let capacity = buf.capacity();
        assert!(capacity >= 100);

        for i in (0..100).rev() {
            assert_eq!(buf.pop().unwrap(), i);
        }
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), capacity);
    }

    #[test]
    fn test_growth_preserves_elements() {
        let mut buf = GrowableBuffer::with_capacity(2);
        for c in "hello world".chars() {
            buf.push(c).unwrap();
        }
        let text: String = buf.iter().collect();
        assert_eq!(text, "hello world");
    }

    #[test]
    fn test_geometric_growth() {
        let mut buf = GrowableBuffer::new();
        buf.push(1u8).unwrap();
        assert!(buf.capacity() >= MIN_CAPACITY);
        for i in 1..=MIN_CAPACITY as u8 {
            buf.push(i).unwrap();
        }
        assert!(buf.capacity() >= MIN_CAPACITY * 2);
    }

    #[test]
    fn test_index_from_both_ends() {
        let mut buf = GrowableBuffer::new();
        buf.extend_from_slice(&['a', 'b', 'c']).unwrap();
        assert_eq!(*buf.get(0).unwrap(), 'a');
        assert_eq!(*buf.get_from_end(0).unwrap(), 'c');
        assert_eq!(*buf.get_from_end(2).unwrap(), 'a');
        assert_eq!(
            buf.get(3),
            Err(Error::OutOfBounds { index: 3, len: 3 })
        );
        assert!(buf.get_from_end(3).is_err());
    }

    #[test]
    fn test_pop_empty() {
        let mut buf: GrowableBuffer<u32> = GrowableBuffer::new();
        assert_eq!(buf.pop(), Err(Error::Empty));
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut buf = GrowableBuffer::new();
        buf.extend_from_slice(&[1, 2, 3]).unwrap();
        let capacity = buf.capacity();
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), capacity);
    }
}
