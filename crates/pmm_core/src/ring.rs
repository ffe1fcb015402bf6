//! Fixed-capacity FIFO used for the pressure history and the system log.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::VecDeque;

/// Default window for dashboard history and logs.
pub const DEFAULT_WINDOW: usize = 20;

/// Sliding window over the most recent `capacity` items.
///
/// Pushing onto a full buffer evicts the oldest item. Surviving items keep
/// their insertion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Create an empty buffer. A zero capacity is bumped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an item, returning the evicted one if the buffer was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    /// Most recently pushed item.
    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn oldest(&self) -> Option<&T> {
        self.items.front()
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Buffer pre-filled to capacity with `item`.
    pub fn filled(capacity: usize, item: T) -> Self {
        let mut buf = Self::new(capacity);
        for _ in 0..buf.capacity {
            buf.items.push_back(item.clone());
        }
        buf
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

/// Deserialization re-checks the capacity bound instead of trusting the input.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for RingBuffer<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw<U> {
            items: VecDeque<U>,
            capacity: usize,
        }

        let raw = Raw::<T>::deserialize(deserializer)?;
        if raw.capacity == 0 {
            return Err(D::Error::custom("ring buffer capacity must be positive"));
        }
        if raw.items.len() > raw.capacity {
            return Err(D::Error::custom(format!(
                "ring buffer holds {} items but capacity is {}",
                raw.items.len(),
                raw.capacity
            )));
        }
        Ok(Self {
            items: raw.items,
            capacity: raw.capacity,
        })
    }
}

impl<T> Default for RingBuffer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl<T> Extend<T> for RingBuffer<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<'a, T> IntoIterator for &'a RingBuffer<T> {
    type Item = &'a T;
    type IntoIter = std::collections::vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_under_capacity() {
        let mut buf = RingBuffer::new(3);
        assert!(buf.push(1).is_none());
        assert!(buf.push(2).is_none());
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.to_vec(), vec![1, 2]);
    }

    #[test]
    fn test_evicts_oldest_first() {
        let mut buf = RingBuffer::new(3);
        buf.extend([1, 2, 3]);
        assert_eq!(buf.push(4), Some(1));
        assert_eq!(buf.push(5), Some(2));
        assert_eq!(buf.to_vec(), vec![3, 4, 5]);
        assert_eq!(buf.oldest(), Some(&3));
        assert_eq!(buf.latest(), Some(&5));
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut buf = RingBuffer::default();
        for i in 0..100 {
            buf.push(i);
            assert!(buf.len() <= DEFAULT_WINDOW);
        }
        assert_eq!(buf.len(), DEFAULT_WINDOW);
        assert_eq!(buf.oldest(), Some(&80));
    }

    #[test]
    fn test_filled() {
        let buf = RingBuffer::filled(4, 0u8);
        assert_eq!(buf.len(), 4);
        assert!(buf.iter().all(|v| *v == 0));
    }

    #[test]
    fn test_zero_capacity_is_one() {
        let mut buf = RingBuffer::new(0);
        buf.push("a");
        buf.push("b");
        assert_eq!(buf.to_vec(), vec!["b"]);
    }

    #[test]
    fn test_deserialize_checks_capacity() {
        let buf: RingBuffer<u32> =
            serde_json::from_str(r#"{"items":[1,2],"capacity":3}"#).unwrap();
        assert_eq!(buf.to_vec(), vec![1, 2]);
        assert_eq!(buf.capacity(), 3);

        let overfull = serde_json::from_str::<RingBuffer<u32>>(r#"{"items":[1,2,3],"capacity":2}"#);
        let err = overfull.unwrap_err().to_string();
        assert!(err.contains("holds 3 items but capacity is 2"), "got: {err}");

        let zero = serde_json::from_str::<RingBuffer<u32>>(r#"{"items":[],"capacity":0}"#);
        assert!(zero.is_err());
    }
}
