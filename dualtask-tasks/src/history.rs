use std::collections::VecDeque;
use std::num::NonZeroUsize;

/// FIFO holding the `capacity` most recently pushed items.
///
/// The N-back task compares each new word against [`front`](Self::front),
/// the item pushed exactly `capacity` pushes ago once the queue is full.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedHistoryQueue<T> {
    items: VecDeque<T>,
    capacity: NonZeroUsize,
}

impl<T> BoundedHistoryQueue<T> {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity.get()),
            capacity,
        }
    }

    /// Appends `item`, evicting and returning the oldest one when full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.is_full() {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    /// Oldest retained item, `None` while empty.
    pub fn front(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity.get()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T: PartialEq> BoundedHistoryQueue<T> {
    /// N-back match: only a full queue can match, and only on its oldest item.
    pub fn matches(&self, item: &T) -> bool {
        self.is_full() && self.front() == Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue<T>(n: usize) -> BoundedHistoryQueue<T> {
        BoundedHistoryQueue::new(NonZeroUsize::new(n).unwrap())
    }

    #[test]
    fn size_never_exceeds_capacity_and_front_is_oldest_retained() {
        for n in 1..=5 {
            let mut q = queue(n);
            for k in 1..=20usize {
                q.push(k);
                assert!(q.len() <= n);
                if k >= n {
                    // the (k - n + 1)-th inserted element
                    assert_eq!(q.front(), Some(&(k - n + 1)));
                    assert!(q.is_full());
                } else {
                    assert_eq!(q.front(), Some(&1));
                    assert!(!q.is_full());
                }
            }
        }
    }

    #[test]
    fn push_returns_evicted_item() {
        let mut q = queue(2);
        assert_eq!(q.push("a"), None);
        assert_eq!(q.push("b"), None);
        assert_eq!(q.push("c"), Some("a"));
        assert_eq!(q.iter().copied().collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn empty_front_is_none() {
        let q: BoundedHistoryQueue<u8> = queue(3);
        assert_eq!(q.front(), None);
        assert!(q.is_empty());
        assert!(!q.matches(&0));
    }

    #[test]
    fn partial_queue_never_matches_even_on_equal_content() {
        let mut q = queue(3);
        q.push("cat");
        q.push("cat");
        assert!(!q.matches(&"cat"));
        q.push("dog");
        assert!(q.matches(&"cat"));
        assert!(!q.matches(&"dog"));
    }
}
