/// Capped, most-recent-first event queue.
///
/// Every event stream (waste detections, flood alerts, safety alerts,
/// citizen reports) keeps only its newest entries. Pushing beyond the cap
/// evicts the oldest entry; evicted entries are dropped, not archived.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CappedQueue<T> {
    cap: usize,
    entries: VecDeque<T>,
}

impl<T> CappedQueue<T> {
    /// A cap of zero is raised to one so the newest entry is always visible.
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            cap,
            entries: VecDeque::with_capacity(cap),
        }
    }

    /// Prepends `entry` and returns the entry evicted to stay within the cap.
    pub fn push(&mut self, entry: T) -> Option<T> {
        self.entries.push_front(entry);
        if self.entries.len() > self.cap {
            self.entries.pop_back()
        } else {
            None
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recent entry.
    pub fn latest(&self) -> Option<&T> {
        self.entries.front()
    }

    /// Iterates newest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }
}

impl<'a, T> IntoIterator for &'a CappedQueue<T> {
    type Item = &'a T;
    type IntoIter = std::collections::vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_newest_first() {
        let mut queue = CappedQueue::new(3);
        queue.push(1);
        queue.push(2);
        queue.push(3);
        let order: Vec<_> = queue.iter().copied().collect();
        assert_eq!(order, vec![3, 2, 1]);
        assert_eq!(queue.latest(), Some(&3));
    }

    #[test]
    fn test_push_beyond_cap_evicts_oldest() {
        let mut queue = CappedQueue::new(2);
        assert_eq!(queue.push("a"), None);
        assert_eq!(queue.push("b"), None);
        assert_eq!(queue.push("c"), Some("a"), "oldest entry should be evicted");
        assert_eq!(queue.len(), 2);
        let order: Vec<_> = queue.iter().copied().collect();
        assert_eq!(order, vec!["c", "b"]);
    }

    #[test]
    fn test_zero_cap_is_raised_to_one() {
        let mut queue = CappedQueue::new(0);
        queue.push(10);
        queue.push(11);
        assert_eq!(queue.cap(), 1);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.latest(), Some(&11));
    }

    #[test]
    fn test_new_queue_is_empty() {
        let queue: CappedQueue<u8> = CappedQueue::new(20);
        assert!(queue.is_empty());
        assert!(queue.latest().is_none());
    }
}
