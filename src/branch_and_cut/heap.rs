//! Min-heap of pending nodes keyed on their relaxed bound.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

struct Entry<T> {
    bound: f64,
    seq: u64,
    item: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Smallest bound on top; among equal bounds the newest entry wins.
        other
            .bound
            .total_cmp(&self.bound)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Pops the entry with the smallest bound, most recently pushed first on ties.
pub struct NodeHeap<T> {
    heap: BinaryHeap<Entry<T>>,
    seq: u64,
}

impl<T> Default for NodeHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NodeHeap<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            seq: 0,
        }
    }

    pub fn push(&mut self, bound: f64, item: T) {
        self.heap.push(Entry {
            bound,
            seq: self.seq,
            item,
        });
        self.seq += 1;
    }

    pub fn pop(&mut self) -> Option<(f64, T)> {
        self.heap.pop().map(|entry| (entry.bound, entry.item))
    }

    pub fn peek(&self) -> Option<(f64, &T)> {
        self.heap.peek().map(|entry| (entry.bound, &entry.item))
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
