//! Unbounded FIFO queue
//!
//! Backed by a ring buffer that owns its items. Sustained overload grows it
//! without limit; submitters are never blocked or refused.

use std::collections::VecDeque;

use super::WorkQueue;

/// Unbounded FIFO
pub struct FifoQueue<T> {
    items: VecDeque<T>,
    /// Largest length observed
    high_water: usize,
}

impl<T> FifoQueue<T> {
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
            high_water: 0,
        }
    }
}

impl<T> Default for FifoQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> WorkQueue<T> for FifoQueue<T> {
    #[inline]
    fn enqueue(&mut self, item: T) {
        self.items.push_back(item);
        self.high_water = self.high_water.max(self.items.len());
    }

    #[inline]
    fn dequeue(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    #[inline]
    fn len(&self) -> usize {
        self.items.len()
    }

    fn high_water(&self) -> usize {
        self.high_water
    }
}
