//! Work queue abstraction for the thread pool
//!
//! The pool only relies on the enqueue/dequeue contract below, so other
//! queue disciplines can be plugged in.
//!
//! # Implementations
//! - `FifoQueue` - unbounded first-in first-out queue

mod fifo;

pub use fifo::FifoQueue;

/// Trait for pending-work queues
///
/// Implementations are not synchronized; the pool calls them with its own
/// mutex held.
pub trait WorkQueue<T>: Send {
    /// Append an item. Never blocks and never rejects.
    fn enqueue(&mut self, item: T);

    /// Remove the oldest item, or `None` when empty
    fn dequeue(&mut self) -> Option<T>;

    /// Number of queued items
    fn len(&self) -> usize;

    /// Largest number of items queued at once
    fn high_water(&self) -> usize;

    /// Check if empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
