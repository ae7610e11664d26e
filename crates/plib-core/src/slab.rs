//! Fixed-block slab allocator
//!
//! Recycles short-lived descriptors without going to the global allocator
//! on the hot path. Storage grows one fixed-size block at a time; blocks are
//! kept until the allocator is dropped. Freed slots go onto a LIFO free list
//! so the most recently released (cache-warm) slot is reused first.
//!
//! The allocator takes `&mut self` and is not synchronized. Callers that
//! share one across threads serialize access under their own lock.

use crate::id::SlabHandle;

/// Default slots per block
pub const DEFAULT_BLOCK_SIZE: usize = 64;

enum Entry<T> {
    Vacant { next: Option<u32> },
    Occupied(T),
}

/// Slab allocator handing out [`SlabHandle`]s
pub struct SlabAllocator<T> {
    /// Fixed-size blocks; never shrunk
    blocks: Vec<Box<[Entry<T>]>>,

    /// Head of the free list (slot index)
    free_head: Option<u32>,

    /// Slots per block
    block_size: usize,

    /// Number of occupied slots
    active: usize,
}

impl<T> SlabAllocator<T> {
    /// Create an empty allocator with the default block size
    pub fn new() -> Self {
        Self::with_block_size(DEFAULT_BLOCK_SIZE)
    }

    /// Create an empty allocator growing by `block_size` slots at a time
    pub fn with_block_size(block_size: usize) -> Self {
        Self {
            blocks: Vec::new(),
            free_head: None,
            block_size: block_size.max(1),
            active: 0,
        }
    }

    /// Store `value` in a free slot, growing by one block if none is free
    pub fn allocate(&mut self, value: T) -> SlabHandle {
        if self.free_head.is_none() {
            self.expand();
        }

        let idx = match self.free_head {
            Some(idx) => idx,
            // expand() always leaves at least block_size free slots
            None => unreachable!("slab free list empty after expand"),
        };
        let bs = self.block_size;
        let entry = &mut self.blocks[idx as usize / bs][idx as usize % bs];
        let next = match *entry {
            Entry::Vacant { next } => next,
            Entry::Occupied(_) => unreachable!("occupied slot on free list"),
        };
        *entry = Entry::Occupied(value);
        self.free_head = next;
        self.active += 1;
        SlabHandle::new(idx)
    }

    /// Return a slot to the free list and hand back its value
    ///
    /// Releasing a vacant slot (a handle from another allocator) is a caller
    /// bug. Debug builds assert; release builds return `None` and leave the
    /// free list untouched.
    pub fn release(&mut self, handle: SlabHandle) -> Option<T> {
        let idx = handle.index();
        let bs = self.block_size;
        let entry = self.blocks.get_mut(idx / bs)?.get_mut(idx % bs)?;

        if matches!(*entry, Entry::Vacant { .. }) {
            debug_assert!(false, "double release of slab slot {}", idx);
            return None;
        }

        let old = core::mem::replace(entry, Entry::Vacant { next: self.free_head });
        self.free_head = Some(idx as u32);
        self.active -= 1;
        match old {
            Entry::Occupied(v) => Some(v),
            Entry::Vacant { .. } => None,
        }
    }

    /// Borrow the value in an occupied slot
    pub fn get(&self, handle: &SlabHandle) -> Option<&T> {
        let idx = handle.index();
        match self.blocks.get(idx / self.block_size)?.get(idx % self.block_size)? {
            Entry::Occupied(v) => Some(v),
            Entry::Vacant { .. } => None,
        }
    }

    /// Mutably borrow the value in an occupied slot
    pub fn get_mut(&mut self, handle: &SlabHandle) -> Option<&mut T> {
        let idx = handle.index();
        let bs = self.block_size;
        match self.blocks.get_mut(idx / bs)?.get_mut(idx % bs)? {
            Entry::Occupied(v) => Some(v),
            Entry::Vacant { .. } => None,
        }
    }

    /// Number of occupied slots
    #[inline]
    pub fn active(&self) -> usize {
        self.active
    }

    /// Total slots across all blocks
    #[inline]
    pub fn capacity(&self) -> usize {
        self.blocks.len() * self.block_size
    }

    /// Number of blocks acquired so far
    #[inline]
    pub fn blocks(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Acquire a new block and thread all its slots onto the free list
    fn expand(&mut self) {
        let base = self.capacity();
        debug_assert!(base + self.block_size <= u32::MAX as usize);

        let last = self.free_head;
        let bs = self.block_size;
        let block: Box<[Entry<T>]> = (0..bs)
            .map(|i| Entry::Vacant {
                next: if i + 1 < bs {
                    Some((base + i + 1) as u32)
                } else {
                    last
                },
            })
            .collect();

        self.blocks.push(block);
        self.free_head = Some(base as u32);
        tracing::trace!(blocks = self.blocks.len(), block_size = bs, "slab expanded");
    }
}

impl<T> Default for SlabAllocator<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_sequential() {
        let mut slab = SlabAllocator::with_block_size(4);

        let a = slab.allocate("a");
        let b = slab.allocate("b");
        let c = slab.allocate("c");

        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(c.index(), 2);
        assert_eq!(slab.active(), 3);
        assert_eq!(slab.get(&b), Some(&"b"));
    }

    #[test]
    fn test_release_reuse_lifo() {
        let mut slab = SlabAllocator::with_block_size(8);

        let a = slab.allocate(1u32);
        let b = slab.allocate(2u32);
        let a_idx = a.index();
        let b_idx = b.index();

        assert_eq!(slab.release(a), Some(1));
        assert_eq!(slab.release(b), Some(2));
        assert_eq!(slab.active(), 0);

        // Most recently released slot comes back first
        let c = slab.allocate(3u32);
        assert_eq!(c.index(), b_idx);
        let d = slab.allocate(4u32);
        assert_eq!(d.index(), a_idx);
    }

    #[test]
    fn test_grows_by_block() {
        let mut slab = SlabAllocator::with_block_size(4);
        assert_eq!(slab.blocks(), 0);

        let handles: Vec<_> = (0..9).map(|i| slab.allocate(i)).collect();
        assert_eq!(slab.blocks(), 3);
        assert_eq!(slab.capacity(), 12);
        assert_eq!(slab.active(), 9);

        // Releasing never gives blocks back
        for h in handles {
            slab.release(h);
        }
        assert_eq!(slab.blocks(), 3);
        assert_eq!(slab.active(), 0);
    }

    #[test]
    fn test_get_mut() {
        let mut slab = SlabAllocator::new();
        let h = slab.allocate(String::from("job"));
        slab.get_mut(&h).unwrap().push_str("-1");
        assert_eq!(slab.release(h).as_deref(), Some("job-1"));
    }

    #[test]
    fn test_values_dropped_with_allocator() {
        use std::rc::Rc;

        let tracker = Rc::new(());
        {
            let mut slab = SlabAllocator::with_block_size(2);
            let _h1 = slab.allocate(Rc::clone(&tracker));
            let _h2 = slab.allocate(Rc::clone(&tracker));
            assert_eq!(Rc::strong_count(&tracker), 3);
        }
        assert_eq!(Rc::strong_count(&tracker), 1);
    }
}
