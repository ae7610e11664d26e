//! Dense identifier types
//!
//! `StatId` indexes a snapshot array; `SlabHandle` indexes a slab slot.
//! Both are 32-bit and `Copy` so they can be stored inline in queues and
//! per-thread arenas without touching the allocator.

use core::fmt;

/// Identifier assigned to a stat name by the registry
///
/// Ids are handed out in insertion order starting at 0 and are stable for
/// the lifetime of the registry, so every thread that registers a stat under
/// the same name gets the same slot in a snapshot.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct StatId(u32);

impl StatId {
    #[inline]
    pub const fn new(id: u32) -> Self {
        StatId(id)
    }

    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Get as usize for indexing into a snapshot
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for StatId {
    #[inline]
    fn from(id: u32) -> Self {
        StatId(id)
    }
}

impl fmt::Debug for StatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StatId({})", self.0)
    }
}

impl fmt::Display for StatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to an occupied slot in a [`SlabAllocator`](crate::slab::SlabAllocator)
///
/// Not `Clone`: a handle is consumed by `release`, which keeps a single
/// owner for every slot.
#[derive(PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct SlabHandle(u32);

impl SlabHandle {
    #[inline]
    pub(crate) const fn new(index: u32) -> Self {
        SlabHandle(index)
    }

    /// Raw slot index
    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for SlabHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlabHandle({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_id_roundtrip() {
        let id = StatId::new(7);
        assert_eq!(id.as_u32(), 7);
        assert_eq!(id.as_usize(), 7);
        assert_eq!(StatId::from(7u32), id);
        assert_eq!(format!("{:?}", id), "StatId(7)");
        assert_eq!(format!("{}", id), "7");
    }

    #[test]
    fn test_stat_id_ordering() {
        assert!(StatId::new(0) < StatId::new(1));
    }
}
