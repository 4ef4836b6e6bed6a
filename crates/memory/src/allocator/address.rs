//! Allocator identities and region-relative addresses

use core::fmt;
use core::num::NonZeroU64;
use core::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier of a heap or pool instance
///
/// Uses `NonZeroU64` so `Option<AllocatorId>` stays the size of the id, and
/// keeps allocator identities from being mixed up with raw integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AllocatorId(NonZeroU64);

impl AllocatorId {
    /// Generate a new unique allocator ID
    ///
    /// IDs are generated atomically and are unique within the process.
    #[must_use]
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        let id = COUNTER.fetch_add(1, Ordering::Relaxed);
        // A u64 counter starting at 1 does not wrap in practice; MAX is a safe fallback.
        Self(NonZeroU64::new(id).unwrap_or(NonZeroU64::MAX))
    }

    /// Raw id value
    #[inline]
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl Default for AllocatorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AllocatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Location of a payload inside a heap's backing region
///
/// An address is only meaningful to the heap that produced it: it pairs the
/// heap's [`AllocatorId`] with the payload's byte offset from the start of
/// the region. Handing it to any other heap is reported as a foreign address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    heap: AllocatorId,
    offset: usize,
}

impl Address {
    pub(crate) fn new(heap: AllocatorId, offset: usize) -> Self {
        Self { heap, offset }
    }

    /// Heap that issued this address
    #[inline]
    pub fn heap(self) -> AllocatorId {
        self.heap
    }

    /// Byte offset of the payload from the start of the region
    #[inline]
    pub fn offset(self) -> usize {
        self.offset
    }

    /// Same heap, offset moved by `delta` bytes
    #[cfg(test)]
    #[must_use]
    pub(crate) fn wrapping_add(self, delta: usize) -> Self {
        Self {
            heap: self.heap,
            offset: self.offset.wrapping_add(delta),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{:#x}", self.heap, self.offset)
    }
}
