//! Allocator contract shared by the heaps
//!
//! Callers that only need "give me bytes, take them back" depend on
//! [`HeapAllocator`] rather than on a concrete heap type.

use super::Address;
use crate::error::MemoryResult;

/// Common allocate/release capability
///
/// # Contract
///
/// - `allocate` with `size == 0` returns [`MemoryError::ZeroSizedAllocation`]
/// - exhaustion is reported as [`MemoryError::OutOfMemory`] and is retryable
/// - `release` of an address this allocator did not issue, or has already
///   reclaimed, returns an error and leaves the allocator unchanged
///
/// [`MemoryError::ZeroSizedAllocation`]: crate::error::MemoryError::ZeroSizedAllocation
/// [`MemoryError::OutOfMemory`]: crate::error::MemoryError::OutOfMemory
pub trait HeapAllocator {
    /// Allocates `size` bytes, optionally tagged with the requesting call site
    fn allocate(&mut self, size: usize, tag: Option<&'static str>) -> MemoryResult<Address>;

    /// Returns an allocation to the allocator
    fn release(&mut self, address: Address) -> MemoryResult<()>;

    /// Whether `address` refers to a live allocation of this allocator
    fn owns(&self, address: Address) -> bool;

    /// Short allocator name used in errors and logs
    fn name(&self) -> &'static str;
}

impl<A: HeapAllocator + ?Sized> HeapAllocator for &mut A {
    #[inline]
    fn allocate(&mut self, size: usize, tag: Option<&'static str>) -> MemoryResult<Address> {
        (**self).allocate(size, tag)
    }

    #[inline]
    fn release(&mut self, address: Address) -> MemoryResult<()> {
        (**self).release(address)
    }

    #[inline]
    fn owns(&self, address: Address) -> bool {
        (**self).owns(address)
    }

    #[inline]
    fn name(&self) -> &'static str {
        (**self).name()
    }
}
