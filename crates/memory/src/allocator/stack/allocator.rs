//! Stack heap implementation

use smallvec::SmallVec;
#[cfg(feature = "logging")]
use tracing::{debug, trace};

use super::config::StackHeapConfig;
use super::frame::StackFrame;
use super::marker::StackMarker;
use crate::allocator::report::{self, BlockInfo, TagUsage};
use crate::allocator::{Address, AllocatorId, AllocatorStats, HeapAllocator, Region};
use crate::core::traits::{MemoryUsage, StatisticsProvider};
use crate::core::types::BlockStatus;
use crate::core::types::alignment::MIN_ALIGN;
use crate::core::types::guard::{GUARD_OVERHEAD, GUARD_SIZE};
use crate::core::types::stack::DEFAULT_MAX_MARKS;
use crate::error::{MemoryError, MemoryResult};
use crate::utils::{checked_align_up, checked_block_size};

const HEAP_NAME: &str = "stack";

/// Diagnostic record of one stack allocation
#[derive(Debug, Clone, Copy)]
struct StackBlock {
    offset: usize,
    payload: usize,
    size: usize,
    requested: usize,
    tag: Option<&'static str>,
}

/// Bump allocator with LIFO mark/release
///
/// Allocation moves the growth cursor forward. [`mark`](Self::mark) saves the
/// cursor and [`release`](Self::release) rewinds to the most recent mark,
/// reclaiming everything allocated since in one step. There is no per-block
/// release.
///
/// # Example
/// ```
/// use forge_memory::allocator::StackHeap;
///
/// let mut heap = StackHeap::new(256)?;
/// heap.allocate(16, None)?;
/// heap.mark()?;
/// heap.allocate(64, Some("scratch"))?;
/// assert_eq!(heap.release(), 64);
/// assert_eq!(heap.used_bytes(), 16);
/// # Ok::<(), forge_memory::MemoryError>(())
/// ```
pub struct StackHeap<'a> {
    id: AllocatorId,
    region: Region<'a>,
    config: StackHeapConfig,

    cursor: usize,
    marks: SmallVec<[usize; DEFAULT_MAX_MARKS]>,
    blocks: Vec<StackBlock>,
    stats: AllocatorStats,
}

impl StackHeap<'static> {
    /// Creates a stack heap over an owned region of `size` bytes
    pub fn new(size: usize) -> MemoryResult<Self> {
        Self::with_config(size, StackHeapConfig::default())
    }

    pub fn with_config(size: usize, config: StackHeapConfig) -> MemoryResult<Self> {
        Self::build(Region::owned(size)?, config)
    }
}

impl<'a> StackHeap<'a> {
    /// Creates a stack heap over a caller-owned buffer
    pub fn from_buffer(buffer: &'a mut [u8], config: StackHeapConfig) -> MemoryResult<Self> {
        Self::build(Region::external(buffer)?, config)
    }

    fn build(region: Region<'a>, config: StackHeapConfig) -> MemoryResult<Self> {
        config.validate()?;
        let heap = Self {
            id: AllocatorId::new(),
            region,
            marks: SmallVec::new(),
            cursor: 0,
            blocks: Vec::new(),
            stats: AllocatorStats::new(),
            config,
        };

        #[cfg(feature = "logging")]
        debug!(
            heap = %heap.id,
            capacity = heap.region.capacity(),
            max_marks = heap.config.max_marks,
            "stack heap created"
        );

        Ok(heap)
    }

    /// Allocates `size` bytes at the growth cursor
    pub fn allocate(&mut self, size: usize, tag: Option<&'static str>) -> MemoryResult<Address> {
        match self.try_allocate(size, tag) {
            Ok(address) => Ok(address),
            Err(error) => {
                if self.config.track_stats {
                    self.stats.record_failure();
                }
                Err(error)
            }
        }
    }

    fn try_allocate(&mut self, size: usize, tag: Option<&'static str>) -> MemoryResult<Address> {
        if size == 0 {
            return Err(MemoryError::ZeroSizedAllocation);
        }

        let guards = if self.config.bounds_check { GUARD_OVERHEAD } else { 0 };
        let required = checked_align_up(size, MIN_ALIGN)
            .and_then(|payload| checked_block_size(&[payload, guards]))
            .map_err(|_| MemoryError::out_of_memory(HEAP_NAME, size, self.free_bytes()))?;
        let fits = self
            .cursor
            .checked_add(required)
            .is_some_and(|end| end <= self.region.capacity());
        if !fits {
            return Err(MemoryError::out_of_memory(
                HEAP_NAME,
                size,
                self.free_bytes(),
            ));
        }

        let offset = self.cursor;
        let payload = offset + if self.config.bounds_check { GUARD_SIZE } else { 0 };
        if self.config.bounds_check {
            self.region.write_guard(offset);
            self.region.write_guard(payload + size);
        }
        if let Some(pattern) = self.config.alloc_pattern {
            self.region.fill(payload..payload + size, pattern);
        }

        self.blocks.push(StackBlock {
            offset,
            payload,
            size: required,
            requested: size,
            tag,
        });
        self.cursor += required;
        if self.config.track_stats {
            self.stats.record_allocation(required);
        }

        #[cfg(feature = "logging")]
        trace!(heap = %self.id, offset, size, required, tag, "allocated");

        Ok(Address::new(self.id, payload))
    }

    /// Saves the growth cursor on the mark stack
    pub fn mark(&mut self) -> MemoryResult<StackMarker> {
        if self.marks.len() >= self.config.max_marks {
            return Err(MemoryError::mark_stack_overflow(self.config.max_marks));
        }
        self.marks.push(self.cursor);
        Ok(StackMarker {
            depth: self.marks.len(),
            position: self.cursor,
        })
    }

    /// Pops the most recent mark and rewinds to it
    ///
    /// With no marks present the heap is reset to the region start. Returns
    /// the number of bytes reclaimed.
    pub fn release(&mut self) -> usize {
        let target = self.marks.pop().unwrap_or(0);
        self.unwind(target)
    }

    /// Rewinds to `marker`, discarding it and every mark pushed after it
    pub fn release_to(&mut self, marker: StackMarker) -> MemoryResult<usize> {
        let index = marker
            .depth
            .checked_sub(1)
            .filter(|&index| self.marks.get(index) == Some(&marker.position));
        let Some(index) = index else {
            return Err(MemoryError::invalid_state(
                "marker is no longer on the mark stack",
            ));
        };

        self.marks.truncate(index);
        Ok(self.unwind(marker.position))
    }

    /// Resets the cursor and drops every mark
    pub fn release_all(&mut self) {
        self.marks.clear();
        self.unwind(0);
    }

    fn unwind(&mut self, position: usize) -> usize {
        let keep = self.blocks.partition_point(|block| block.offset < position);
        let (count, bytes) = self.blocks[keep..]
            .iter()
            .fold((0, 0), |(count, bytes), block| (count + 1, bytes + block.size));
        self.blocks.truncate(keep);

        let reclaimed = self.cursor - position;
        self.cursor = position;
        if self.config.track_stats && count > 0 {
            self.stats.record_bulk_release(count, bytes);
        }

        #[cfg(feature = "logging")]
        trace!(heap = %self.id, position, reclaimed, blocks = count, "unwound");

        reclaimed
    }

    /// Opens a scope that releases back to the current position when dropped
    pub fn frame(&mut self) -> MemoryResult<StackFrame<'_, 'a>> {
        StackFrame::new(self)
    }

    #[inline]
    pub fn mark_count(&self) -> usize {
        self.marks.len()
    }

    /// Region capacity in bytes
    #[inline]
    pub fn size(&self) -> usize {
        self.region.capacity()
    }

    #[inline]
    pub fn used_bytes(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn free_bytes(&self) -> usize {
        self.region.capacity() - self.cursor
    }

    #[inline]
    pub fn allocation_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn id(&self) -> AllocatorId {
        self.id
    }

    pub fn config(&self) -> &StackHeapConfig {
        &self.config
    }

    /// Whether `address` is the payload of a live allocation
    pub fn is_valid_pointer(&self, address: Address) -> bool {
        self.find(address).is_some()
    }

    /// Whether `address` falls anywhere inside this heap's region
    pub fn contains(&self, address: Address) -> bool {
        address.heap() == self.id && address.offset() < self.region.capacity()
    }

    pub fn set_bounds_check(&mut self, enabled: bool) -> MemoryResult<()> {
        if !self.blocks.is_empty() {
            return Err(MemoryError::invalid_state(
                "bounds checking can only be toggled on an empty heap",
            ));
        }
        self.config.bounds_check = enabled;
        Ok(())
    }

    #[inline]
    pub fn is_bounds_check_enabled(&self) -> bool {
        self.config.bounds_check
    }

    /// Verifies the guard tags of every live allocation
    pub fn bounds_check(&self) -> MemoryResult<()> {
        if !self.config.bounds_check {
            return Ok(());
        }
        for block in &self.blocks {
            if !self.region.guard_intact(block.offset)
                || !self.region.guard_intact(block.payload + block.requested)
            {
                return Err(MemoryError::corruption(
                    "stack heap",
                    &format!("guard of allocation at {:#x} overwritten", block.offset),
                ));
            }
        }
        Ok(())
    }

    pub fn payload(&self, address: Address) -> MemoryResult<&[u8]> {
        let block = self.find_checked(address)?;
        Ok(self
            .region
            .slice(block.payload..block.payload + block.requested))
    }

    pub fn payload_mut(&mut self, address: Address) -> MemoryResult<&mut [u8]> {
        let block = self.find_checked(address)?;
        Ok(self
            .region
            .slice_mut(block.payload..block.payload + block.requested))
    }

    /// Raw backing bytes
    pub fn region(&self) -> &[u8] {
        self.region.bytes()
    }

    pub fn region_mut(&mut self) -> &mut [u8] {
        self.region.bytes_mut()
    }

    /// Live allocations in address order
    pub fn blocks(&self) -> impl Iterator<Item = BlockInfo> + '_ {
        self.blocks.iter().map(|block| BlockInfo {
            offset: block.offset,
            size: block.size,
            requested: block.requested,
            status: BlockStatus::Normal,
            tag: block.tag,
        })
    }

    pub fn usage_by_tag(&self) -> Vec<TagUsage> {
        report::usage_by_tag(self.blocks.iter().map(|block| (block.tag, block.size)))
    }

    fn find(&self, address: Address) -> Option<&StackBlock> {
        if address.heap() != self.id {
            return None;
        }
        self.blocks
            .binary_search_by_key(&address.offset(), |block| block.payload)
            .ok()
            .map(|index| &self.blocks[index])
    }

    fn find_checked(&self, address: Address) -> MemoryResult<StackBlock> {
        if !self.contains(address) {
            return Err(MemoryError::foreign_address(address.offset()));
        }
        self.find(address)
            .copied()
            .ok_or_else(|| MemoryError::invalid_address(address.offset()))
    }
}

impl HeapAllocator for StackHeap<'_> {
    fn allocate(&mut self, size: usize, tag: Option<&'static str>) -> MemoryResult<Address> {
        StackHeap::allocate(self, size, tag)
    }

    /// Unwinds to the most recent mark, which must lie at or below `address`
    ///
    /// An address allocated before that mark is rejected with
    /// [`MemoryError::InvalidState`] and nothing is reclaimed.
    fn release(&mut self, address: Address) -> MemoryResult<()> {
        let block = self.find_checked(address)?;
        let floor = self.marks.last().copied().unwrap_or(0);
        if block.offset < floor {
            return Err(MemoryError::invalid_state(
                "address precedes the most recent mark",
            ));
        }
        StackHeap::release(self);
        Ok(())
    }

    fn owns(&self, address: Address) -> bool {
        self.is_valid_pointer(address)
    }

    fn name(&self) -> &'static str {
        HEAP_NAME
    }
}

impl MemoryUsage for StackHeap<'_> {
    fn used_memory(&self) -> usize {
        self.cursor
    }

    fn available_memory(&self) -> Option<usize> {
        Some(self.free_bytes())
    }
}

impl StatisticsProvider for StackHeap<'_> {
    fn statistics(&self) -> AllocatorStats {
        self.stats
    }

    fn reset_statistics(&mut self) {
        self.stats.reset();
    }

    fn statistics_enabled(&self) -> bool {
        self.config.track_stats
    }
}

impl core::fmt::Debug for StackHeap<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StackHeap")
            .field("id", &self.id)
            .field("capacity", &self.region.capacity())
            .field("cursor", &self.cursor)
            .field("marks", &self.marks.as_slice())
            .field("allocations", &self.blocks.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocations_are_aligned_and_contiguous() {
        let mut heap = StackHeap::with_config(128, StackHeapConfig::production()).unwrap();
        let a = heap.allocate(5, None).unwrap();
        let b = heap.allocate(4, None).unwrap();
        assert_eq!(a.offset(), 0);
        assert_eq!(b.offset(), 8);
        assert_eq!(heap.used_bytes(), 12);
    }

    #[test]
    fn exact_fill_is_allowed() {
        let mut heap = StackHeap::with_config(64, StackHeapConfig::production()).unwrap();
        heap.allocate(64, None).unwrap();
        assert_eq!(heap.free_bytes(), 0);
        assert!(matches!(
            heap.allocate(1, None),
            Err(MemoryError::OutOfMemory { .. })
        ));
    }

    #[test]
    fn guarded_layout() {
        let mut heap = StackHeap::with_config(64, StackHeapConfig::debug()).unwrap();
        let a = heap.allocate(6, None).unwrap();
        assert_eq!(a.offset(), GUARD_SIZE);
        assert_eq!(heap.used_bytes(), 8 + GUARD_OVERHEAD);
        heap.bounds_check().unwrap();
    }

    #[test]
    fn stale_marker_is_rejected() {
        let mut heap = StackHeap::new(64).unwrap();
        let marker = heap.mark().unwrap();
        heap.release();
        assert!(matches!(
            heap.release_to(marker),
            Err(MemoryError::InvalidState { .. })
        ));
    }
}
