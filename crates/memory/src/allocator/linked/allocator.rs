//! Linked heap implementation

use hashbrown::HashMap;
#[cfg(feature = "logging")]
use tracing::{debug, trace, warn};

use super::block::{Block, BlockArena, BlockId};
use super::config::{LinkedHeapConfig, LockedReleasePolicy};
use super::free_list::FreeList;
use crate::allocator::report::{self, BlockInfo, HeapReport, TagUsage};
use crate::allocator::{
    Address, AllocatorId, AllocatorStats, FragmentationStats, HeapAllocator, Region,
};
use crate::core::traits::{MemoryUsage, StatisticsProvider};
use crate::core::types::BlockStatus;
use crate::core::types::alignment::MIN_ALIGN;
use crate::core::types::guard::{GUARD_OVERHEAD, GUARD_SIZE};
use crate::core::types::linked::HEADER_SIZE;
use crate::error::{MemoryError, MemoryResult};
use crate::utils::{checked_align_up, checked_block_size};

const HEAP_NAME: &str = "linked";

/// Smallest remainder worth carving into its own free block
const MIN_SPLIT_REMAINDER: usize = HEADER_SIZE + MIN_ALIGN;

/// General-purpose allocator over a fixed region
///
/// Blocks form an address-ordered chain that spans `[0, growth_cursor)`.
/// Allocation searches the free list first-fit and falls back to bumping the
/// growth cursor; release returns the block to the free list, shrinks the
/// chain while its tail is free and merges the released block with its free
/// neighbours.
///
/// # Example
/// ```
/// use forge_memory::allocator::LinkedHeap;
///
/// let mut heap = LinkedHeap::new(1024)?;
/// let a = heap.allocate(64, Some("sprites"))?;
/// heap.payload_mut(a)?.fill(7);
/// heap.release(a)?;
/// assert_eq!(heap.used_bytes(), 0);
/// # Ok::<(), forge_memory::MemoryError>(())
/// ```
pub struct LinkedHeap<'a> {
    id: AllocatorId,
    region: Region<'a>,
    config: LinkedHeapConfig,

    blocks: BlockArena,
    by_offset: HashMap<usize, BlockId>,
    head: Option<BlockId>,
    tail: Option<BlockId>,
    free: FreeList,

    cursor: usize,
    used: usize,
    stats: AllocatorStats,
}

impl LinkedHeap<'static> {
    /// Creates a heap over an owned region of `size` bytes
    pub fn new(size: usize) -> MemoryResult<Self> {
        Self::with_config(size, LinkedHeapConfig::default())
    }

    /// Creates a heap over an owned region with custom configuration
    pub fn with_config(size: usize, config: LinkedHeapConfig) -> MemoryResult<Self> {
        Self::build(Region::owned(size)?, config)
    }
}

impl<'a> LinkedHeap<'a> {
    /// Creates a heap over a caller-owned buffer
    ///
    /// The heap never frees `buffer`; it is handed back when the heap is
    /// dropped.
    pub fn from_buffer(buffer: &'a mut [u8], config: LinkedHeapConfig) -> MemoryResult<Self> {
        Self::build(Region::external(buffer)?, config)
    }

    fn build(region: Region<'a>, config: LinkedHeapConfig) -> MemoryResult<Self> {
        config.validate()?;
        let heap = Self {
            id: AllocatorId::new(),
            region,
            config,
            blocks: BlockArena::new(),
            by_offset: HashMap::new(),
            head: None,
            tail: None,
            free: FreeList::new(),
            cursor: 0,
            used: 0,
            stats: AllocatorStats::new(),
        };

        #[cfg(feature = "logging")]
        debug!(
            heap = %heap.id,
            capacity = heap.region.capacity(),
            owned = heap.region.is_owned(),
            bounds_check = heap.config.bounds_check,
            "linked heap created"
        );

        Ok(heap)
    }

    // ------------------------------------------------------------------
    // Allocation
    // ------------------------------------------------------------------

    /// Allocates a normal block
    pub fn allocate(&mut self, size: usize, tag: Option<&'static str>) -> MemoryResult<Address> {
        self.allocate_block(size, BlockStatus::Normal, tag)
    }

    /// Allocates a block that should only be released with unlock
    pub fn allocate_locked(
        &mut self,
        size: usize,
        tag: Option<&'static str>,
    ) -> MemoryResult<Address> {
        self.allocate_block(size, BlockStatus::Locked, tag)
    }

    /// Allocates a block that only [`release_all`](Self::release_all) reclaims
    pub fn allocate_fixed(
        &mut self,
        size: usize,
        tag: Option<&'static str>,
    ) -> MemoryResult<Address> {
        self.allocate_block(size, BlockStatus::Fixed, tag)
    }

    fn allocate_block(
        &mut self,
        size: usize,
        status: BlockStatus,
        tag: Option<&'static str>,
    ) -> MemoryResult<Address> {
        match self.try_allocate_block(size, status, tag) {
            Ok(address) => Ok(address),
            Err(error) => {
                if self.config.track_stats {
                    self.stats.record_failure();
                }
                Err(error)
            }
        }
    }

    fn try_allocate_block(
        &mut self,
        size: usize,
        status: BlockStatus,
        tag: Option<&'static str>,
    ) -> MemoryResult<Address> {
        if size == 0 {
            return Err(MemoryError::ZeroSizedAllocation);
        }

        let required = checked_align_up(size, MIN_ALIGN)
            .and_then(|payload| {
                checked_block_size(&[payload, HEADER_SIZE, self.guard_overhead()])
            })
            .map_err(|_| {
                MemoryError::out_of_memory(HEAP_NAME, size, self.unreserved_capacity())
            })?;

        let reusable = if self.free.is_empty() {
            None
        } else {
            self.free.find_first(&self.blocks, required)
        };
        let id = match reusable {
            Some(id) => self.reuse_free_block(id, required)?,
            None => self.grow(size, required)?,
        };

        let block = &mut self.blocks[id];
        block.status = status;
        block.requested = size;
        block.tag = tag;
        let (offset, block_size) = (block.offset, block.size);
        self.used += block_size;

        let payload_start = offset + HEADER_SIZE + self.lead_guard();
        if self.config.bounds_check {
            self.region.write_guard(offset + HEADER_SIZE);
            self.region.write_guard(payload_start + size);
        }
        if let Some(pattern) = self.config.alloc_pattern {
            self.region.fill(payload_start..payload_start + size, pattern);
        }
        if self.config.track_stats {
            self.stats.record_allocation(block_size);
        }

        #[cfg(feature = "logging")]
        trace!(
            heap = %self.id,
            offset,
            size,
            block_size,
            %status,
            tag,
            "allocated"
        );

        Ok(Address::new(self.id, payload_start))
    }

    /// Takes a free block off the list, splitting off any large surplus
    fn reuse_free_block(&mut self, id: BlockId, required: usize) -> MemoryResult<BlockId> {
        self.free.remove(&mut self.blocks, id);

        let block = self.blocks[id];
        let surplus = block.size - required;
        if surplus > self.config.split_tolerance && surplus >= MIN_SPLIT_REMAINDER {
            let mut remainder = Block::free(block.offset + required, surplus);
            remainder.prev = Some(id);
            remainder.next = block.next;
            let remainder_id = self.blocks.insert(remainder)?;

            match block.next {
                Some(next) => self.blocks[next].prev = Some(remainder_id),
                None => self.tail = Some(remainder_id),
            }
            let current = &mut self.blocks[id];
            current.next = Some(remainder_id);
            current.size = required;

            self.by_offset.insert(remainder.offset, remainder_id);
            self.free.push(&mut self.blocks, remainder_id);
        }

        Ok(id)
    }

    /// Appends a new tail block at the growth cursor
    fn grow(&mut self, size: usize, required: usize) -> MemoryResult<BlockId> {
        let fits = self
            .cursor
            .checked_add(required)
            .is_some_and(|end| end < self.region.capacity());
        if !fits {
            return Err(MemoryError::out_of_memory(
                HEAP_NAME,
                size,
                self.unreserved_capacity(),
            ));
        }

        let mut block = Block::free(self.cursor, required);
        block.prev = self.tail;
        let id = self.blocks.insert(block)?;

        match self.tail {
            Some(tail) => self.blocks[tail].next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.by_offset.insert(block.offset, id);
        self.cursor += required;

        Ok(id)
    }

    // ------------------------------------------------------------------
    // Release
    // ------------------------------------------------------------------

    /// Releases a block without unlocking it
    ///
    /// Addresses carry no generation. After [`release_all`](Self::release_all)
    /// or after the span is handed out again, a stale address may resolve to
    /// a newer block. Callers must not release an address twice or keep one
    /// past `release_all`.
    pub fn release(&mut self, address: Address) -> MemoryResult<()> {
        self.release_with(address, false)
    }

    /// Releases a block; `unlock` acknowledges that a locked block is expected
    ///
    /// Fixed blocks are never released here. A locked block released without
    /// `unlock` is handled according to [`LockedReleasePolicy`].
    pub fn release_with(&mut self, address: Address, unlock: bool) -> MemoryResult<()> {
        let id = self.resolve(address)?;
        let block = self.blocks[id];

        match block.status {
            BlockStatus::Free => return Err(MemoryError::double_release(address.offset())),
            BlockStatus::Fixed => {
                return Err(MemoryError::fixed_block_release(address.offset()));
            }
            BlockStatus::Locked if !unlock => match self.config.locked_release {
                LockedReleasePolicy::Reject => {
                    return Err(MemoryError::locked_block_release(address.offset()));
                }
                LockedReleasePolicy::Warn => {
                    #[cfg(feature = "logging")]
                    warn!(
                        heap = %self.id,
                        offset = address.offset(),
                        tag = block.tag,
                        "locked block released without unlock"
                    );
                }
            },
            BlockStatus::Locked | BlockStatus::Normal => {}
        }

        if let Some(pattern) = self.config.dealloc_pattern {
            let start = address.offset();
            self.region.fill(start..start + block.requested, pattern);
        }

        let released = &mut self.blocks[id];
        released.status = BlockStatus::Free;
        released.requested = 0;
        released.tag = None;
        self.used -= block.size;
        self.free.push(&mut self.blocks, id);
        if self.config.track_stats {
            self.stats.record_deallocation(block.size);
        }

        #[cfg(feature = "logging")]
        trace!(heap = %self.id, offset = block.offset, size = block.size, "released");

        self.shrink_tail();
        if self.by_offset.get(&block.offset) == Some(&id) {
            self.coalesce_around(id);
        }
        Ok(())
    }

    /// Resets the heap to empty, reclaiming every block including fixed ones
    pub fn release_all(&mut self) {
        let live = self
            .chain()
            .filter(|&id| self.blocks[id].status.is_live())
            .count();
        if self.config.track_stats {
            self.stats.record_bulk_release(live, self.used);
        }
        if let Some(pattern) = self.config.dealloc_pattern {
            self.region.fill(0..self.cursor, pattern);
        }

        #[cfg(feature = "logging")]
        debug!(heap = %self.id, blocks = live, bytes = self.used, "release_all");

        self.blocks.clear();
        self.by_offset.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.cursor = 0;
        self.used = 0;
    }

    /// Full left-to-right pass merging every run of adjacent free blocks
    ///
    /// Returns the number of merges performed. Every release already merges
    /// the freed block with its free neighbours, so two adjacent free blocks
    /// never exist between calls and this returns 0. It remains as an
    /// explicit consistency pass.
    pub fn defragment(&mut self) -> usize {
        let mut merges = 0;
        let mut current = self.head;
        while let Some(id) = current {
            if self.blocks[id].status == BlockStatus::Free {
                merges += self.merge_forward(id);
            }
            current = self.blocks[id].next;
        }
        let reclaimed = self.shrink_tail();

        #[cfg(feature = "logging")]
        debug!(heap = %self.id, merges, reclaimed, "defragmented");
        #[cfg(not(feature = "logging"))]
        let _ = reclaimed;

        merges
    }

    /// Retreats the growth cursor while the tail block is free
    fn shrink_tail(&mut self) -> usize {
        let mut reclaimed = 0;
        while let Some(tail) = self.tail
            && self.blocks[tail].status == BlockStatus::Free
        {
            self.free.remove(&mut self.blocks, tail);
            let block = self.blocks.remove(tail);
            self.by_offset.remove(&block.offset);

            match block.prev {
                Some(prev) => self.blocks[prev].next = None,
                None => self.head = None,
            }
            self.tail = block.prev;
            self.cursor -= block.size;
            reclaimed += block.size;
        }
        reclaimed
    }

    /// Merges the free run containing `id` into its leftmost block
    fn coalesce_around(&mut self, id: BlockId) -> usize {
        let mut leftmost = id;
        while let Some(prev) = self.blocks[leftmost].prev
            && self.blocks[prev].status == BlockStatus::Free
        {
            leftmost = prev;
        }
        self.merge_forward(leftmost)
    }

    /// Absorbs every free block directly following `id`
    fn merge_forward(&mut self, id: BlockId) -> usize {
        let mut merges = 0;
        while let Some(next) = self.blocks[id].next
            && self.blocks[next].status == BlockStatus::Free
        {
            self.free.remove(&mut self.blocks, next);
            let absorbed = self.blocks.remove(next);
            self.by_offset.remove(&absorbed.offset);

            let block = &mut self.blocks[id];
            block.size += absorbed.size;
            block.next = absorbed.next;
            match absorbed.next {
                Some(after) => self.blocks[after].prev = Some(id),
                None => self.tail = Some(id),
            }
            merges += 1;
        }
        merges
    }

    // ------------------------------------------------------------------
    // Bounds checking
    // ------------------------------------------------------------------

    /// Turns guard tags on or off; only allowed while the heap holds no blocks
    pub fn set_bounds_check(&mut self, enabled: bool) -> MemoryResult<()> {
        if !self.by_offset.is_empty() {
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

    /// Verifies the guard tags of every live block
    ///
    /// A damaged tag means the heap can no longer be trusted; the caller
    /// should stop using it.
    pub fn bounds_check(&self) -> MemoryResult<()> {
        if !self.config.bounds_check {
            return Ok(());
        }

        for id in self.chain() {
            let block = &self.blocks[id];
            if !block.status.is_live() {
                continue;
            }
            let lead = block.offset + HEADER_SIZE;
            let trail = lead + GUARD_SIZE + block.requested;
            if !self.region.guard_intact(lead) {
                return Err(MemoryError::corruption(
                    "linked heap",
                    &format!("leading guard of block at {:#x} overwritten", block.offset),
                ));
            }
            if !self.region.guard_intact(trail) {
                return Err(MemoryError::corruption(
                    "linked heap",
                    &format!("trailing guard of block at {:#x} overwritten", block.offset),
                ));
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Whether `address` is the payload of a live block of this heap
    pub fn is_valid_pointer(&self, address: Address) -> bool {
        self.resolve_quiet(address)
            .is_some_and(|id| self.blocks[id].status.is_live())
    }

    /// Whether `address` falls anywhere inside this heap's region
    pub fn is_pointer_in_heap(&self, address: Address) -> bool {
        address.heap() == self.id && address.offset() < self.region.capacity()
    }

    /// Alias of [`is_pointer_in_heap`](Self::is_pointer_in_heap)
    #[inline]
    pub fn contains(&self, address: Address) -> bool {
        self.is_pointer_in_heap(address)
    }

    /// Sum of live block sizes, headers and guards included
    #[inline]
    pub fn used_bytes(&self) -> usize {
        self.used
    }

    #[inline]
    pub fn free_bytes(&self) -> usize {
        self.region.capacity() - self.used
    }

    /// Bytes past the growth cursor
    ///
    /// Free-list entries are not counted; see [`fragmentation`](Self::fragmentation)
    /// for the largest free-list span.
    #[inline]
    pub fn unreserved_capacity(&self) -> usize {
        self.region.capacity() - self.cursor
    }

    #[inline]
    pub fn growth_cursor(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.region.capacity()
    }

    /// Blocks in the chain, free ones included
    #[inline]
    pub fn block_count(&self) -> usize {
        self.by_offset.len()
    }

    #[inline]
    pub fn free_block_count(&self) -> usize {
        self.free.len()
    }

    pub fn id(&self) -> AllocatorId {
        self.id
    }

    pub fn config(&self) -> &LinkedHeapConfig {
        &self.config
    }

    /// Whether the heap allocated its own region
    pub fn owns_region(&self) -> bool {
        self.region.is_owned()
    }

    pub fn fragmentation(&self) -> FragmentationStats {
        let (total, largest) = self
            .free
            .iter(&self.blocks)
            .map(|id| self.blocks[id].size)
            .fold((0, 0), |(total, largest), size| {
                (total + size, largest.max(size))
            });
        FragmentationStats::calculate(total, largest, self.free.len())
    }

    /// Blocks in address order
    pub fn blocks(&self) -> impl Iterator<Item = BlockInfo> + '_ {
        self.chain().map(|id| {
            let block = &self.blocks[id];
            BlockInfo {
                offset: block.offset,
                size: block.size,
                requested: block.requested,
                status: block.status,
                tag: block.tag,
            }
        })
    }

    pub fn usage_by_tag(&self) -> Vec<TagUsage> {
        report::usage_by_tag(
            self.blocks()
                .filter(|block| block.status.is_live())
                .map(|block| (block.tag, block.size)),
        )
    }

    pub fn report(&self) -> HeapReport {
        HeapReport {
            name: HEAP_NAME,
            capacity: self.capacity(),
            used_bytes: self.used,
            growth_cursor: self.cursor,
            blocks: self.blocks().collect(),
            tags: self.usage_by_tag(),
        }
    }

    // ------------------------------------------------------------------
    // Payload access
    // ------------------------------------------------------------------

    /// Payload of a live allocation, exactly the requested size
    pub fn payload(&self, address: Address) -> MemoryResult<&[u8]> {
        let id = self.resolve_live(address)?;
        let start = address.offset();
        Ok(self.region.slice(start..start + self.blocks[id].requested))
    }

    pub fn payload_mut(&mut self, address: Address) -> MemoryResult<&mut [u8]> {
        let id = self.resolve_live(address)?;
        let start = address.offset();
        let len = self.blocks[id].requested;
        Ok(self.region.slice_mut(start..start + len))
    }

    /// Raw backing bytes
    pub fn region(&self) -> &[u8] {
        self.region.bytes()
    }

    /// Raw backing bytes, bypassing all bookkeeping
    pub fn region_mut(&mut self) -> &mut [u8] {
        self.region.bytes_mut()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn chain(&self) -> impl Iterator<Item = BlockId> + '_ {
        core::iter::successors(self.head, |&id| self.blocks[id].next)
    }

    #[inline]
    fn lead_guard(&self) -> usize {
        if self.config.bounds_check { GUARD_SIZE } else { 0 }
    }

    #[inline]
    fn guard_overhead(&self) -> usize {
        if self.config.bounds_check { GUARD_OVERHEAD } else { 0 }
    }

    fn resolve_quiet(&self, address: Address) -> Option<BlockId> {
        if address.heap() != self.id {
            return None;
        }
        let offset = address.offset().checked_sub(HEADER_SIZE + self.lead_guard())?;
        self.by_offset.get(&offset).copied()
    }

    /// Maps a payload address back to its block
    fn resolve(&self, address: Address) -> MemoryResult<BlockId> {
        if !self.is_pointer_in_heap(address) {
            return Err(MemoryError::foreign_address(address.offset()));
        }
        self.resolve_quiet(address)
            .ok_or_else(|| MemoryError::invalid_address(address.offset()))
    }

    fn resolve_live(&self, address: Address) -> MemoryResult<BlockId> {
        let id = self.resolve(address)?;
        if self.blocks[id].status.is_live() {
            Ok(id)
        } else {
            Err(MemoryError::invalid_address(address.offset()))
        }
    }

    /// Verifies the structural invariants of the block chain
    ///
    /// Checks address contiguity, link symmetry, the growth cursor, free-list
    /// membership and used-byte accounting.
    pub fn check_invariants(&self) -> MemoryResult<()> {
        let fail = |details: String| Err(MemoryError::corruption("linked heap chain", &details));

        let mut expected_offset = 0;
        let mut prev: Option<BlockId> = None;
        let mut chain_len = 0;
        let mut free_blocks = 0;
        let mut live_bytes = 0;

        for id in self.chain() {
            let block = &self.blocks[id];
            if block.offset != expected_offset {
                return fail(format!(
                    "block at {:#x} expected at {expected_offset:#x}",
                    block.offset
                ));
            }
            if block.prev != prev {
                return fail(format!("broken prev link at {:#x}", block.offset));
            }
            if self.by_offset.get(&block.offset) != Some(&id) {
                return fail(format!("block at {:#x} missing from index", block.offset));
            }
            if block.size < HEADER_SIZE + MIN_ALIGN {
                return fail(format!("block at {:#x} undersized", block.offset));
            }
            if block.status.is_live() {
                live_bytes += block.size;
            } else {
                free_blocks += 1;
            }

            expected_offset = block.end();
            prev = Some(id);
            chain_len += 1;
        }

        if self.tail != prev {
            return fail("tail does not terminate the chain".to_string());
        }
        if expected_offset != self.cursor {
            return fail(format!(
                "chain ends at {expected_offset:#x}, cursor at {:#x}",
                self.cursor
            ));
        }
        if self.cursor > self.region.capacity() {
            return fail("cursor past region end".to_string());
        }
        if chain_len != self.by_offset.len() || chain_len != self.blocks.live_slots() {
            return fail("index and chain disagree".to_string());
        }
        if live_bytes != self.used {
            return fail(format!(
                "used bytes {} but live blocks sum to {live_bytes}",
                self.used
            ));
        }
        if free_blocks != self.free.len()
            || self
                .free
                .iter(&self.blocks)
                .any(|id| self.blocks[id].status != BlockStatus::Free)
        {
            return fail("free list and block status disagree".to_string());
        }
        if let Some(tail) = self.tail
            && self.blocks[tail].status == BlockStatus::Free
        {
            return fail("free block left at the tail".to_string());
        }
        Ok(())
    }
}

impl HeapAllocator for LinkedHeap<'_> {
    fn allocate(&mut self, size: usize, tag: Option<&'static str>) -> MemoryResult<Address> {
        LinkedHeap::allocate(self, size, tag)
    }

    fn release(&mut self, address: Address) -> MemoryResult<()> {
        LinkedHeap::release(self, address)
    }

    fn owns(&self, address: Address) -> bool {
        self.is_valid_pointer(address)
    }

    fn name(&self) -> &'static str {
        HEAP_NAME
    }
}

impl MemoryUsage for LinkedHeap<'_> {
    fn used_memory(&self) -> usize {
        self.used
    }

    fn available_memory(&self) -> Option<usize> {
        Some(self.free_bytes())
    }
}

impl StatisticsProvider for LinkedHeap<'_> {
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

impl core::fmt::Debug for LinkedHeap<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LinkedHeap")
            .field("id", &self.id)
            .field("capacity", &self.region.capacity())
            .field("cursor", &self.cursor)
            .field("used", &self.used)
            .field("blocks", &self.by_offset.len())
            .field("free_blocks", &self.free.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heap(size: usize) -> LinkedHeap<'static> {
        LinkedHeap::with_config(size, LinkedHeapConfig::production()).unwrap()
    }

    #[test]
    fn foreign_and_interior_addresses() {
        let mut first = heap(256);
        let mut second = heap(256);
        let a = first.allocate(32, None).unwrap();
        second.allocate(32, None).unwrap();

        assert!(matches!(
            second.release(a),
            Err(MemoryError::ForeignAddress { .. })
        ));
        assert!(!second.is_valid_pointer(a));
        assert!(!second.is_pointer_in_heap(a));

        let interior = a.wrapping_add(4);
        assert!(first.is_pointer_in_heap(interior));
        assert!(!first.is_valid_pointer(interior));
        assert!(matches!(
            first.release(interior),
            Err(MemoryError::InvalidAddress { .. })
        ));
        assert!(matches!(
            first.release(a.wrapping_add(4096)),
            Err(MemoryError::ForeignAddress { .. })
        ));
        assert!(first.is_valid_pointer(a));
    }

    #[test]
    fn bump_allocations_are_contiguous() {
        let mut heap = heap(1024);
        let a = heap.allocate(64, None).unwrap();
        let b = heap.allocate(30, None).unwrap();

        assert_eq!(a.offset(), HEADER_SIZE);
        assert_eq!(b.offset(), 80 + HEADER_SIZE);
        assert_eq!(heap.growth_cursor(), 80 + 48);
        assert_eq!(heap.used_bytes(), 128);
        heap.check_invariants().unwrap();
    }

    #[test]
    fn large_surplus_is_split() {
        let mut heap = heap(2048);
        let big = heap.allocate(1000, None).unwrap();
        let _pin = heap.allocate(16, None).unwrap();
        heap.release(big).unwrap();

        let small = heap.allocate(100, None).unwrap();
        assert_eq!(small.offset(), big.offset());
        assert_eq!(heap.free_block_count(), 1);

        let blocks: Vec<_> = heap.blocks().collect();
        assert_eq!(blocks[0].size, 116);
        assert_eq!(blocks[1].status, BlockStatus::Free);
        assert_eq!(blocks[1].offset, 116);
        assert_eq!(blocks[1].size, 1016 - 116);
        heap.check_invariants().unwrap();
    }

    #[test]
    fn small_surplus_is_taken_whole() {
        let mut heap = heap(1024);
        let a = heap.allocate(200, None).unwrap();
        let _pin = heap.allocate(16, None).unwrap();
        heap.release(a).unwrap();

        heap.allocate(8, None).unwrap();
        assert_eq!(heap.free_block_count(), 0);
        assert_eq!(heap.blocks().next().unwrap().size, 216);
    }

    #[test]
    fn bump_requires_strict_headroom() {
        let mut heap = heap(64);
        // 48 + 16 would end exactly at the region end
        assert!(matches!(
            heap.allocate(48, None),
            Err(MemoryError::OutOfMemory { .. })
        ));
        heap.allocate(44, None).unwrap();
        assert_eq!(heap.unreserved_capacity(), 4);
    }

    #[test]
    fn coalesce_merges_both_neighbours() {
        let mut heap = heap(1024);
        let a = heap.allocate(32, None).unwrap();
        let b = heap.allocate(32, None).unwrap();
        let c = heap.allocate(32, None).unwrap();
        let _pin = heap.allocate(32, None).unwrap();

        heap.release(a).unwrap();
        heap.release(c).unwrap();
        assert_eq!(heap.free_block_count(), 2);

        heap.release(b).unwrap();
        assert_eq!(heap.free_block_count(), 1);
        assert_eq!(heap.fragmentation().largest_block, 144);
        heap.check_invariants().unwrap();
    }

    #[test]
    fn stats_follow_allocations() {
        let mut heap = heap(256);
        let a = heap.allocate(16, None).unwrap();
        let _ = heap.allocate(0, None);
        heap.release(a).unwrap();

        let stats = heap.statistics();
        assert_eq!(stats.allocation_count, 1);
        assert_eq!(stats.deallocation_count, 1);
        assert_eq!(stats.failed_allocations, 1);
        assert_eq!(stats.peak_allocated_bytes, 32);
    }
}
