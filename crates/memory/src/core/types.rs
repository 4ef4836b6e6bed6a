//! Common types and constants for memory management

/// Memory alignment requirements
pub mod alignment {
    /// Granularity of every size handed out by the heaps
    pub const MIN_ALIGN: usize = 4;
}

/// Region limits shared by the linked and stack heaps
pub mod region {
    /// Smallest backing region a heap accepts
    pub const MIN_REGION_SIZE: usize = 32;
}

/// Linked heap layout constants
pub mod linked {
    /// Bytes reserved in front of every block for its header
    pub const HEADER_SIZE: usize = 16;

    /// Largest surplus a free block may carry and still be reused without splitting
    pub const DEFAULT_SPLIT_TOLERANCE: usize = 256;
}

/// Stack heap constants
pub mod stack {
    /// Default depth of the mark stack
    pub const DEFAULT_MAX_MARKS: usize = 32;
}

/// Guard tag constants used by bounds checking
pub mod guard {
    /// Sentinel written immediately before and after a checked payload
    pub const GUARD_TAG: u32 = 0xFDFD_C0DE;

    /// Width of one guard tag in bytes
    pub const GUARD_SIZE: usize = size_of::<u32>();

    /// Bytes added to a block when both guards are present
    pub const GUARD_OVERHEAD: usize = 2 * GUARD_SIZE;
}

/// Status of a linked heap block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockStatus {
    /// Unused span, present in the free list
    Free,
    /// Ordinary allocation, releasable at any time
    Normal,
    /// Allocation expected to be released only with an explicit unlock
    Locked,
    /// Allocation reclaimed only by `release_all`
    Fixed,
}

impl BlockStatus {
    /// Whether the block holds a live allocation
    #[inline]
    pub fn is_live(self) -> bool {
        self != Self::Free
    }
}

impl core::fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Free => "free",
            Self::Normal => "normal",
            Self::Locked => "locked",
            Self::Fixed => "fixed",
        };
        f.write_str(name)
    }
}
