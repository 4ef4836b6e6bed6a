//! Allocator statistics tracking
//!
//! Provides the counters every heap keeps and the fragmentation summary the
//! linked heap computes over its free list.

use core::fmt;

/// Statistics for memory allocators
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Total bytes currently allocated
    pub allocated_bytes: usize,
    /// Peak bytes allocated
    pub peak_allocated_bytes: usize,
    /// Total number of allocations
    pub allocation_count: usize,
    /// Total number of releases
    pub deallocation_count: usize,
    /// Number of failed allocations
    pub failed_allocations: usize,
    /// Total bytes ever allocated (cumulative)
    pub total_bytes_allocated: usize,
    /// Total bytes ever released (cumulative)
    pub total_bytes_deallocated: usize,
}

impl AllocatorStats {
    /// Creates a new empty stats object
    pub const fn new() -> Self {
        Self {
            allocated_bytes: 0,
            peak_allocated_bytes: 0,
            allocation_count: 0,
            deallocation_count: 0,
            failed_allocations: 0,
            total_bytes_allocated: 0,
            total_bytes_deallocated: 0,
        }
    }

    /// Reset all statistics to zero
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Record a successful allocation of `size` bytes
    pub fn record_allocation(&mut self, size: usize) {
        self.allocation_count += 1;
        self.total_bytes_allocated = self.total_bytes_allocated.saturating_add(size);
        self.allocated_bytes = self.allocated_bytes.saturating_add(size);
        self.peak_allocated_bytes = self.peak_allocated_bytes.max(self.allocated_bytes);
    }

    /// Record the release of `size` bytes
    pub fn record_deallocation(&mut self, size: usize) {
        self.deallocation_count += 1;
        self.total_bytes_deallocated = self.total_bytes_deallocated.saturating_add(size);
        self.allocated_bytes = self.allocated_bytes.saturating_sub(size);
    }

    /// Record a bulk release (mark unwind or full reset) of `size` bytes
    pub fn record_bulk_release(&mut self, blocks: usize, size: usize) {
        self.deallocation_count += blocks;
        self.total_bytes_deallocated = self.total_bytes_deallocated.saturating_add(size);
        self.allocated_bytes = self.allocated_bytes.saturating_sub(size);
    }

    /// Record a failed allocation
    pub fn record_failure(&mut self) {
        self.failed_allocations += 1;
    }

    /// Calculate the average allocation size
    pub fn average_allocation_size(&self) -> Option<f64> {
        if self.allocation_count > 0 {
            Some(self.total_bytes_allocated as f64 / self.allocation_count as f64)
        } else {
            None
        }
    }

    /// Fraction of allocation attempts that succeeded (0.0 to 1.0)
    pub fn allocation_efficiency(&self) -> f64 {
        let total_attempts = self.allocation_count + self.failed_allocations;
        if total_attempts > 0 {
            self.allocation_count as f64 / total_attempts as f64
        } else {
            1.0
        }
    }

    /// Check if there are any active allocations
    pub fn has_active_allocations(&self) -> bool {
        self.allocation_count > self.deallocation_count
    }
}

impl fmt::Display for AllocatorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Allocator Statistics:")?;
        writeln!(f, "  Current allocated: {} bytes", self.allocated_bytes)?;
        writeln!(f, "  Peak allocated: {} bytes", self.peak_allocated_bytes)?;
        writeln!(f, "  Allocations: {}", self.allocation_count)?;
        writeln!(f, "  Releases: {}", self.deallocation_count)?;
        writeln!(f, "  Failed allocations: {}", self.failed_allocations)?;

        if let Some(avg) = self.average_allocation_size() {
            writeln!(f, "  Average allocation size: {avg:.2} bytes")?;
        }

        writeln!(
            f,
            "  Allocation efficiency: {:.2}%",
            self.allocation_efficiency() * 100.0
        )
    }
}

/// Fragmentation statistics for memory analysis
///
/// Summarizes the free spans of a heap: how much is free, how big the
/// largest span is and how scattered the rest is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FragmentationStats {
    /// Total free memory across all fragments (bytes)
    pub total_free: usize,

    /// Size of the largest contiguous free block (bytes)
    pub largest_block: usize,

    /// Number of distinct free fragments
    pub fragment_count: usize,

    /// External fragmentation ratio (0-100)
    ///
    /// Calculated as: `100 * (1 - largest_block / total_free)`
    pub fragmentation_percent: u8,
}

impl FragmentationStats {
    /// Calculate fragmentation percentage from free space metrics
    pub fn calculate(total_free: usize, largest_block: usize, fragment_count: usize) -> Self {
        let fragmentation_percent = if total_free > 0 {
            let ratio = 1.0 - (largest_block as f64 / total_free as f64);
            (ratio * 100.0).clamp(0.0, 100.0) as u8
        } else {
            0
        };

        Self {
            total_free,
            largest_block,
            fragment_count,
            fragmentation_percent,
        }
    }

    /// Check if fragmentation is concerning (>50%)
    #[inline]
    pub fn is_fragmented(&self) -> bool {
        self.fragmentation_percent > 50
    }
}

impl fmt::Display for FragmentationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FragmentationStats {{ total_free: {} bytes, largest_block: {} bytes, \
             fragments: {}, fragmentation: {}% }}",
            self.total_free, self.largest_block, self.fragment_count, self.fragmentation_percent
        )
    }
}
