//! Linked heap configuration

use crate::core::types::linked::DEFAULT_SPLIT_TOLERANCE;
use crate::error::{MemoryError, MemoryResult};

/// What to do when a locked block is released without `unlock`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LockedReleasePolicy {
    /// Log a warning and release the block anyway
    #[default]
    Warn,
    /// Refuse with [`MemoryError::LockedBlockRelease`]
    Reject,
}

/// Configuration for the linked heap
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkedHeapConfig {
    /// Stamp guard tags around every payload
    pub bounds_check: bool,

    /// Largest surplus a free block may have and still be reused whole
    pub split_tolerance: usize,

    pub locked_release: LockedReleasePolicy,

    /// Enable statistics tracking
    pub track_stats: bool,

    /// Fill patterns for debugging
    pub alloc_pattern: Option<u8>,
    pub dealloc_pattern: Option<u8>,
}

impl Default for LinkedHeapConfig {
    fn default() -> Self {
        Self {
            bounds_check: false,
            split_tolerance: DEFAULT_SPLIT_TOLERANCE,
            locked_release: LockedReleasePolicy::Warn,
            track_stats: cfg!(debug_assertions),
            alloc_pattern: if cfg!(debug_assertions) { Some(0xCC) } else { None },
            dealloc_pattern: if cfg!(debug_assertions) { Some(0xDD) } else { None },
        }
    }
}

impl LinkedHeapConfig {
    /// Production configuration - optimized for performance
    pub fn production() -> Self {
        Self {
            bounds_check: false,
            split_tolerance: DEFAULT_SPLIT_TOLERANCE,
            locked_release: LockedReleasePolicy::Warn,
            track_stats: true,
            alloc_pattern: None,
            dealloc_pattern: None,
        }
    }

    /// Debug configuration - optimized for debugging
    pub fn debug() -> Self {
        Self {
            bounds_check: true,
            split_tolerance: DEFAULT_SPLIT_TOLERANCE,
            locked_release: LockedReleasePolicy::Reject,
            track_stats: true,
            alloc_pattern: Some(0xCC),
            dealloc_pattern: Some(0xDD),
        }
    }

    /// Performance configuration - minimal overhead
    pub fn performance() -> Self {
        Self {
            bounds_check: false,
            split_tolerance: DEFAULT_SPLIT_TOLERANCE,
            locked_release: LockedReleasePolicy::Warn,
            track_stats: false,
            alloc_pattern: None,
            dealloc_pattern: None,
        }
    }

    /// Builder-style toggle for guard tags
    #[must_use]
    pub fn with_bounds_check(mut self, enabled: bool) -> Self {
        self.bounds_check = enabled;
        self
    }

    /// Builder-style split tolerance
    #[must_use]
    pub fn with_split_tolerance(mut self, tolerance: usize) -> Self {
        self.split_tolerance = tolerance;
        self
    }

    /// Builder-style locked release policy
    #[must_use]
    pub fn with_locked_release(mut self, policy: LockedReleasePolicy) -> Self {
        self.locked_release = policy;
        self
    }

    /// Checks the configuration for values the heap cannot honour
    pub fn validate(&self) -> MemoryResult<()> {
        if self.split_tolerance % crate::core::types::alignment::MIN_ALIGN != 0 {
            return Err(MemoryError::invalid_config(
                "split_tolerance must be a multiple of 4",
            ));
        }
        if let (Some(alloc), Some(dealloc)) = (self.alloc_pattern, self.dealloc_pattern)
            && alloc == dealloc
        {
            return Err(MemoryError::invalid_config(
                "alloc_pattern and dealloc_pattern must differ",
            ));
        }
        Ok(())
    }
}
