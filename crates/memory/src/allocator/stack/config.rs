//! Stack heap configuration

use crate::core::types::stack::DEFAULT_MAX_MARKS;
use crate::error::{MemoryError, MemoryResult};

/// Configuration for the stack heap
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StackHeapConfig {
    /// Depth of the mark stack
    pub max_marks: usize,

    /// Stamp guard tags around every payload
    pub bounds_check: bool,

    /// Enable statistics tracking
    pub track_stats: bool,

    /// Fill pattern for debugging
    pub alloc_pattern: Option<u8>,
}

impl Default for StackHeapConfig {
    fn default() -> Self {
        Self {
            max_marks: DEFAULT_MAX_MARKS,
            bounds_check: false,
            track_stats: cfg!(debug_assertions),
            alloc_pattern: if cfg!(debug_assertions) { Some(0xCC) } else { None },
        }
    }
}

impl StackHeapConfig {
    /// Production configuration - optimized for performance
    pub fn production() -> Self {
        Self {
            max_marks: DEFAULT_MAX_MARKS,
            bounds_check: false,
            track_stats: true,
            alloc_pattern: None,
        }
    }

    /// Debug configuration - optimized for debugging
    pub fn debug() -> Self {
        Self {
            max_marks: DEFAULT_MAX_MARKS,
            bounds_check: true,
            track_stats: true,
            alloc_pattern: Some(0xCC),
        }
    }

    /// Performance configuration - minimal overhead
    pub fn performance() -> Self {
        Self {
            max_marks: DEFAULT_MAX_MARKS,
            bounds_check: false,
            track_stats: false,
            alloc_pattern: None,
        }
    }

    #[must_use]
    pub fn with_max_marks(mut self, max_marks: usize) -> Self {
        self.max_marks = max_marks;
        self
    }

    #[must_use]
    pub fn with_bounds_check(mut self, enabled: bool) -> Self {
        self.bounds_check = enabled;
        self
    }

    pub fn validate(&self) -> MemoryResult<()> {
        if self.max_marks == 0 {
            return Err(MemoryError::invalid_config("max_marks must be at least 1"));
        }
        Ok(())
    }
}
