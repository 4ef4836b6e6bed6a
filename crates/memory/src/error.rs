//! Standalone error types for forge-memory
//!
//! Uses thiserror for clean, idiomatic Rust error definitions.
//!
//! Every variant belongs to one [`ErrorCategory`]: configuration errors fail
//! construction, exhaustion is recoverable, misuse is reported and otherwise
//! leaves the allocator untouched, and corruption means heap integrity can no
//! longer be trusted.

use thiserror::Error;

#[cfg(feature = "logging")]
use tracing::{error, warn};

// ============================================================================
// Main Error Types
// ============================================================================

/// Memory management errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    // --- Configuration Errors ---
    #[error("Backing region too small: {size} bytes (minimum: {min})")]
    RegionTooSmall { size: usize, min: usize },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // --- Allocation Errors ---
    #[error("Zero-sized allocation requested")]
    ZeroSizedAllocation,

    #[error("Size overflow during operation: {operation}")]
    SizeOverflow { operation: String },

    #[error("Heap '{heap}' exhausted: requested {requested} bytes, available {available}")]
    OutOfMemory {
        heap: &'static str,
        requested: usize,
        available: usize,
    },

    // --- Release Errors ---
    #[error("Address {offset:#x} is not owned by this allocator")]
    ForeignAddress { offset: usize },

    #[error("Address {offset:#x} does not refer to a live allocation")]
    InvalidAddress { offset: usize },

    #[error("Block at {offset:#x} released twice")]
    DoubleRelease { offset: usize },

    #[error("Block at {offset:#x} is fixed and can only be reclaimed by release_all")]
    FixedBlockRelease { offset: usize },

    #[error("Block at {offset:#x} is locked; release it with unlock")]
    LockedBlockRelease { offset: usize },

    // --- Stack Heap Errors ---
    #[error("Mark stack overflow: maximum depth {depth} reached")]
    MarkStackOverflow { depth: usize },

    // --- Pool Errors ---
    #[error("Pool handle was issued by a different pool")]
    ForeignHandle,

    #[error("Stale pool handle: issued in generation {handle}, pool is at generation {current}")]
    StaleHandle { handle: u32, current: u32 },

    #[error("Pool slot {slot} pushed back twice")]
    DoublePush { slot: usize },

    // --- System Errors ---
    #[error("Invalid state: {reason}")]
    InvalidState { reason: String },

    #[error("Memory corruption detected in {component}: {details}")]
    CorruptionDetected { component: String, details: String },
}

/// Error taxonomy shared by all allocators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Invalid region size or configuration; construction fails
    Configuration,
    /// The request cannot be satisfied right now; recoverable
    Exhaustion,
    /// Caller mistake; reported and otherwise a no-op
    Misuse,
    /// Guard tag or chain damage; heap integrity is lost
    Corruption,
}

impl MemoryError {
    /// Category of this error
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::RegionTooSmall { .. } | Self::InvalidConfig { .. } => {
                ErrorCategory::Configuration
            }
            Self::OutOfMemory { .. } => ErrorCategory::Exhaustion,
            Self::CorruptionDetected { .. } => ErrorCategory::Corruption,
            Self::ZeroSizedAllocation
            | Self::SizeOverflow { .. }
            | Self::ForeignAddress { .. }
            | Self::InvalidAddress { .. }
            | Self::DoubleRelease { .. }
            | Self::FixedBlockRelease { .. }
            | Self::LockedBlockRelease { .. }
            | Self::MarkStackOverflow { .. }
            | Self::ForeignHandle
            | Self::StaleHandle { .. }
            | Self::DoublePush { .. }
            | Self::InvalidState { .. } => ErrorCategory::Misuse,
        }
    }

    /// Check if error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Exhaustion
    }

    /// Check if the error means the allocator must not be used any further
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Configuration | ErrorCategory::Corruption
        )
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::RegionTooSmall { .. } => "MEM:CONFIG:REGION",
            Self::InvalidConfig { .. } => "MEM:CONFIG:INVALID",
            Self::ZeroSizedAllocation => "MEM:ALLOC:ZERO",
            Self::SizeOverflow { .. } => "MEM:ALLOC:OVERFLOW",
            Self::OutOfMemory { .. } => "MEM:HEAP:EXHAUSTED",
            Self::ForeignAddress { .. } => "MEM:RELEASE:FOREIGN",
            Self::InvalidAddress { .. } => "MEM:RELEASE:INVALID",
            Self::DoubleRelease { .. } => "MEM:RELEASE:DOUBLE",
            Self::FixedBlockRelease { .. } => "MEM:RELEASE:FIXED",
            Self::LockedBlockRelease { .. } => "MEM:RELEASE:LOCKED",
            Self::MarkStackOverflow { .. } => "MEM:STACK:MARKS",
            Self::ForeignHandle => "MEM:POOL:FOREIGN",
            Self::StaleHandle { .. } => "MEM:POOL:STALE",
            Self::DoublePush { .. } => "MEM:POOL:DOUBLE",
            Self::InvalidState { .. } => "MEM:SYSTEM:STATE",
            Self::CorruptionDetected { .. } => "MEM:SYSTEM:CORRUPTION",
        }
    }

    // ============================================================================
    // Convenience Constructors
    // ============================================================================

    /// Create region too small error
    #[must_use]
    pub fn region_too_small(size: usize, min: usize) -> Self {
        Self::RegionTooSmall { size, min }
    }

    /// Create invalid config error
    pub fn invalid_config(reason: &str) -> Self {
        Self::InvalidConfig {
            reason: reason.to_string(),
        }
    }

    /// Create size overflow error
    pub fn size_overflow(operation: &str) -> Self {
        Self::SizeOverflow {
            operation: operation.to_string(),
        }
    }

    /// Create out of memory error
    pub fn out_of_memory(heap: &'static str, requested: usize, available: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(heap, requested, available, "allocation failed");

        Self::OutOfMemory {
            heap,
            requested,
            available,
        }
    }

    /// Create foreign address error
    pub fn foreign_address(offset: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(offset, "release of an address not owned by this allocator");

        Self::ForeignAddress { offset }
    }

    /// Create invalid address error
    pub fn invalid_address(offset: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(offset, "address does not refer to a live allocation");

        Self::InvalidAddress { offset }
    }

    /// Create double release error
    pub fn double_release(offset: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(offset, "duplicate release");

        Self::DoubleRelease { offset }
    }

    /// Create fixed block release error
    pub fn fixed_block_release(offset: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(offset, "attempt to release a fixed block");

        Self::FixedBlockRelease { offset }
    }

    /// Create locked block release error
    pub fn locked_block_release(offset: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(offset, "attempt to release a locked block without unlock");

        Self::LockedBlockRelease { offset }
    }

    /// Create mark stack overflow error
    pub fn mark_stack_overflow(depth: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(depth, "stack heap mark stack is full");

        Self::MarkStackOverflow { depth }
    }

    /// Create stale handle error
    #[must_use]
    pub fn stale_handle(handle: u32, current: u32) -> Self {
        Self::StaleHandle { handle, current }
    }

    /// Create double push error
    pub fn double_push(slot: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(slot, "pool slot pushed back twice");

        Self::DoublePush { slot }
    }

    /// Create invalid state error
    pub fn invalid_state(reason: &str) -> Self {
        Self::InvalidState {
            reason: reason.to_string(),
        }
    }

    /// Create memory corruption error
    pub fn corruption(component: &str, details: &str) -> Self {
        #[cfg(feature = "logging")]
        error!("Memory corruption: {component} - {details}");

        Self::CorruptionDetected {
            component: component.to_string(),
            details: details.to_string(),
        }
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result type for memory operations
pub type MemoryResult<T> = core::result::Result<T, MemoryError>;

/// Generic result type alias
pub type Result<T> = MemoryResult<T>;

// ============================================================================
// Tests
// ============================================================================
