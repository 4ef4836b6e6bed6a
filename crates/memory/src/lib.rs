//! # forge-memory
//!
//! Allocators for targets where the system heap is absent, slow or not to be
//! trusted. Every allocator works inside one fixed region handed to it at
//! construction and never touches the global allocator afterwards.
//!
//! - [`LinkedHeap`](allocator::LinkedHeap): general allocate/free with block
//!   splitting, first-fit reuse, tail shrinkage, coalescing and optional guard
//!   tags
//! - [`StackHeap`](allocator::StackHeap): bump allocation with a bounded stack
//!   of marks and O(1) release to the last mark
//! - [`FixedPool`](pool::FixedPool): `N` pre-built values recycled through
//!   checked handles
//!
//! Both heaps implement [`HeapAllocator`](allocator::HeapAllocator), so code
//! that only allocates and releases can stay generic over the heap type.
//!
//! ## Quick Start
//!
//! ```rust
//! use forge_memory::prelude::*;
//!
//! let mut heap = LinkedHeap::with_config(4 * 1024, LinkedHeapConfig::debug())?;
//! let sprite = heap.allocate(256, Some("sprite"))?;
//! heap.payload_mut(sprite)?.copy_from_slice(&[0u8; 256]);
//! heap.bounds_check()?;
//! heap.release(sprite)?;
//!
//! let mut scratch = StackHeap::new(1024)?;
//! {
//!     let mut frame = scratch.frame()?;
//!     frame.allocate(128, None)?;
//! }
//! assert_eq!(scratch.used_bytes(), 0);
//! # Ok::<(), MemoryError>(())
//! ```
//!
//! ## Features
//!
//! - `logging` (default): structured `tracing` events for misuse, exhaustion
//!   and corruption
//! - `serde`: `Serialize`/`Deserialize` for the heap configuration structs
//!
//! ## Threading
//!
//! Allocators are single-owner. Every mutating call takes `&mut self`, so the
//! borrow checker enforces one user at a time; there are no internal locks.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::perf)]
#![warn(clippy::pedantic)]
#![warn(rust_2018_idioms)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
// Precision loss in usize -> f64 casts is acceptable for stats
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::inline_always)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::return_self_not_must_use)]

// Error types
pub mod error;

// Core modules
pub mod allocator;
pub mod core;
pub mod pool;
pub mod utils;

// Re-export core types for convenience
pub use crate::error::{ErrorCategory, MemoryError, MemoryResult, Result};

// Public API exports
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    // Core traits
    pub use crate::core::traits::{MemoryUsage, StatisticsProvider};
    pub use crate::core::types::BlockStatus;

    // Error types
    pub use crate::error::{ErrorCategory, MemoryError, MemoryResult};

    // Allocator types
    pub use crate::allocator::{
        Address, AllocatorId, HeapAllocator, LinkedHeap, LinkedHeapConfig, LockedReleasePolicy,
        StackFrame, StackHeap, StackHeapConfig, StackMarker,
    };

    // Pools
    pub use crate::pool::{FixedPool, PoolHandle};
}
