//! Stack heap: bump allocation with LIFO mark/release
//!
//! ## Modules
//! - `allocator` - Main `StackHeap` implementation
//! - `config` - Configuration variants (production, debug, performance)
//! - `frame` - RAII helper for automatic stack restoration
//! - `marker` - Saved positions returned by `mark`

pub mod allocator;
pub mod config;
pub mod frame;
pub mod marker;

pub use allocator::StackHeap;
pub use config::StackHeapConfig;
pub use frame::StackFrame;
pub use marker::StackMarker;
