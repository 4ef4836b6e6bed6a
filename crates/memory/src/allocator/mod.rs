//! Heap allocators over fixed regions
//!
//! ## Modules
//! - `traits` - The `HeapAllocator` contract both heaps implement
//! - `address` - Allocator identities and region-relative addresses
//! - `linked` - General allocate/free heap with coalescing
//! - `stack` - Bump heap with LIFO mark/release
//! - `stats` - Allocation counters and fragmentation figures
//! - `report` - Diagnostic block and tag dumps

pub mod address;
pub mod linked;
mod region;
pub mod report;
pub mod stack;
pub mod stats;
pub mod traits;

pub use address::{Address, AllocatorId};
pub use linked::{LinkedHeap, LinkedHeapConfig, LockedReleasePolicy};
pub(crate) use region::Region;
pub use report::{BlockInfo, HeapReport, TagUsage};
pub use stack::{StackFrame, StackHeap, StackHeapConfig, StackMarker};
pub use stats::{AllocatorStats, FragmentationStats};
pub use traits::HeapAllocator;
