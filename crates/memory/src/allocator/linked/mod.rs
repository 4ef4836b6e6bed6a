//! Linked heap: general allocate/free with splitting and coalescing
//!
//! The heap lays blocks out back to back from the start of its region. Each
//! block has a 16-byte header slot, optional guard tags and the payload.
//! Free blocks are kept on an unordered free list, searched first-fit, and a
//! free block whose surplus is within the split tolerance is handed out whole.
//!
//! Block status moves between `Free` and one of `Normal`, `Locked` or
//! `Fixed`:
//! - `Normal` blocks are released with [`LinkedHeap::release`]
//! - `Locked` blocks expect [`LinkedHeap::release_with`] and `unlock = true`
//! - `Fixed` blocks are reclaimed only by [`LinkedHeap::release_all`]

mod allocator;
mod block;
mod config;
mod free_list;

pub use allocator::LinkedHeap;
pub use config::{LinkedHeapConfig, LockedReleasePolicy};
