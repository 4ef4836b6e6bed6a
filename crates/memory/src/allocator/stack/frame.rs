//! RAII-based stack frame for automatic restoration

use core::ops::{Deref, DerefMut};

#[cfg(feature = "logging")]
use tracing::warn;

use super::{StackHeap, StackMarker};
use crate::error::MemoryResult;

/// RAII helper for stack-based scoped allocation
///
/// Pushes a mark on creation and rewinds to it when dropped, so everything
/// allocated through the frame is reclaimed at the end of the scope. The
/// frame dereferences to the heap it borrows.
///
/// ```
/// use forge_memory::allocator::StackHeap;
///
/// let mut heap = StackHeap::new(256)?;
/// {
///     let mut frame = heap.frame()?;
///     frame.allocate(32, None)?;
///     assert_eq!(frame.used_bytes(), 32);
/// }
/// assert_eq!(heap.used_bytes(), 0);
/// # Ok::<(), forge_memory::MemoryError>(())
/// ```
pub struct StackFrame<'h, 'a> {
    heap: &'h mut StackHeap<'a>,
    marker: StackMarker,
}

impl<'h, 'a> StackFrame<'h, 'a> {
    /// Creates a new stack frame that will restore to the current position
    /// when dropped
    pub fn new(heap: &'h mut StackHeap<'a>) -> MemoryResult<Self> {
        let marker = heap.mark()?;
        Ok(Self { heap, marker })
    }

    /// Mark taken when the frame was opened
    pub fn marker(&self) -> StackMarker {
        self.marker
    }
}

impl<'a> Deref for StackFrame<'_, 'a> {
    type Target = StackHeap<'a>;

    fn deref(&self) -> &Self::Target {
        &*self.heap
    }
}

impl DerefMut for StackFrame<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.heap
    }
}

impl Drop for StackFrame<'_, '_> {
    fn drop(&mut self) {
        // The mark is gone if the heap was reset inside the frame
        if self.heap.release_to(self.marker).is_err() {
            #[cfg(feature = "logging")]
            warn!(
                depth = self.marker.depth(),
                "stack frame mark missing on drop"
            );
        }
    }
}
