//! Stack marker for position tracking

/// Marker representing a saved position in the stack heap
///
/// Returned by [`StackHeap::mark`](super::StackHeap::mark). Releasing the
/// mark it describes deallocates everything allocated after it was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StackMarker {
    pub(super) depth: usize,
    pub(super) position: usize,
}

impl StackMarker {
    /// Mark stack depth once this mark was pushed (1 for the first mark)
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Growth cursor saved by the mark
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }
}
