//! Backing region shared by the linked and stack heaps
//!
//! A region is either owned by its heap (allocated at construction and freed
//! on drop) or borrowed from the caller, who keeps ownership of the buffer.
//! Either way the heap addresses it purely by offset.

use core::ops::Range;

use crate::core::types::alignment::MIN_ALIGN;
use crate::core::types::guard::{GUARD_SIZE, GUARD_TAG};
use crate::core::types::region::MIN_REGION_SIZE;
use crate::error::{MemoryError, MemoryResult};
use crate::utils::{align_down, checked_align_up};

enum Backing<'a> {
    Owned(Box<[u8]>),
    External(&'a mut [u8]),
}

/// Fixed-size byte buffer a heap carves allocations out of
pub(crate) struct Region<'a> {
    backing: Backing<'a>,
    capacity: usize,
}

impl Region<'static> {
    /// Allocates an owned, zeroed region of at least `size` bytes
    ///
    /// The size is rounded up to a multiple of [`MIN_ALIGN`].
    pub(crate) fn owned(size: usize) -> MemoryResult<Self> {
        let capacity = checked_align_up(size, MIN_ALIGN)?;
        if capacity < MIN_REGION_SIZE {
            return Err(MemoryError::region_too_small(size, MIN_REGION_SIZE));
        }

        Ok(Self {
            backing: Backing::Owned(vec![0u8; capacity].into_boxed_slice()),
            capacity,
        })
    }
}

impl<'a> Region<'a> {
    /// Wraps a caller-supplied buffer
    ///
    /// The usable size is the buffer length rounded down to a multiple of
    /// [`MIN_ALIGN`]; trailing bytes are never touched.
    pub(crate) fn external(buffer: &'a mut [u8]) -> MemoryResult<Self> {
        let capacity = align_down(buffer.len(), MIN_ALIGN);
        if capacity < MIN_REGION_SIZE {
            return Err(MemoryError::region_too_small(buffer.len(), MIN_REGION_SIZE));
        }

        Ok(Self {
            backing: Backing::External(buffer),
            capacity,
        })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn is_owned(&self) -> bool {
        matches!(self.backing, Backing::Owned(_))
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        match &self.backing {
            Backing::Owned(buf) => &buf[..self.capacity],
            Backing::External(buf) => &buf[..self.capacity],
        }
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        match &mut self.backing {
            Backing::Owned(buf) => &mut buf[..self.capacity],
            Backing::External(buf) => &mut buf[..self.capacity],
        }
    }

    pub(crate) fn slice(&self, range: Range<usize>) -> &[u8] {
        &self.bytes()[range]
    }

    pub(crate) fn slice_mut(&mut self, range: Range<usize>) -> &mut [u8] {
        &mut self.bytes_mut()[range]
    }

    pub(crate) fn fill(&mut self, range: Range<usize>, pattern: u8) {
        self.slice_mut(range).fill(pattern);
    }

    /// Stamps a guard tag at `offset`
    pub(crate) fn write_guard(&mut self, offset: usize) {
        self.slice_mut(offset..offset + GUARD_SIZE)
            .copy_from_slice(&GUARD_TAG.to_le_bytes());
    }

    /// Whether the guard tag at `offset` is intact
    pub(crate) fn guard_intact(&self, offset: usize) -> bool {
        offset
            .checked_add(GUARD_SIZE)
            .filter(|&end| end <= self.capacity)
            .is_some_and(|end| self.slice(offset..end) == GUARD_TAG.to_le_bytes())
    }
}
