//! Utility functions and helpers for forge-memory
//!
//! Alignment helpers and checked size arithmetic used by the heaps.

use crate::error::{MemoryError, MemoryResult};

/// Aligns a value up to the nearest multiple of alignment
///
/// # Examples
/// ```
/// use forge_memory::utils::align_up;
///
/// assert_eq!(align_up(7, 4), 8);
/// assert_eq!(align_up(8, 4), 8);
/// assert_eq!(align_up(9, 4), 12);
/// ```
#[inline(always)]
pub const fn align_up(value: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}

/// Aligns a value down to the nearest multiple of alignment
///
/// # Examples
/// ```
/// use forge_memory::utils::align_down;
///
/// assert_eq!(align_down(7, 4), 4);
/// assert_eq!(align_down(8, 4), 8);
/// ```
#[inline(always)]
pub const fn align_down(value: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    value & !(alignment - 1)
}

/// Overflow-checked [`align_up`]
pub fn checked_align_up(value: usize, alignment: usize) -> MemoryResult<usize> {
    debug_assert!(alignment.is_power_of_two());
    value
        .checked_add(alignment - 1)
        .map(|v| v & !(alignment - 1))
        .ok_or_else(|| MemoryError::size_overflow("align_up"))
}

/// Overflow-checked sum of a block's parts
pub fn checked_block_size(parts: &[usize]) -> MemoryResult<usize> {
    parts.iter().try_fold(0usize, |total, &part| {
        total
            .checked_add(part)
            .ok_or_else(|| MemoryError::size_overflow("block size calculation"))
    })
}
