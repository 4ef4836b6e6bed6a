//! Fixed-capacity object pool
//!
//! All `N` values are built once at construction and recycled for the life of
//! the pool. `pop` hands out a [`PoolHandle`] to a free slot in O(1) and `push`
//! returns it. Handles carry the pool id and a generation, so a handle from
//! another pool, one issued before [`FixedPool::reset`], or one pushed twice is
//! rejected instead of corrupting the free set.

use core::fmt;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

use crate::allocator::AllocatorId;
use crate::core::traits::MemoryUsage;
use crate::error::{MemoryError, MemoryResult};

/// Reference to a checked-out pool slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    pool: AllocatorId,
    slot: u32,
    generation: u32,
}

impl PoolHandle {
    /// Pool that issued the handle
    pub fn pool(&self) -> AllocatorId {
        self.pool
    }

    /// Slot index inside the pool
    pub fn slot(&self) -> usize {
        self.slot as usize
    }

    /// Pool generation the handle was issued in
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Pool of `N` pre-built values of type `T`
///
/// # Example
/// ```
/// use forge_memory::pool::FixedPool;
///
/// let mut pool: FixedPool<[f32; 4], 8> = FixedPool::from_default()?;
/// let handle = pool.pop().expect("pool is full");
/// pool.get_mut(handle)?[0] = 1.0;
/// pool.push(handle)?;
/// assert_eq!(pool.free(), 8);
/// # Ok::<(), forge_memory::MemoryError>(())
/// ```
pub struct FixedPool<T, const N: usize> {
    id: AllocatorId,
    slots: Box<[T]>,
    available: Vec<u32>,
    issued: Vec<bool>,
    generation: u32,
}

impl<T, const N: usize> FixedPool<T, N> {
    /// Builds the pool, calling `factory` once per slot
    pub fn new<F>(mut factory: F) -> MemoryResult<Self>
    where
        F: FnMut() -> T,
    {
        if N == 0 {
            return Err(MemoryError::invalid_config("pool capacity must be at least 1"));
        }
        let count = u32::try_from(N)
            .map_err(|_| MemoryError::invalid_config("pool capacity exceeds u32::MAX"))?;

        let slots: Box<[T]> = (0..N).map(|_| factory()).collect();
        let pool = Self {
            id: AllocatorId::new(),
            slots,
            available: (0..count).collect(),
            issued: vec![false; N],
            generation: 0,
        };

        #[cfg(feature = "logging")]
        debug!(
            pool = %pool.id,
            capacity = N,
            slot_size = size_of::<T>(),
            "fixed pool created"
        );

        Ok(pool)
    }

    /// Takes the most recently returned free slot
    ///
    /// `None` means the pool is exhausted.
    pub fn pop(&mut self) -> Option<PoolHandle> {
        let Some(slot) = self.available.pop() else {
            #[cfg(feature = "logging")]
            trace!(pool = %self.id, "pool exhausted");
            return None;
        };
        self.issued[slot as usize] = true;

        Some(PoolHandle {
            pool: self.id,
            slot,
            generation: self.generation,
        })
    }

    /// Returns a checked-out slot to the pool
    pub fn push(&mut self, handle: PoolHandle) -> MemoryResult<()> {
        self.check_origin(handle)?;
        let slot = handle.slot();
        if !self.issued[slot] {
            return Err(MemoryError::double_push(slot));
        }

        self.issued[slot] = false;
        self.available.push(handle.slot);
        Ok(())
    }

    /// Marks every slot free and invalidates all outstanding handles
    ///
    /// Values are not rebuilt; slots keep whatever their last holder wrote.
    pub fn reset(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.available.clear();
        self.available.extend(0..self.slots.len() as u32);
        self.issued.fill(false);

        #[cfg(feature = "logging")]
        debug!(pool = %self.id, generation = self.generation, "pool reset");
    }

    pub fn get(&self, handle: PoolHandle) -> MemoryResult<&T> {
        self.check_checked_out(handle)?;
        Ok(&self.slots[handle.slot()])
    }

    pub fn get_mut(&mut self, handle: PoolHandle) -> MemoryResult<&mut T> {
        self.check_checked_out(handle)?;
        Ok(&mut self.slots[handle.slot()])
    }

    /// Pool capacity
    #[inline]
    pub const fn size(&self) -> usize {
        N
    }

    /// Slots available to `pop`
    #[inline]
    pub fn free(&self) -> usize {
        self.available.len()
    }

    /// Slots currently checked out
    #[inline]
    pub fn used(&self) -> usize {
        N - self.available.len()
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.available.is_empty()
    }

    pub fn id(&self) -> AllocatorId {
        self.id
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    fn check_origin(&self, handle: PoolHandle) -> MemoryResult<()> {
        if handle.pool != self.id || handle.slot() >= N {
            #[cfg(feature = "logging")]
            tracing::warn!(pool = %self.id, foreign = %handle.pool, "foreign pool handle");
            return Err(MemoryError::ForeignHandle);
        }
        if handle.generation != self.generation {
            return Err(MemoryError::stale_handle(handle.generation, self.generation));
        }
        Ok(())
    }

    fn check_checked_out(&self, handle: PoolHandle) -> MemoryResult<()> {
        self.check_origin(handle)?;
        if self.issued[handle.slot()] {
            Ok(())
        } else {
            Err(MemoryError::invalid_state("pool slot is not checked out"))
        }
    }
}

impl<T: Default, const N: usize> FixedPool<T, N> {
    /// Builds the pool from `T::default()`
    pub fn from_default() -> MemoryResult<Self> {
        Self::new(T::default)
    }
}

impl<T, const N: usize> MemoryUsage for FixedPool<T, N> {
    fn used_memory(&self) -> usize {
        self.used() * size_of::<T>()
    }

    fn available_memory(&self) -> Option<usize> {
        Some(self.free() * size_of::<T>())
    }
}

impl<T, const N: usize> fmt::Debug for FixedPool<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedPool")
            .field("id", &self.id)
            .field("capacity", &N)
            .field("free", &self.free())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
