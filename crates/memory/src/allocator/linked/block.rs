//! Block records and the arena that stores them
//!
//! Block headers do not live inside the region. Each block is a record in
//! [`BlockArena`], addressed by [`BlockId`], and the chain and free-list links
//! are ids rather than pointers into payload memory. Vacated slots are recycled
//! so the arena stays proportional to the peak block count.

use core::ops::{Index, IndexMut};

use crate::core::types::BlockStatus;
use crate::error::{MemoryError, MemoryResult};

/// Index of a block record in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct BlockId(u32);

impl BlockId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// One span of the region, free or live
#[derive(Debug, Clone, Copy)]
pub(crate) struct Block {
    /// Offset of the header from the region start
    pub offset: usize,
    /// Header, guards and payload
    pub size: usize,
    /// Payload size the caller asked for; zero while free
    pub requested: usize,
    pub status: BlockStatus,
    pub tag: Option<&'static str>,
    /// Address-ordered chain
    pub prev: Option<BlockId>,
    pub next: Option<BlockId>,
    /// Free list link, meaningful only while `status` is `Free`
    pub next_free: Option<BlockId>,
}

impl Block {
    pub fn free(offset: usize, size: usize) -> Self {
        Self {
            offset,
            size,
            requested: 0,
            status: BlockStatus::Free,
            tag: None,
            prev: None,
            next: None,
            next_free: None,
        }
    }

    /// One past the last byte of the block
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.size
    }
}

#[derive(Debug, Default)]
pub(crate) struct BlockArena {
    slots: Vec<Block>,
    vacant: Vec<BlockId>,
}

impl BlockArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `block`, reusing a vacated slot when one exists
    pub fn insert(&mut self, block: Block) -> MemoryResult<BlockId> {
        if let Some(id) = self.vacant.pop() {
            self.slots[id.index()] = block;
            return Ok(id);
        }

        let index =
            u32::try_from(self.slots.len()).map_err(|_| MemoryError::size_overflow("block index"))?;
        self.slots.push(block);
        Ok(BlockId(index))
    }

    /// Vacates the slot and hands back the record it held
    pub fn remove(&mut self, id: BlockId) -> Block {
        self.vacant.push(id);
        self.slots[id.index()]
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.vacant.clear();
    }

    /// Slots currently holding a block
    pub fn live_slots(&self) -> usize {
        self.slots.len() - self.vacant.len()
    }
}

impl Index<BlockId> for BlockArena {
    type Output = Block;

    #[inline]
    fn index(&self, id: BlockId) -> &Block {
        &self.slots[id.index()]
    }
}

impl IndexMut<BlockId> for BlockArena {
    #[inline]
    fn index_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.slots[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_recycled() {
        let mut arena = BlockArena::new();
        let a = arena.insert(Block::free(0, 32)).unwrap();
        let b = arena.insert(Block::free(32, 32)).unwrap();
        assert_eq!(arena.live_slots(), 2);

        let removed = arena.remove(a);
        assert_eq!(removed.offset, 0);
        assert_eq!(arena.live_slots(), 1);

        let c = arena.insert(Block::free(64, 16)).unwrap();
        assert_eq!(c, a);
        assert_eq!(arena[c].end(), 80);
        assert_eq!(arena[b].offset, 32);
    }
}
