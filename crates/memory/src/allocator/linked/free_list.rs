//! Unordered free list threaded through block records

use super::block::{BlockArena, BlockId};

/// Singly linked list of free blocks
///
/// Released blocks are appended at the tail; allocation takes the first block
/// large enough. Links live in [`Block::next_free`](super::block::Block).
#[derive(Debug, Default)]
pub(crate) struct FreeList {
    head: Option<BlockId>,
    tail: Option<BlockId>,
    len: usize,
}

impl FreeList {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, arena: &mut BlockArena, id: BlockId) {
        arena[id].next_free = None;
        match self.tail {
            Some(tail) => arena[tail].next_free = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.len += 1;
    }

    /// Unlinks `id`; returns false if it was not on the list
    pub fn remove(&mut self, arena: &mut BlockArena, id: BlockId) -> bool {
        let mut prev: Option<BlockId> = None;
        let mut current = self.head;

        while let Some(node) = current {
            if node == id {
                let next = arena[node].next_free;
                match prev {
                    Some(p) => arena[p].next_free = next,
                    None => self.head = next,
                }
                if self.tail == Some(node) {
                    self.tail = prev;
                }
                arena[node].next_free = None;
                self.len -= 1;
                return true;
            }
            prev = current;
            current = arena[node].next_free;
        }
        false
    }

    /// First block whose size is at least `required`
    pub fn find_first(&self, arena: &BlockArena, required: usize) -> Option<BlockId> {
        self.iter(arena).find(|&id| arena[id].size >= required)
    }

    pub fn iter<'a>(&self, arena: &'a BlockArena) -> impl Iterator<Item = BlockId> + use<'a> {
        core::iter::successors(self.head, move |&id| arena[id].next_free)
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }
}
