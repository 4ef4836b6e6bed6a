//! Diagnostic dumps of heap contents
//!
//! Not part of the allocation contract. These are snapshots meant for debug
//! output: a per-block listing in address order and a per-tag usage summary.

use core::fmt;

use hashbrown::HashMap;

use crate::core::types::BlockStatus;

/// Snapshot of one linked heap block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    /// Offset of the block (header included) from the region start
    pub offset: usize,
    /// Total block size: header, guards and payload
    pub size: usize,
    /// Payload size the caller asked for; zero for free blocks
    pub requested: usize,
    pub status: BlockStatus,
    pub tag: Option<&'static str>,
}

/// Live bytes attributed to one allocation tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagUsage {
    /// `None` collects untagged allocations
    pub tag: Option<&'static str>,
    pub allocations: usize,
    pub bytes: usize,
}

/// Aggregates live blocks by tag, largest consumer first
pub(crate) fn usage_by_tag<I>(blocks: I) -> Vec<TagUsage>
where
    I: IntoIterator<Item = (Option<&'static str>, usize)>,
{
    let mut totals: HashMap<Option<&'static str>, (usize, usize)> = HashMap::new();
    for (tag, size) in blocks {
        let entry = totals.entry(tag).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += size;
    }

    let mut usage: Vec<TagUsage> = totals
        .into_iter()
        .map(|(tag, (allocations, bytes))| TagUsage {
            tag,
            allocations,
            bytes,
        })
        .collect();
    usage.sort_by(|a, b| b.bytes.cmp(&a.bytes).then_with(|| a.tag.cmp(&b.tag)));
    usage
}

/// Printable heap dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapReport {
    pub name: &'static str,
    pub capacity: usize,
    pub used_bytes: usize,
    pub growth_cursor: usize,
    pub blocks: Vec<BlockInfo>,
    pub tags: Vec<TagUsage>,
}

impl fmt::Display for HeapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} heap: {} / {} bytes used, cursor at {:#x}",
            self.name, self.used_bytes, self.capacity, self.growth_cursor
        )?;

        writeln!(f, "  blocks:")?;
        for block in &self.blocks {
            write!(
                f,
                "    {:#08x} {:>8} bytes {:<6}",
                block.offset, block.size, block.status
            )?;
            if block.status.is_live() {
                write!(f, " requested {}", block.requested)?;
            }
            if let Some(tag) = block.tag {
                write!(f, " [{tag}]")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "  usage by tag:")?;
        for usage in &self.tags {
            writeln!(
                f,
                "    {:<24} {:>4} allocations {:>8} bytes",
                usage.tag.unwrap_or("<untagged>"),
                usage.allocations,
                usage.bytes
            )?;
        }
        Ok(())
    }
}
