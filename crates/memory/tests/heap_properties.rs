//! Property tests for heap and pool invariants

use forge_memory::MemoryError;
use forge_memory::allocator::{
    Address, LinkedHeap, LinkedHeapConfig, StackHeap, StackHeapConfig,
};
use forge_memory::core::types::BlockStatus;
use forge_memory::pool::FixedPool;
use proptest::prelude::*;
use proptest::sample::Index;

#[derive(Debug, Clone)]
enum HeapOp {
    Allocate(usize),
    Release(Index),
}

fn heap_ops() -> impl Strategy<Value = Vec<HeapOp>> {
    prop::collection::vec(
        prop_oneof![
            3 => (1usize..300).prop_map(HeapOp::Allocate),
            2 => any::<Index>().prop_map(HeapOp::Release),
        ],
        1..120,
    )
}

fn linked(size: usize) -> LinkedHeap<'static> {
    LinkedHeap::with_config(size, LinkedHeapConfig::production()).unwrap()
}

fn assert_disjoint(live: &[(Address, usize)]) {
    let mut ranges: Vec<_> = live
        .iter()
        .map(|&(address, size)| (address.offset(), address.offset() + size))
        .collect();
    ranges.sort_unstable();
    for pair in ranges.windows(2) {
        assert!(pair[0].1 <= pair[1].0, "overlap: {pair:?}");
    }
}

proptest! {
    #[test]
    fn release_restores_counters_at_tail(
        prefix in prop::collection::vec(1usize..200, 0..6),
        size in 1usize..2000,
    ) {
        let mut heap = linked(8192);
        for &s in &prefix {
            heap.allocate(s, None).unwrap();
        }
        let (used, cursor) = (heap.used_bytes(), heap.growth_cursor());

        let address = heap.allocate(size, None).unwrap();
        heap.release(address).unwrap();

        prop_assert_eq!(heap.used_bytes(), used);
        prop_assert_eq!(heap.free_bytes(), heap.capacity() - used);
        prop_assert_eq!(heap.growth_cursor(), cursor);
    }

    #[test]
    fn release_restores_used_bytes_mid_chain(size in 1usize..1000) {
        let mut heap = linked(4096);
        heap.allocate(32, None).unwrap();
        let used = heap.used_bytes();

        let address = heap.allocate(size, None).unwrap();
        heap.allocate(32, None).unwrap();
        heap.release(address).unwrap();

        // Only the pin allocated after `address` remains on top of `used`
        prop_assert_eq!(heap.used_bytes(), used + 48);
        prop_assert_eq!(heap.free_block_count(), 1);
        heap.check_invariants().unwrap();
    }

    #[test]
    fn live_allocations_never_overlap(ops in heap_ops()) {
        let mut heap = linked(4096);
        let mut live: Vec<(Address, usize)> = Vec::new();

        for op in ops {
            match op {
                HeapOp::Allocate(size) => match heap.allocate(size, None) {
                    Ok(address) => live.push((address, size)),
                    Err(MemoryError::OutOfMemory { .. }) => {}
                    Err(other) => panic!("unexpected error: {other}"),
                },
                HeapOp::Release(index) => {
                    if !live.is_empty() {
                        let (address, _) = live.swap_remove(index.index(live.len()));
                        heap.release(address).unwrap();
                    }
                }
            }
            assert_disjoint(&live);
            heap.check_invariants().unwrap();
        }

        for &(address, _) in &live {
            prop_assert!(heap.is_valid_pointer(address));
        }
    }

    #[test]
    fn coalescing_is_order_independent(
        sizes in prop::collection::vec(1usize..128, 2..8),
        order in Just((0..8).collect::<Vec<usize>>()).prop_shuffle(),
    ) {
        let mut heap = linked(4096);
        heap.allocate(16, None).unwrap();
        let run: Vec<_> = sizes.iter().map(|&s| heap.allocate(s, None).unwrap()).collect();
        heap.allocate(16, None).unwrap();

        let expected: usize = heap
            .blocks()
            .skip(1)
            .take(run.len())
            .map(|block| block.size)
            .sum();

        for index in order.into_iter().filter(|&i| i < run.len()) {
            heap.release(run[index]).unwrap();
        }

        let free: Vec<_> = heap
            .blocks()
            .filter(|block| block.status == BlockStatus::Free)
            .collect();
        prop_assert_eq!(free.len(), 1);
        prop_assert_eq!(free[0].size, expected);
        heap.check_invariants().unwrap();
    }

    #[test]
    fn reverse_release_empties_heap(sizes in prop::collection::vec(1usize..256, 1..40)) {
        let mut heap = linked(16 * 1024);
        let addresses: Vec<_> = sizes.iter().map(|&s| heap.allocate(s, None).unwrap()).collect();

        for address in addresses.into_iter().rev() {
            heap.release(address).unwrap();
        }

        prop_assert_eq!(heap.used_bytes(), 0);
        prop_assert_eq!(heap.growth_cursor(), 0);
        prop_assert_eq!(heap.block_count(), 0);
    }

    #[test]
    fn stack_unwind_restores_free_bytes(
        before in 0usize..256,
        a in 1usize..512,
        b in 1usize..512,
    ) {
        let mut heap = StackHeap::with_config(2048, StackHeapConfig::production()).unwrap();
        if before > 0 {
            heap.allocate(before, None).unwrap();
        }
        let free = heap.free_bytes();

        heap.mark().unwrap();
        heap.allocate(a, None).unwrap();
        heap.allocate(b, None).unwrap();
        heap.release();

        prop_assert_eq!(heap.free_bytes(), free);
    }

    #[test]
    fn guard_overrun_is_detected(size in 1usize..256, pad in 1usize..64) {
        let mut heap = LinkedHeap::with_config(1024, LinkedHeapConfig::debug()).unwrap();
        let address = heap.allocate(size, None).unwrap();
        heap.allocate(pad, None).unwrap();
        prop_assert!(heap.bounds_check().is_ok());

        heap.region_mut()[address.offset() + size] ^= 0x5A;
        let detected = matches!(
            heap.bounds_check(),
            Err(MemoryError::CorruptionDetected { .. })
        );
        prop_assert!(detected);
    }
}

#[derive(Debug, Clone)]
enum PoolOp {
    Pop,
    Push(Index),
    Reset,
}

proptest! {
    #[test]
    fn pool_conserves_slots(
        ops in prop::collection::vec(
            prop_oneof![
                4 => Just(PoolOp::Pop),
                4 => any::<Index>().prop_map(PoolOp::Push),
                1 => Just(PoolOp::Reset),
            ],
            1..200,
        )
    ) {
        let mut pool: FixedPool<u32, 16> = FixedPool::from_default().unwrap();
        let mut held = Vec::new();

        for op in ops {
            match op {
                PoolOp::Pop => {
                    if let Some(handle) = pool.pop() {
                        held.push(handle);
                    } else {
                        prop_assert_eq!(held.len(), 16);
                    }
                }
                PoolOp::Push(index) => {
                    if !held.is_empty() {
                        let handle = held.swap_remove(index.index(held.len()));
                        pool.push(handle).unwrap();
                    }
                }
                PoolOp::Reset => {
                    pool.reset();
                    held.clear();
                }
            }
            prop_assert_eq!(pool.free() + pool.used(), pool.size());
            prop_assert_eq!(pool.used(), held.len());
        }
    }
}
