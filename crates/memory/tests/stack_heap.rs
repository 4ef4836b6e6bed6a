//! Integration tests for the stack heap

use forge_memory::MemoryError;
use forge_memory::allocator::{HeapAllocator, StackHeap, StackHeapConfig};
use forge_memory::core::traits::StatisticsProvider;

fn heap(size: usize) -> StackHeap<'static> {
    StackHeap::with_config(size, StackHeapConfig::production())
        .expect("Failed to create stack heap")
}

#[test]
fn test_stack_heap_basic() -> Result<(), MemoryError> {
    let mut heap = heap(4096);
    let a = heap.allocate(128, Some("frame"))?;
    heap.payload_mut(a)?.fill(0x55);
    assert!(heap.payload(a)?.iter().all(|&b| b == 0x55));
    assert_eq!(heap.used_bytes(), 128);
    assert_eq!(heap.size(), 4096);
    assert!(heap.is_valid_pointer(a));
    Ok(())
}

#[test]
fn test_mark_and_release() {
    let mut heap = heap(1024);
    heap.allocate(32, None).unwrap();
    let free_before = heap.free_bytes();

    let marker = heap.mark().unwrap();
    assert_eq!(marker.depth(), 1);
    assert_eq!(marker.position(), 32);

    let a = heap.allocate(100, None).unwrap();
    heap.allocate(7, None).unwrap();

    assert_eq!(heap.release(), 108);
    assert_eq!(heap.free_bytes(), free_before);
    assert_eq!(heap.mark_count(), 0);
    assert!(!heap.is_valid_pointer(a));
}

#[test]
fn test_nested_marks_unwind_lifo() {
    let mut heap = heap(1024);
    heap.mark().unwrap();
    heap.allocate(16, None).unwrap();
    heap.mark().unwrap();
    heap.allocate(32, None).unwrap();
    heap.mark().unwrap();
    heap.allocate(64, None).unwrap();
    assert_eq!(heap.mark_count(), 3);

    assert_eq!(heap.release(), 64);
    assert_eq!(heap.used_bytes(), 48);
    assert_eq!(heap.release(), 32);
    assert_eq!(heap.used_bytes(), 16);
    assert_eq!(heap.release(), 16);
    assert_eq!(heap.used_bytes(), 0);
}

#[test]
fn test_release_without_marks_resets() {
    let mut heap = heap(256);
    heap.allocate(40, None).unwrap();
    heap.allocate(40, None).unwrap();
    assert_eq!(heap.release(), 80);
    assert_eq!(heap.used_bytes(), 0);
    assert_eq!(heap.release(), 0);
}

#[test]
fn test_release_to_marker_skips_inner_marks() {
    let mut heap = heap(512);
    let outer = heap.mark().unwrap();
    heap.allocate(16, None).unwrap();
    heap.mark().unwrap();
    heap.allocate(16, None).unwrap();

    assert_eq!(heap.release_to(outer).unwrap(), 32);
    assert_eq!(heap.mark_count(), 0);
}

#[test]
fn test_mark_stack_overflow() {
    let config = StackHeapConfig::production().with_max_marks(2);
    let mut heap = StackHeap::with_config(256, config).unwrap();
    heap.mark().unwrap();
    heap.mark().unwrap();

    assert_eq!(
        heap.mark().unwrap_err(),
        MemoryError::MarkStackOverflow { depth: 2 }
    );
    assert_eq!(heap.mark_count(), 2);

    let full = StackHeap::new(256).unwrap();
    assert_eq!(full.config().max_marks, 32);
}

#[test]
fn test_release_all_clears_marks() {
    let mut heap = heap(256);
    heap.mark().unwrap();
    heap.allocate(64, None).unwrap();
    heap.mark().unwrap();
    heap.release_all();
    assert_eq!(heap.mark_count(), 0);
    assert_eq!(heap.used_bytes(), 0);
}

#[test]
fn test_exhaustion_is_recoverable() {
    let mut heap = heap(64);
    heap.allocate(60, None).unwrap();
    let err = heap.allocate(8, None).unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(heap.allocate(4, None).unwrap().offset(), 60);
    assert_eq!(heap.allocate(0, None), Err(MemoryError::ZeroSizedAllocation));
    assert_eq!(heap.statistics().failed_allocations, 2);
}

#[test]
fn test_oversized_request_reports_out_of_memory() {
    let mut heap = heap(64);
    assert!(matches!(
        heap.allocate(usize::MAX, None),
        Err(MemoryError::OutOfMemory { requested: usize::MAX, .. })
    ));
}

#[test]
fn test_bounds_check() {
    let mut heap = StackHeap::with_config(256, StackHeapConfig::debug()).unwrap();
    let a = heap.allocate(12, None).unwrap();
    heap.allocate(4, None).unwrap();
    heap.bounds_check().unwrap();

    heap.region_mut()[a.offset() + 12] = 0;
    assert!(matches!(
        heap.bounds_check(),
        Err(MemoryError::CorruptionDetected { .. })
    ));

    assert!(heap.set_bounds_check(false).is_err());
    heap.release_all();
    heap.set_bounds_check(false).unwrap();
    assert!(!heap.is_bounds_check_enabled());
}

#[test]
fn test_external_buffer() {
    let mut buffer = [0u8; 67];
    let mut heap = StackHeap::from_buffer(&mut buffer, StackHeapConfig::production()).unwrap();
    assert_eq!(heap.size(), 64);
    heap.allocate(64, None).unwrap();
    assert!(heap.allocate(1, None).is_err());

    let mut tiny = [0u8; 8];
    assert!(matches!(
        StackHeap::from_buffer(&mut tiny, StackHeapConfig::default()),
        Err(MemoryError::RegionTooSmall { .. })
    ));
}

#[test]
fn test_heap_allocator_release_unwinds_to_mark() {
    let mut heap = heap(512);
    let keep = heap.allocate(16, None).unwrap();
    heap.mark().unwrap();
    let scratch = heap.allocate(32, None).unwrap();

    let other = StackHeap::new(512).unwrap();
    assert!(!HeapAllocator::owns(&other, scratch));

    HeapAllocator::release(&mut heap, scratch).unwrap();
    assert!(heap.is_valid_pointer(keep));
    assert!(!heap.is_valid_pointer(scratch));
    assert!(matches!(
        HeapAllocator::release(&mut heap, scratch),
        Err(MemoryError::InvalidAddress { .. })
    ));
}

#[test]
fn test_heap_allocator_release_rejects_address_below_mark() {
    let mut heap = heap(512);
    let keep = heap.allocate(16, None).unwrap();
    heap.mark().unwrap();
    let scratch = heap.allocate(32, None).unwrap();
    let used = heap.used_bytes();

    assert!(matches!(
        HeapAllocator::release(&mut heap, keep),
        Err(MemoryError::InvalidState { .. })
    ));
    assert!(heap.is_valid_pointer(keep));
    assert!(heap.is_valid_pointer(scratch));
    assert_eq!(heap.used_bytes(), used);
    assert_eq!(heap.mark_count(), 1);

    HeapAllocator::release(&mut heap, scratch).unwrap();
    assert_eq!(heap.mark_count(), 0);
    HeapAllocator::release(&mut heap, keep).unwrap();
    assert_eq!(heap.used_bytes(), 0);
}

#[test]
fn test_usage_by_tag() {
    let mut heap = heap(512);
    heap.allocate(32, Some("particles")).unwrap();
    heap.allocate(32, Some("particles")).unwrap();
    heap.allocate(8, Some("ui")).unwrap();

    let tags = heap.usage_by_tag();
    assert_eq!(tags[0].tag, Some("particles"));
    assert_eq!(tags[0].allocations, 2);
    assert_eq!(heap.blocks().count(), 3);
}
