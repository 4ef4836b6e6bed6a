//! Integration tests for the fixed-object pool

use forge_memory::MemoryError;
use forge_memory::core::traits::MemoryUsage;
use forge_memory::pool::FixedPool;

#[derive(Debug, Default, Clone, PartialEq)]
struct Particle {
    position: [f32; 2],
    ttl: u16,
}

#[test]
fn test_pop_until_exhausted() {
    let mut pool: FixedPool<Particle, 4> = FixedPool::from_default().unwrap();
    assert_eq!(pool.size(), 4);

    let handles: Vec<_> = (0..4).map(|_| pool.pop().unwrap()).collect();
    assert!(pool.is_exhausted());
    assert_eq!(pool.pop(), None);
    assert_eq!(pool.used(), 4);

    for handle in handles {
        pool.push(handle).unwrap();
    }
    assert_eq!(pool.free(), 4);
}

#[test]
fn test_values_persist_across_checkout() {
    let mut pool: FixedPool<Particle, 2> = FixedPool::from_default().unwrap();
    let handle = pool.pop().unwrap();
    pool.get_mut(handle).unwrap().ttl = 30;
    assert_eq!(pool.get(handle).unwrap().ttl, 30);

    pool.push(handle).unwrap();
    let again = pool.pop().unwrap();
    assert_eq!(again.slot(), handle.slot());
    assert_eq!(pool.get(again).unwrap().ttl, 30);
}

#[test]
fn test_double_push_rejected() {
    let mut pool: FixedPool<u64, 3> = FixedPool::from_default().unwrap();
    let handle = pool.pop().unwrap();
    pool.push(handle).unwrap();

    assert_eq!(
        pool.push(handle),
        Err(MemoryError::DoublePush {
            slot: handle.slot()
        })
    );
    assert_eq!(pool.free(), 3);
}

#[test]
fn test_foreign_handle_rejected() {
    let mut first: FixedPool<u8, 2> = FixedPool::from_default().unwrap();
    let mut second: FixedPool<u8, 2> = FixedPool::from_default().unwrap();
    let handle = first.pop().unwrap();
    second.pop().unwrap();

    assert_eq!(second.push(handle), Err(MemoryError::ForeignHandle));
    assert!(second.get(handle).is_err());
    assert_eq!(second.used(), 1);
}

#[test]
fn test_reset_invalidates_handles() {
    let mut pool: FixedPool<Particle, 3> = FixedPool::from_default().unwrap();
    let stale = pool.pop().unwrap();
    pool.pop().unwrap();

    pool.reset();
    assert_eq!(pool.free(), 3);
    assert_eq!(pool.generation(), 1);
    assert_eq!(
        pool.push(stale),
        Err(MemoryError::StaleHandle {
            handle: 0,
            current: 1
        })
    );
    assert!(pool.get(stale).is_err());

    let fresh = pool.pop().unwrap();
    assert_eq!(fresh.generation(), 1);
    pool.push(fresh).unwrap();
}

#[test]
fn test_memory_usage() {
    let mut pool: FixedPool<[u8; 16], 4> = FixedPool::from_default().unwrap();
    pool.pop().unwrap();
    assert_eq!(pool.used_memory(), 16);
    assert_eq!(pool.available_memory(), Some(48));
    assert_eq!(pool.memory_usage_percent(), Some(25.0));
}

#[test]
fn test_factory_constructs_every_slot() {
    let mut pool: FixedPool<Vec<u8>, 3> = FixedPool::new(|| Vec::with_capacity(64)).unwrap();
    while let Some(handle) = pool.pop() {
        assert!(pool.get(handle).unwrap().capacity() >= 64);
    }
}
