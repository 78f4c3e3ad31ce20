use super::*;
use crate::device::mock_graphics_device::{MockCommandAllocator, MockGraphicsDevice};
use crate::command::CommandBufferState;
use std::sync::atomic::Ordering;

#[test]
fn test_allocate_assigns_sequential_indices() {
    let device = MockGraphicsDevice::new();
    let pool = CommandPool::new(&device).unwrap();

    let a = pool.allocate(CommandBufferLevel::Primary).unwrap();
    let b = pool.allocate(CommandBufferLevel::Secondary).unwrap();

    assert_eq!(a.pool_index(), 0);
    assert_eq!(b.pool_index(), 1);
    assert_eq!(b.level(), CommandBufferLevel::Secondary);
    assert_eq!(a.state(), CommandBufferState::Initial);
    assert_eq!(pool.allocated_count(), 2);
}

#[test]
fn test_release_recycles_index_and_frees_recorder() {
    let allocator = MockCommandAllocator::new();
    let live = allocator.allocated();
    let pool = CommandPool::from_allocator(Box::new(allocator));

    let a = pool.allocate(CommandBufferLevel::Primary).unwrap();
    let _b = pool.allocate(CommandBufferLevel::Primary).unwrap();
    pool.release(a).unwrap();

    assert_eq!(live.load(Ordering::SeqCst), 1);
    assert_eq!(pool.allocated_count(), 1);
    assert_eq!(pool.allocate(CommandBufferLevel::Primary).unwrap().pool_index(), 0);
}

#[test]
fn test_allocate_many() {
    let device = MockGraphicsDevice::new();
    let pool = CommandPool::new(&device).unwrap();

    let buffers = pool.allocate_many(CommandBufferLevel::Primary, 3).unwrap();

    let indices: Vec<u32> = buffers.iter().map(|b| b.pool_index()).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn test_allocation_failure_propagates() {
    let pool = CommandPool::from_allocator(Box::new(MockCommandAllocator::failing()));

    assert!(matches!(pool.allocate(CommandBufferLevel::Primary), Err(Error::OutOfMemory)));
    assert!(matches!(pool.allocate_many(CommandBufferLevel::Primary, 2), Err(Error::OutOfMemory)));
    assert_eq!(pool.allocated_count(), 0);
}

#[test]
fn test_release_to_foreign_pool_is_rejected() {
    let device = MockGraphicsDevice::new();
    let first = CommandPool::new(&device).unwrap();
    let second = CommandPool::new(&device).unwrap();
    assert_ne!(first.id(), second.id());

    let buffer = first.allocate(CommandBufferLevel::Primary).unwrap();

    assert!(matches!(second.release(buffer), Err(Error::InvalidResource(_))));
    assert_eq!(first.allocated_count(), 1);
}

#[test]
fn test_dropped_buffer_returns_its_slot() {
    let allocator = MockCommandAllocator::new();
    let live = allocator.allocated();
    let pool = CommandPool::from_allocator(Box::new(allocator));

    let a = pool.allocate(CommandBufferLevel::Primary).unwrap();
    let _b = pool.allocate(CommandBufferLevel::Primary).unwrap();
    drop(a);

    assert_eq!(pool.allocated_count(), 1);
    assert_eq!(live.load(Ordering::SeqCst), 1);
    assert_eq!(pool.allocate(CommandBufferLevel::Primary).unwrap().pool_index(), 0);
}

#[test]
fn test_buffer_outliving_pool_is_harmless() {
    let device = MockGraphicsDevice::new();
    let pool = CommandPool::new(&device).unwrap();
    let buffer = pool.allocate(CommandBufferLevel::Primary).unwrap();

    drop(pool);

    assert_eq!(buffer.pool_index(), 0);
    drop(buffer);
}
