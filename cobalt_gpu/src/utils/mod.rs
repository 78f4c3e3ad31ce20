//! Small data structures shared by the core modules

mod slot_allocator;

pub use slot_allocator::SlotAllocator;
