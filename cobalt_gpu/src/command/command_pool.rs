/// Command pool - allocates command buffers and tracks their slot indices

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use crate::device::{CommandAllocator, CommandBufferLevel, GraphicsDevice};
use crate::error::{Error, Result};
use crate::resource::Resource;
use crate::utils::SlotAllocator;
use super::CommandBuffer;

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// Source of [`CommandBuffer`]s
///
/// Lives in the ResourceManager; allocation goes through `&self` so a pool
/// can be used while other resources are borrowed from the same manager.
/// Each buffer gets a slot index that is recycled when the buffer is
/// released or dropped.
pub struct CommandPool {
    id: u64,
    allocator: Mutex<Box<dyn CommandAllocator>>,
    slots: Arc<Mutex<SlotAllocator>>,
}

impl CommandPool {
    /// Create a pool on the device's graphics queue family
    pub fn new(device: &dyn GraphicsDevice) -> Result<Self> {
        let allocator = device.create_command_allocator()?;
        Ok(Self::from_allocator(allocator))
    }

    /// Wrap an existing backend allocator
    pub fn from_allocator(allocator: Box<dyn CommandAllocator>) -> Self {
        let id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);
        crate::engine_debug!("cobalt::CommandPool", "Command pool {} created", id);
        Self {
            id,
            allocator: Mutex::new(allocator),
            slots: Arc::new(Mutex::new(SlotAllocator::new())),
        }
    }

    /// Allocate one command buffer in the `Initial` state
    pub fn allocate(&self, level: CommandBufferLevel) -> Result<CommandBuffer> {
        let recorder = self
            .allocator
            .lock()
            .map_err(|_| crate::engine_err!("cobalt::CommandPool", "Command allocator mutex poisoned"))?
            .allocate(level)?;
        let index = self.lock_slots()?.alloc();
        Ok(CommandBuffer::new(recorder, level, self.id, index, self.slots.clone()))
    }

    /// Allocate `count` command buffers of the same level
    ///
    /// On failure the buffers allocated so far are released.
    pub fn allocate_many(&self, level: CommandBufferLevel, count: usize) -> Result<Vec<CommandBuffer>> {
        let mut buffers = Vec::with_capacity(count);
        for _ in 0..count {
            match self.allocate(level) {
                Ok(buffer) => buffers.push(buffer),
                Err(e) => {
                    for buffer in buffers {
                        let _ = self.release(buffer);
                    }
                    return Err(e);
                }
            }
        }
        Ok(buffers)
    }

    /// Free a command buffer and recycle its slot index
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if the buffer was allocated by another pool.
    pub fn release(&self, buffer: CommandBuffer) -> Result<()> {
        if buffer.pool_id() != self.id {
            return Err(Error::InvalidResource(format!(
                "command buffer of pool {} released to pool {}",
                buffer.pool_id(),
                self.id
            )));
        }
        // The buffer hands its slot back when dropped
        drop(buffer);
        Ok(())
    }

    /// Number of live command buffers
    pub fn allocated_count(&self) -> u32 {
        self.slots.lock().map(|slots| slots.len()).unwrap_or(0)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    fn lock_slots(&self) -> Result<std::sync::MutexGuard<'_, SlotAllocator>> {
        self.slots
            .lock()
            .map_err(|_| crate::engine_err!("cobalt::CommandPool", "Slot allocator mutex poisoned"))
    }
}

impl Resource for CommandPool {}

#[cfg(test)]
#[path = "command_pool_tests.rs"]
mod tests;
