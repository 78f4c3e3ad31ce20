/// GraphicsDevice trait - entry point of a graphics backend

use std::time::Duration;
use crate::error::Result;
use crate::resource::AsAny;
use super::{CommandAllocator, Queue};

/// Logical GPU device
///
/// Creates synchronization primitives and command allocators, and exposes
/// the queue used for both submission and presentation.
pub trait GraphicsDevice: Send {
    /// Create a fence, optionally already signaled
    ///
    /// Frame fences are created signaled so the first wait of every frame
    /// slot returns immediately.
    fn create_fence(&self, signaled: bool) -> Result<Box<dyn Fence>>;

    /// Create a binary semaphore
    fn create_semaphore(&self) -> Result<Box<dyn Semaphore>>;

    /// Create a command allocator bound to the graphics queue family
    fn create_command_allocator(&self) -> Result<Box<dyn CommandAllocator>>;

    /// Queue used for submission and presentation
    fn graphics_queue(&self) -> &dyn Queue;

    /// Block until the device has no pending work
    fn wait_idle(&self) -> Result<()>;

    /// Device index for multi-device submissions
    fn device_index(&self) -> u32 {
        0
    }
}

/// CPU-visible completion signal for one submission
pub trait Fence: AsAny + Send + Sync {
    /// Wait until signaled
    ///
    /// # Errors
    ///
    /// `Error::Timeout` if `timeout` expires first.
    fn wait(&self, timeout: Duration) -> Result<()>;

    /// Return to the unsignaled state
    fn reset(&self) -> Result<()>;

    fn is_signaled(&self) -> Result<bool>;
}

/// GPU-side ordering primitive between submissions and presentation
pub trait Semaphore: AsAny + Send + Sync {}
