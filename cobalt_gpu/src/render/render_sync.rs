/// Per-frame and per-image synchronization objects
///
/// Frame slots (indexed by the renderer's current frame) own a command
/// buffer, an in-flight fence and an acquire semaphore. Submit semaphores are
/// indexed by swapchain image instead, since presentation of image `i` must
/// wait on the submission that rendered image `i`.
///
/// Dropping a `RenderSync` that was never released waits on every frame
/// fence first, so fences and command buffers are not destroyed under
/// in-flight work.

use std::time::Duration;
use crate::command::{CommandBuffer, CommandPool};
use crate::device::{CommandBufferLevel, Fence, GraphicsDevice, Semaphore};
use crate::error::{Error, Result};

/// Upper bound for each fence wait when dropped without `release`
const DROP_FENCE_TIMEOUT: Duration = Duration::from_secs(1);

/// Objects owned by one frame in flight
pub struct FrameSync {
    pub command_buffer: CommandBuffer,
    /// Signaled when this slot's last submission completed (created signaled)
    pub in_flight_fence: Box<dyn Fence>,
    /// Signaled by the swapchain when the acquired image is ready
    pub acquire_semaphore: Box<dyn Semaphore>,
}

pub struct RenderSync {
    frames: Vec<FrameSync>,
    image_sync: Vec<Box<dyn Semaphore>>,
}

impl RenderSync {
    /// Create `frame_count` frame slots and `image_count` submit semaphores
    pub fn new(
        device: &dyn GraphicsDevice,
        pool: &CommandPool,
        frame_count: u32,
        image_count: u32,
    ) -> Result<Self> {
        let mut frames = Vec::with_capacity(frame_count as usize);
        for _ in 0..frame_count {
            frames.push(FrameSync {
                command_buffer: pool.allocate(CommandBufferLevel::Primary)?,
                in_flight_fence: device.create_fence(true)?,
                acquire_semaphore: device.create_semaphore()?,
            });
        }

        let image_sync = Self::create_semaphores(device, image_count)?;

        crate::engine_debug!(
            "cobalt::RenderSync",
            "Created {} frame slots and {} image semaphores",
            frame_count,
            image_count
        );

        Ok(Self { frames, image_sync })
    }

    pub fn frame_sync(&self, frame: u32) -> Result<&FrameSync> {
        self.frames
            .get(frame as usize)
            .ok_or_else(|| Self::out_of_range("frame", frame, self.frames.len()))
    }

    pub fn frame_sync_mut(&mut self, frame: u32) -> Result<&mut FrameSync> {
        let count = self.frames.len();
        self.frames
            .get_mut(frame as usize)
            .ok_or_else(|| Self::out_of_range("frame", frame, count))
    }

    /// Semaphore signaled by the submission that renders `image`
    pub fn image_sync(&self, image: u32) -> Result<&dyn Semaphore> {
        self.image_sync
            .get(image as usize)
            .map(|semaphore| &**semaphore)
            .ok_or_else(|| Self::out_of_range("image", image, self.image_sync.len()))
    }

    /// Replace the per-image semaphores after a swapchain recreation
    ///
    /// The device must be idle.
    pub fn rebuild_image_sync(&mut self, device: &dyn GraphicsDevice, image_count: u32) -> Result<()> {
        self.image_sync = Self::create_semaphores(device, image_count)?;
        crate::engine_debug!("cobalt::RenderSync", "Rebuilt {} image semaphores", image_count);
        Ok(())
    }

    pub fn frame_count(&self) -> u32 {
        self.frames.len() as u32
    }

    pub fn image_count(&self) -> u32 {
        self.image_sync.len() as u32
    }

    /// Give the command buffers back to the pool they came from
    ///
    /// The caller guarantees the device is idle. Every buffer is handed back
    /// even if one is rejected; the first error is returned.
    pub fn release(mut self, pool: &CommandPool) -> Result<()> {
        let mut result = Ok(());
        for frame in std::mem::take(&mut self.frames) {
            if let Err(e) = pool.release(frame.command_buffer) {
                crate::engine_error!("cobalt::RenderSync", "Failed to release command buffer: {}", e);
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }

    fn create_semaphores(device: &dyn GraphicsDevice, count: u32) -> Result<Vec<Box<dyn Semaphore>>> {
        (0..count).map(|_| device.create_semaphore()).collect()
    }

    fn out_of_range(kind: &str, index: u32, count: usize) -> Error {
        Error::InvalidResource(format!("{} index {} out of range ({} available)", kind, index, count))
    }
}

impl Drop for RenderSync {
    fn drop(&mut self) {
        if self.frames.is_empty() {
            return;
        }
        crate::engine_warn!(
            "cobalt::RenderSync",
            "Dropped without release, waiting on {} frame fences",
            self.frames.len()
        );
        for (index, frame) in self.frames.iter().enumerate() {
            if let Err(e) = frame.in_flight_fence.wait(DROP_FENCE_TIMEOUT) {
                crate::engine_error!(
                    "cobalt::RenderSync",
                    "Frame {} fence wait failed during drop: {}",
                    index,
                    e
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "render_sync_tests.rs"]
mod tests;
