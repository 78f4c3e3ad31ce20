/// Renderer - drives the per-frame loop over N frames in flight
///
/// Each `render` call runs: wait on the frame slot's fence, acquire a
/// swapchain image, record through the user callbacks, submit, advance the
/// frame slot, present. The device and swapchain are resolved from the
/// ResourceManager on every call; the renderer only holds their handles.

use std::time::Duration;
use crate::command::{CommandBuffer, CommandPool};
use crate::device::{GraphicsDevice, PipelineStages, PresentInfo, PresentStatus, SubmitInfo, Swapchain};
use crate::error::{Error, Result};
use crate::resource::{Handle, Resource, ResourceManager};
use super::RenderSync;

/// Called with the frame index before recording
pub type UpdateUniformBufferFn = Box<dyn FnMut(u32) + Send>;

/// Called with `(command_buffer, swapchain, image_index, frame_index)`
pub type RecordCommandBufferFn<S> = Box<dyn FnMut(&mut CommandBuffer, &S, u32, u32) + Send>;

/// Renderer tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererConfig {
    /// Number of frames the CPU may record ahead of the GPU
    pub max_frames_in_flight: u32,
    /// Upper bound for the per-frame fence wait
    pub fence_timeout: Duration,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_frames_in_flight: 2,
            fence_timeout: Duration::from_secs(1),
        }
    }
}

/// Everything a Renderer needs, by handle
pub struct RendererCreateInfo<D, S> {
    pub device: Handle<D>,
    pub swapchain: Handle<S>,
    pub command_pool: Handle<CommandPool>,
    pub config: RendererConfig,
}

pub struct Renderer<D, S>
where
    D: GraphicsDevice + Resource,
    S: Swapchain + Resource,
{
    device: Handle<D>,
    swapchain: Handle<S>,
    command_pool: Handle<CommandPool>,
    sync: RenderSync,
    max_frames_in_flight: u32,
    fence_timeout: Duration,
    current_frame: u32,
    update_uniform_buffer: Option<UpdateUniformBufferFn>,
    record_command_buffer: Option<RecordCommandBufferFn<S>>,
}

impl<D, S> Renderer<D, S>
where
    D: GraphicsDevice + Resource,
    S: Swapchain + Resource,
{
    /// Create the frame slots and per-image semaphores
    ///
    /// # Errors
    ///
    /// - `Error::InitializationFailed` if `max_frames_in_flight` is 0
    /// - `Error::StaleHandle` / `Error::InvalidResource` for bad handles
    /// - backend errors from fence, semaphore or command buffer creation
    pub fn new(resources: &ResourceManager, info: RendererCreateInfo<D, S>) -> Result<Self> {
        let frames = info.config.max_frames_in_flight;
        if frames == 0 {
            crate::engine_error!("cobalt::Renderer", "max_frames_in_flight must be at least 1");
            return Err(Error::InitializationFailed(
                "max_frames_in_flight must be at least 1".to_string(),
            ));
        }

        let device = resources.get(info.device)?;
        let swapchain = resources.get(info.swapchain)?;
        let pool = resources.get(info.command_pool)?;

        let sync = RenderSync::new(device, pool, frames, swapchain.image_count())?;

        crate::engine_info!(
            "cobalt::Renderer",
            "Renderer created ({} frames in flight, {} swapchain images)",
            frames,
            swapchain.image_count()
        );

        Ok(Self {
            device: info.device,
            swapchain: info.swapchain,
            command_pool: info.command_pool,
            sync,
            max_frames_in_flight: frames,
            fence_timeout: info.config.fence_timeout,
            current_frame: 0,
            update_uniform_buffer: None,
            record_command_buffer: None,
        })
    }

    pub fn set_record_command_buffer_fn<F>(&mut self, record: F)
    where
        F: FnMut(&mut CommandBuffer, &S, u32, u32) + Send + 'static,
    {
        self.record_command_buffer = Some(Box::new(record));
    }

    pub fn set_update_uniform_buffer_fn<F>(&mut self, update: F)
    where
        F: FnMut(u32) + Send + 'static,
    {
        self.update_uniform_buffer = Some(Box::new(update));
    }

    /// Render one frame
    ///
    /// # Returns
    ///
    /// The presentation status. `Suboptimal` still presented.
    ///
    /// # Errors
    ///
    /// - `Error::Timeout` if the frame slot's previous submission did not
    ///   finish in time; nothing changed
    /// - `Error::SwapchainOutOfDate` from acquire (nothing submitted, frame
    ///   slot unchanged) or from present (frame submitted and advanced)
    pub fn render(&mut self, resources: &ResourceManager) -> Result<PresentStatus> {
        let device = resources.get(self.device)?;
        let swapchain = resources.get(self.swapchain)?;
        let frame_index = self.current_frame;

        // 1. Wait until the GPU is done with this slot
        {
            let frame = self.sync.frame_sync_mut(frame_index)?;
            if let Err(e) = frame.in_flight_fence.wait(self.fence_timeout) {
                crate::engine_warn!("cobalt::Renderer", "Frame {} fence wait failed: {}", frame_index, e);
                return Err(e);
            }
            frame.command_buffer.unlock();
        }

        // 2. Acquire; the fence stays signaled if there is nothing to submit
        let acquired = {
            let frame = self.sync.frame_sync(frame_index)?;
            swapchain.acquire_next_image(frame.acquire_semaphore.as_ref())?
        };
        let image_index = match acquired {
            Some(index) => index,
            None => {
                crate::engine_debug!("cobalt::Renderer", "Swapchain out of date on acquire");
                return Err(Error::SwapchainOutOfDate);
            }
        };

        // 3. Record
        self.sync.frame_sync(frame_index)?.in_flight_fence.reset()?;

        if let Some(update) = self.update_uniform_buffer.as_mut() {
            update(frame_index);
        }
        if let Some(record) = self.record_command_buffer.as_mut() {
            let frame = self.sync.frame_sync_mut(frame_index)?;
            record(&mut frame.command_buffer, swapchain, image_index, frame_index);
        }

        // 4. Submit
        {
            let frame = self.sync.frame_sync(frame_index)?;
            let render_done = self.sync.image_sync(image_index)?;

            let mut submit = SubmitInfo::new(device.device_index())
                .wait(frame.acquire_semaphore.as_ref(), PipelineStages::COLOR_ATTACHMENT_OUTPUT);
            if frame.command_buffer.is_recorded() {
                submit = submit.execute(&frame.command_buffer);
            } else {
                crate::engine_trace!("cobalt::Renderer", "Frame {} has no recorded commands", frame_index);
            }
            submit = submit.signal(render_done, PipelineStages::ALL_COMMANDS);

            device
                .graphics_queue()
                .submit(&submit, Some(frame.in_flight_fence.as_ref()))
                .map_err(|e| {
                    crate::engine_error!("cobalt::Renderer", "Frame {} submit failed: {}", frame_index, e);
                    e
                })?;
        }
        self.sync.frame_sync_mut(frame_index)?.command_buffer.lock();

        // 5. Advance
        self.current_frame = (self.current_frame + 1) % self.max_frames_in_flight;

        // 6. Present after the submission that rendered this image
        let present = PresentInfo::new()
            .wait(self.sync.image_sync(image_index)?)
            .present(swapchain, image_index);
        let status = device.graphics_queue().present(&present)?;

        crate::engine_trace!(
            "cobalt::Renderer",
            "Frame {} presented image {} ({:?})",
            frame_index,
            image_index,
            status
        );

        Ok(status)
    }

    /// Frame slot used by the next `render`
    pub fn current_frame(&self) -> u32 {
        self.current_frame
    }

    pub fn max_frames_in_flight(&self) -> u32 {
        self.max_frames_in_flight
    }

    pub fn render_sync(&self) -> &RenderSync {
        &self.sync
    }

    /// Resize the per-image semaphores after the swapchain was recreated
    ///
    /// Waits for the device to go idle first.
    pub fn handle_swapchain_recreated(&mut self, resources: &ResourceManager) -> Result<()> {
        let device = resources.get(self.device)?;
        let swapchain = resources.get(self.swapchain)?;

        device.wait_idle()?;
        self.sync.rebuild_image_sync(device, swapchain.image_count())?;

        crate::engine_info!(
            "cobalt::Renderer",
            "Swapchain recreated: {}x{}, {} images",
            swapchain.extent().width,
            swapchain.extent().height,
            swapchain.image_count()
        );
        Ok(())
    }

    /// Block until every submitted frame has finished
    pub fn wait_idle(&self, resources: &ResourceManager) -> Result<()> {
        resources.get(self.device)?.wait_idle()
    }

    /// Wait for the device, then give the command buffers back to their pool
    ///
    /// The command buffers are released even if the idle wait fails; the
    /// first error is returned. A renderer dropped without `destroy` falls
    /// back to waiting on its frame fences.
    pub fn destroy(self, resources: &ResourceManager) -> Result<()> {
        let idle = self.wait_idle(resources);
        if let Err(e) = &idle {
            crate::engine_error!("cobalt::Renderer", "Device wait failed during destroy: {}", e);
        }
        let released = resources
            .get(self.command_pool)
            .and_then(|pool| self.sync.release(pool));
        idle.and(released)?;
        crate::engine_debug!("cobalt::Renderer", "Renderer destroyed");
        Ok(())
    }
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
