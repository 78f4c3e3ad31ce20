/// Submission and presentation descriptions

use crate::command::CommandBuffer;
use crate::error::Result;
use super::{CommandRecorder, Fence, PipelineStages, Semaphore, Swapchain};

/// Queue accepting submissions and presentations
pub trait Queue: Send + Sync {
    /// Submit command buffers, signaling `fence` when they complete
    fn submit(&self, info: &SubmitInfo<'_>, fence: Option<&dyn Fence>) -> Result<()>;

    /// Queue images for presentation
    ///
    /// # Errors
    ///
    /// `Error::SwapchainOutOfDate` if the swapchain no longer matches the surface.
    fn present(&self, info: &PresentInfo<'_>) -> Result<PresentStatus>;
}

/// Result of a successful presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentStatus {
    Optimal,
    /// Presented, but the swapchain should be recreated soon
    Suboptimal,
}

/// Semaphore plus the stages it gates (wait) or follows (signal)
#[derive(Clone, Copy)]
pub struct SemaphoreSubmit<'a> {
    pub semaphore: &'a dyn Semaphore,
    pub stages: PipelineStages,
}

/// One queue submission
///
/// # Example
///
/// ```ignore
/// let info = SubmitInfo::new(device.device_index())
///     .wait(acquire, PipelineStages::COLOR_ATTACHMENT_OUTPUT)
///     .execute(&command_buffer)
///     .signal(render_done, PipelineStages::ALL_COMMANDS);
/// queue.submit(&info, Some(fence))?;
/// ```
pub struct SubmitInfo<'a> {
    device_index: u32,
    waits: Vec<SemaphoreSubmit<'a>>,
    command_buffers: Vec<&'a dyn CommandRecorder>,
    signals: Vec<SemaphoreSubmit<'a>>,
}

impl<'a> SubmitInfo<'a> {
    pub fn new(device_index: u32) -> Self {
        Self {
            device_index,
            waits: Vec::new(),
            command_buffers: Vec::new(),
            signals: Vec::new(),
        }
    }

    /// Wait on `semaphore` before `stages` run
    pub fn wait(mut self, semaphore: &'a dyn Semaphore, stages: PipelineStages) -> Self {
        self.waits.push(SemaphoreSubmit { semaphore, stages });
        self
    }

    /// Execute a recorded command buffer
    pub fn execute(mut self, command_buffer: &'a CommandBuffer) -> Self {
        self.command_buffers.push(command_buffer.recorder());
        self
    }

    /// Signal `semaphore` once `stages` complete
    pub fn signal(mut self, semaphore: &'a dyn Semaphore, stages: PipelineStages) -> Self {
        self.signals.push(SemaphoreSubmit { semaphore, stages });
        self
    }

    pub fn device_index(&self) -> u32 {
        self.device_index
    }

    pub fn waits(&self) -> &[SemaphoreSubmit<'a>] {
        &self.waits
    }

    pub fn command_buffers(&self) -> &[&'a dyn CommandRecorder] {
        &self.command_buffers
    }

    pub fn signals(&self) -> &[SemaphoreSubmit<'a>] {
        &self.signals
    }
}

/// One presentation request
#[derive(Default)]
pub struct PresentInfo<'a> {
    waits: Vec<&'a dyn Semaphore>,
    images: Vec<(&'a dyn Swapchain, u32)>,
}

impl<'a> PresentInfo<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait on `semaphore` before presenting
    pub fn wait(mut self, semaphore: &'a dyn Semaphore) -> Self {
        self.waits.push(semaphore);
        self
    }

    /// Present `image_index` of `swapchain`
    pub fn present(mut self, swapchain: &'a dyn Swapchain, image_index: u32) -> Self {
        self.images.push((swapchain, image_index));
        self
    }

    pub fn waits(&self) -> &[&'a dyn Semaphore] {
        &self.waits
    }

    pub fn images(&self) -> &[(&'a dyn Swapchain, u32)] {
        &self.images
    }
}
