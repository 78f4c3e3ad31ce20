/// VulkanQueue - graphics queue used for submission and presentation

use ash::vk;
use std::sync::{Arc, Mutex};
use cobalt_gpu::cobalt::Result;
use cobalt_gpu::cobalt::device::{Fence, PresentInfo, PresentStatus, Queue, SubmitInfo};

use crate::vulkan_command::raw_command_buffer;
use crate::vulkan_context::VulkanContext;
use crate::vulkan_convert::{pipeline_stages_to_vk, vk_error};
use crate::vulkan_swapchain::raw_swapchain;
use crate::vulkan_sync::{raw_fence, raw_semaphore};

pub struct VulkanQueue {
    ctx: Arc<VulkanContext>,
    /// Submission and presentation need external synchronization
    queue: Mutex<vk::Queue>,
}

impl VulkanQueue {
    pub(crate) fn new(ctx: Arc<VulkanContext>, queue: vk::Queue) -> Self {
        Self { ctx, queue: Mutex::new(queue) }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, vk::Queue>> {
        self.queue
            .lock()
            .map_err(|_| cobalt_gpu::engine_err!("cobalt::vulkan", "Queue mutex poisoned"))
    }
}

impl Queue for VulkanQueue {
    fn submit(&self, info: &SubmitInfo<'_>, fence: Option<&dyn Fence>) -> Result<()> {
        let mut waits = Vec::with_capacity(info.waits().len());
        for wait in info.waits() {
            waits.push(
                vk::SemaphoreSubmitInfo::default()
                    .semaphore(raw_semaphore(wait.semaphore)?)
                    .stage_mask(pipeline_stages_to_vk(wait.stages))
                    .device_index(info.device_index()),
            );
        }

        let mut signals = Vec::with_capacity(info.signals().len());
        for signal in info.signals() {
            signals.push(
                vk::SemaphoreSubmitInfo::default()
                    .semaphore(raw_semaphore(signal.semaphore)?)
                    .stage_mask(pipeline_stages_to_vk(signal.stages))
                    .device_index(info.device_index()),
            );
        }

        let mut command_buffers = Vec::with_capacity(info.command_buffers().len());
        for &recorder in info.command_buffers() {
            let buffer = match raw_command_buffer(recorder) {
                Some(buffer) => buffer,
                None => cobalt_gpu::engine_bail!(
                    "cobalt::vulkan",
                    "Command buffer was not created by the Vulkan backend"
                ),
            };
            command_buffers.push(
                vk::CommandBufferSubmitInfo::default()
                    .command_buffer(buffer)
                    .device_mask(1 << info.device_index()),
            );
        }

        let fence = match fence {
            Some(fence) => raw_fence(fence)?,
            None => vk::Fence::null(),
        };

        let submit = vk::SubmitInfo2::default()
            .wait_semaphore_infos(&waits)
            .command_buffer_infos(&command_buffers)
            .signal_semaphore_infos(&signals);

        let queue = self.lock()?;
        unsafe {
            self.ctx
                .device
                .queue_submit2(*queue, &[submit], fence)
                .map_err(|e| vk_error(e, "submit"))
        }
    }

    fn present(&self, info: &PresentInfo<'_>) -> Result<PresentStatus> {
        let mut waits = Vec::with_capacity(info.waits().len());
        for &semaphore in info.waits() {
            waits.push(raw_semaphore(semaphore)?);
        }

        let mut swapchains = Vec::with_capacity(info.images().len());
        let mut image_indices = Vec::with_capacity(info.images().len());
        for &(swapchain, index) in info.images() {
            let swapchain = match raw_swapchain(swapchain) {
                Some(swapchain) => swapchain,
                None => cobalt_gpu::engine_bail!(
                    "cobalt::vulkan",
                    "Swapchain was not created by the Vulkan backend"
                ),
            };
            swapchains.push(swapchain);
            image_indices.push(index);
        }

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&waits)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let queue = self.lock()?;
        let result = unsafe { self.ctx.swapchain_loader.queue_present(*queue, &present_info) };
        match result {
            Ok(false) => Ok(PresentStatus::Optimal),
            Ok(true) => Ok(PresentStatus::Suboptimal),
            Err(e) => Err(vk_error(e, "present")),
        }
    }
}
