/// Fences and semaphores

use ash::vk;
use std::sync::Arc;
use std::time::Duration;
use cobalt_gpu::cobalt::{AsAny, Result};
use cobalt_gpu::cobalt::device::{Fence, Semaphore};

use crate::vulkan_context::VulkanContext;
use crate::vulkan_convert::{timeout_nanos, vk_error, vk_wait_error};

/// Vulkan fence
pub struct VulkanFence {
    ctx: Arc<VulkanContext>,
    pub(crate) fence: vk::Fence,
}

impl VulkanFence {
    pub(crate) fn new(ctx: Arc<VulkanContext>, signaled: bool) -> Result<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let info = vk::FenceCreateInfo::default().flags(flags);
        let fence = unsafe { ctx.device.create_fence(&info, None) }
            .map_err(|e| vk_error(e, "create fence"))?;
        Ok(Self { ctx, fence })
    }

    pub fn raw(&self) -> vk::Fence {
        self.fence
    }
}

impl Fence for VulkanFence {
    fn wait(&self, timeout: Duration) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .wait_for_fences(&[self.fence], true, timeout_nanos(timeout))
                .map_err(|e| vk_wait_error(e, timeout, "wait for fence"))
        }
    }

    fn reset(&self) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .reset_fences(&[self.fence])
                .map_err(|e| vk_error(e, "reset fence"))
        }
    }

    fn is_signaled(&self) -> Result<bool> {
        unsafe {
            self.ctx
                .device
                .get_fence_status(self.fence)
                .map_err(|e| vk_error(e, "get fence status"))
        }
    }
}

impl Drop for VulkanFence {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_fence(self.fence, None);
        }
    }
}

/// Vulkan binary semaphore
pub struct VulkanSemaphore {
    ctx: Arc<VulkanContext>,
    pub(crate) semaphore: vk::Semaphore,
}

impl VulkanSemaphore {
    pub(crate) fn new(ctx: Arc<VulkanContext>) -> Result<Self> {
        let info = vk::SemaphoreCreateInfo::default();
        let semaphore = unsafe { ctx.device.create_semaphore(&info, None) }
            .map_err(|e| vk_error(e, "create semaphore"))?;
        Ok(Self { ctx, semaphore })
    }

    pub fn raw(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Semaphore for VulkanSemaphore {}

impl Drop for VulkanSemaphore {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_semaphore(self.semaphore, None);
        }
    }
}

/// Native semaphore behind a `dyn Semaphore` created by this backend
pub(crate) fn raw_semaphore(semaphore: &dyn Semaphore) -> Result<vk::Semaphore> {
    semaphore
        .as_any()
        .downcast_ref::<VulkanSemaphore>()
        .map(|s| s.semaphore)
        .ok_or_else(|| {
            cobalt_gpu::engine_err!("cobalt::vulkan", "Semaphore was not created by the Vulkan backend")
        })
}

/// Native fence behind a `dyn Fence` created by this backend
pub(crate) fn raw_fence(fence: &dyn Fence) -> Result<vk::Fence> {
    fence
        .as_any()
        .downcast_ref::<VulkanFence>()
        .map(|f| f.fence)
        .ok_or_else(|| {
            cobalt_gpu::engine_err!("cobalt::vulkan", "Fence was not created by the Vulkan backend")
        })
}
