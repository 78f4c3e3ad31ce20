/// VulkanBuffer - GPU buffer backed by gpu-allocator memory

use ash::vk;
use gpu_allocator::vulkan::Allocation;
use gpu_allocator::MemoryLocation;
use std::sync::Arc;
use cobalt_gpu::cobalt::{AsAny, Error, Resource, Result};
use cobalt_gpu::cobalt::device::Buffer;

use crate::vulkan_context::VulkanContext;
use crate::vulkan_convert::vk_error;
use crate::vulkan_device::VulkanDevice;

pub struct VulkanBuffer {
    ctx: Arc<VulkanContext>,
    pub(crate) buffer: vk::Buffer,
    allocation: Option<Allocation>,
    size: u64,
}

impl VulkanBuffer {
    /// Create a buffer and bind fresh memory to it
    ///
    /// # Arguments
    ///
    /// * `device` - Device to allocate on
    /// * `size` - Size in bytes
    /// * `usage` - Native usage flags
    /// * `location` - `CpuToGpu` for buffers written with `write`, `GpuOnly` otherwise
    ///
    /// # Errors
    ///
    /// `Error::OutOfMemory` when no memory is left for the buffer.
    pub fn new(
        device: &VulkanDevice,
        size: u64,
        usage: vk::BufferUsageFlags,
        location: MemoryLocation,
    ) -> Result<Self> {
        let ctx = device.context();
        unsafe {
            let create_info = vk::BufferCreateInfo::default()
                .size(size)
                .usage(usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = ctx
                .device
                .create_buffer(&create_info, None)
                .map_err(|e| vk_error(e, "create buffer"))?;

            let requirements = ctx.device.get_buffer_memory_requirements(buffer);
            let allocation = match ctx.allocate("buffer", requirements, location, true) {
                Ok(allocation) => allocation,
                Err(e) => {
                    ctx.device.destroy_buffer(buffer, None);
                    return Err(e);
                }
            };

            if let Err(e) = ctx
                .device
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
            {
                ctx.free(allocation);
                ctx.device.destroy_buffer(buffer, None);
                return Err(vk_error(e, "bind buffer memory"));
            }

            cobalt_gpu::engine_trace!("cobalt::vulkan", "Buffer created ({} bytes, {:?})", size, location);

            Ok(Self {
                ctx,
                buffer,
                allocation: Some(allocation),
                size,
            })
        }
    }

    /// Copy `data` into host-visible memory at `offset`
    ///
    /// # Errors
    ///
    /// - `Error::BackendError` if the buffer is not CPU-accessible
    /// - `Error::InvalidResource` if the write overflows the buffer
    pub fn write(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        let end = offset.checked_add(data.len() as u64).filter(|&end| end <= self.size);
        if end.is_none() {
            return Err(Error::InvalidResource(format!(
                "write of {} bytes at offset {} overflows buffer of {} bytes",
                data.len(),
                offset,
                self.size
            )));
        }

        let allocation = match self.allocation.as_mut() {
            Some(allocation) => allocation,
            None => cobalt_gpu::engine_bail!("cobalt::vulkan", "Buffer has no allocation"),
        };
        let mapped = match allocation.mapped_slice_mut() {
            Some(mapped) => mapped,
            None => cobalt_gpu::engine_bail!("cobalt::vulkan", "Buffer is not CPU-accessible"),
        };

        let start = offset as usize;
        mapped[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    pub fn raw(&self) -> vk::Buffer {
        self.buffer
    }
}

impl Buffer for VulkanBuffer {
    fn size(&self) -> u64 {
        self.size
    }
}

impl Resource for VulkanBuffer {}

impl Drop for VulkanBuffer {
    fn drop(&mut self) {
        if let Some(allocation) = self.allocation.take() {
            self.ctx.free(allocation);
        }
        unsafe {
            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}

/// Native buffer behind a `dyn Buffer` created by this backend
pub(crate) fn raw_buffer(buffer: &dyn Buffer) -> Option<vk::Buffer> {
    buffer.as_any().downcast_ref::<VulkanBuffer>().map(|b| b.buffer)
}
