/// VulkanContext - native objects shared by every Vulkan resource
///
/// Each buffer, image, fence, semaphore, swapchain and command pool holds an
/// `Arc<VulkanContext>`, so the device and instance outlive every object
/// created from them regardless of the order the resource manager drops
/// things in.

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use std::mem::ManuallyDrop;
use std::sync::Mutex;

pub struct VulkanContext {
    /// Vulkan loader (kept alive for the function pointers)
    pub(crate) _entry: ash::Entry,
    pub(crate) instance: ash::Instance,
    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) device: ash::Device,

    /// GPU memory allocator
    /// Wrapped in ManuallyDrop so it is released BEFORE the device is destroyed
    pub(crate) allocator: ManuallyDrop<Mutex<Allocator>>,

    /// Queue family used for graphics and presentation
    pub(crate) graphics_queue_family: u32,

    /// Window surface
    pub(crate) surface: vk::SurfaceKHR,
    pub(crate) surface_loader: ash::khr::surface::Instance,
    pub(crate) swapchain_loader: ash::khr::swapchain::Device,

    /// Validation layer messenger
    #[cfg(feature = "vulkan-validation")]
    pub(crate) debug_messenger: Option<crate::debug::DebugMessenger>,
}

impl VulkanContext {
    /// Allocate GPU memory for `requirements`
    ///
    /// # Errors
    ///
    /// `Error::OutOfMemory` when the allocator cannot satisfy the request.
    pub(crate) fn allocate(
        &self,
        name: &str,
        requirements: vk::MemoryRequirements,
        location: gpu_allocator::MemoryLocation,
        linear: bool,
    ) -> cobalt_gpu::cobalt::Result<gpu_allocator::vulkan::Allocation> {
        let mut allocator = self.allocator.lock().map_err(|_| {
            cobalt_gpu::engine_err!("cobalt::vulkan", "GPU allocator mutex poisoned")
        })?;

        allocator
            .allocate(&gpu_allocator::vulkan::AllocationCreateDesc {
                name,
                requirements,
                location,
                linear,
                allocation_scheme: gpu_allocator::vulkan::AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|e| {
                let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                cobalt_gpu::engine_error!(
                    "cobalt::vulkan",
                    "Out of GPU memory for {} (required: {:.2} MB): {}",
                    name,
                    size_mb,
                    e
                );
                cobalt_gpu::cobalt::Error::OutOfMemory
            })
    }

    /// Return an allocation to the allocator
    pub(crate) fn free(&self, allocation: gpu_allocator::vulkan::Allocation) {
        // Don't panic if the lock fails, the native object still has to go
        if let Ok(mut allocator) = self.allocator.lock() {
            allocator.free(allocation).ok();
        }
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            // 1. Allocator pages go before the device
            ManuallyDrop::drop(&mut self.allocator);

            // 2. Device-level objects
            self.device.destroy_device(None);

            // 3. Instance-level objects
            self.surface_loader.destroy_surface(self.surface, None);

            #[cfg(feature = "vulkan-validation")]
            if let Some(messenger) = self.debug_messenger.take() {
                messenger.destroy();
            }

            self.instance.destroy_instance(None);
        }
    }
}
