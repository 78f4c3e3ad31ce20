/*!
# Cobalt GPU - Vulkan Backend

Vulkan 1.3 implementation of the `cobalt_gpu` device traits.

Uses Ash for the Vulkan bindings, gpu-allocator for memory and ash-window
for surface creation. Rendering relies on dynamic rendering and
synchronization2, so no render pass or framebuffer objects exist.

Every native object holds a shared `VulkanContext`, so the instance and
device are destroyed only after the last buffer, image, fence or swapchain
created from them.

```no_run
use cobalt_gpu::cobalt::{Engine, Renderer, RendererConfig, RendererCreateInfo};
use cobalt_gpu_vulkan::{Config, VulkanDevice, VulkanSwapchain};
# fn run(window: &winit::window::Window) -> cobalt_gpu::cobalt::Result<()> {
Engine::initialize()?;
Engine::create_resource_manager()?;
let rm = Engine::resource_manager()?;
let mut rm = rm.lock().unwrap();

let device = rm.insert_resource(VulkanDevice::new(window, Config::default())?);
let swapchain = VulkanSwapchain::new(rm.get(device)?, 1280, 720)?;
let swapchain = rm.insert_resource(swapchain);
# Ok(())
# }
```
*/

mod vulkan_config;
mod vulkan_context;
mod vulkan_convert;
mod vulkan_device;
mod vulkan_queue;
mod vulkan_sync;
mod vulkan_command;
mod vulkan_swapchain;
mod vulkan_buffer;
mod vulkan_image;
mod vulkan_pipeline;

#[cfg(feature = "vulkan-validation")]
mod debug;

pub use vulkan_config::{Config, DebugSeverity};
pub use vulkan_device::VulkanDevice;
pub use vulkan_queue::VulkanQueue;
pub use vulkan_sync::{VulkanFence, VulkanSemaphore};
pub use vulkan_command::{VulkanCommandAllocator, VulkanCommandRecorder};
pub use vulkan_swapchain::VulkanSwapchain;
pub use vulkan_buffer::VulkanBuffer;
pub use vulkan_image::VulkanImage;
pub use vulkan_pipeline::VulkanPipeline;

// Re-export debug utilities
#[cfg(feature = "vulkan-validation")]
pub use debug::{get_validation_stats, print_validation_stats_report, ValidationStats};
