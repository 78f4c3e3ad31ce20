//! Integration tests for the Vulkan backend
//!
//! These tests verify that VulkanDevice and the objects created from it
//! implement the cobalt_gpu device traits on real hardware.
//! All tests require a GPU and are marked with #[ignore].
//!
//! Run with: cargo test --test vulkan_device_tests -- --ignored

use cobalt_gpu::cobalt::{
    CommandPool, CommandBuffer, Error, Renderer, RendererConfig, RendererCreateInfo,
    ResourceManager,
};
use cobalt_gpu::cobalt::device::{
    CommandBufferLevel, CommandBufferUsage, DependencyInfo, Extent2D, GraphicsDevice,
    ImageBarrier, PresentStatus, Rect2D, RenderingAttachment, SubmitInfo, Swapchain, Viewport,
    Buffer, Image,
};
use cobalt_gpu_vulkan::{Config, VulkanBuffer, VulkanDevice, VulkanImage, VulkanSwapchain};
use ash::vk;
use gpu_allocator::MemoryLocation;
use serial_test::serial;
use std::sync::OnceLock;
use std::time::Duration;
use winit::event_loop::EventLoop;
use winit::window::Window;

/// Window shared by every test (winit allows one event loop per process)
static TEST_WINDOW: OnceLock<Window> = OnceLock::new();

/// Hidden window; the event loop is leaked to keep it valid
#[allow(deprecated)]
fn test_window() -> &'static Window {
    TEST_WINDOW.get_or_init(|| {
        let event_loop = EventLoop::new().unwrap();
        let window_attrs = Window::default_attributes()
            .with_title("Cobalt Vulkan Test")
            .with_inner_size(winit::dpi::LogicalSize::new(800, 600))
            .with_visible(false); // Hidden window for tests
        let window = event_loop.create_window(window_attrs).unwrap();
        std::mem::forget(event_loop);
        window
    })
}

fn create_device() -> VulkanDevice {
    let config = Config {
        app_name: "Cobalt Vulkan Test".to_string(),
        ..Config::default()
    };
    VulkanDevice::new(test_window(), config).unwrap()
}

fn record_clear(cmd: &mut CommandBuffer, swapchain: &VulkanSwapchain, image: u32, _frame: u32) {
    let target = swapchain.image(image).unwrap();
    let extent = swapchain.extent();

    let mut op = cmd.command_operator(CommandBufferUsage::ONE_TIME_SUBMIT).unwrap();
    op.store_render_area(Rect2D::from_extent(extent));
    op.store_viewport(Viewport::from_extent(extent));
    op.insert_barrier(&DependencyInfo::new().image(ImageBarrier::to_color_attachment(target)));
    op.begin_rendering(&[RenderingAttachment::color(target, [0.1, 0.2, 0.3, 1.0])], None, None)
        .unwrap();
    op.set_viewport(None).unwrap();
    op.set_scissor(None).unwrap();
    op.end_rendering();
    op.insert_barrier(&DependencyInfo::new().image(ImageBarrier::to_present(target)));
    op.end_recording().unwrap();
}

// ============================================================================
// DEVICE TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_device_creation() {
    let device = create_device();

    assert_eq!(device.device_index(), 0);
    assert!(device.wait_idle().is_ok());
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_objects_outlive_device() {
    let device = create_device();
    let fence = device.create_fence(true).unwrap();
    let buffer = VulkanBuffer::new(&device, 64, vk::BufferUsageFlags::TRANSFER_SRC, MemoryLocation::CpuToGpu)
        .unwrap();

    // The shared context keeps the native device alive
    drop(device);

    assert!(fence.is_signaled().unwrap());
    assert_eq!(buffer.size(), 64);
}

// ============================================================================
// SYNCHRONIZATION TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_fence_signaled_wait_and_reset() {
    let device = create_device();
    let fence = device.create_fence(true).unwrap();

    assert!(fence.is_signaled().unwrap());
    assert!(fence.wait(Duration::ZERO).is_ok());

    fence.reset().unwrap();
    assert!(!fence.is_signaled().unwrap());
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_fence_wait_times_out() {
    let device = create_device();
    let fence = device.create_fence(false).unwrap();

    let timeout = Duration::from_millis(10);
    assert_eq!(fence.wait(timeout), Err(Error::Timeout(timeout)));
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_semaphore_creation() {
    let device = create_device();
    assert!(device.create_semaphore().is_ok());
    assert!(device.create_semaphore().is_ok());
}

// ============================================================================
// BUFFER / IMAGE TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_buffer_write() {
    let device = create_device();
    let mut buffer = VulkanBuffer::new(
        &device,
        256,
        vk::BufferUsageFlags::VERTEX_BUFFER,
        MemoryLocation::CpuToGpu,
    )
    .unwrap();

    assert_eq!(buffer.size(), 256);
    assert!(buffer.write(0, &[1u8; 128]).is_ok());
    assert!(buffer.write(128, &[2u8; 128]).is_ok());
    assert!(matches!(buffer.write(200, &[0u8; 100]), Err(Error::InvalidResource(_))));
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_gpu_only_buffer_rejects_write() {
    let device = create_device();
    let mut buffer = VulkanBuffer::new(
        &device,
        64,
        vk::BufferUsageFlags::TRANSFER_DST,
        MemoryLocation::GpuOnly,
    )
    .unwrap();

    assert!(matches!(buffer.write(0, &[0u8; 4]), Err(Error::BackendError(_))));
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_image_creation() {
    let device = create_device();
    let image = VulkanImage::new(
        &device,
        Extent2D::new(64, 32),
        vk::Format::R8G8B8A8_UNORM,
        vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST,
    )
    .unwrap();

    let extent = image.extent();
    assert_eq!((extent.width, extent.height, extent.depth), (64, 32, 1));
    assert_eq!(image.format(), vk::Format::R8G8B8A8_UNORM);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_one_shot_copy() {
    let device = create_device();
    let mut staging = VulkanBuffer::new(
        &device,
        1024,
        vk::BufferUsageFlags::TRANSFER_SRC,
        MemoryLocation::CpuToGpu,
    )
    .unwrap();
    staging.write(0, &[7u8; 1024]).unwrap();
    let target = VulkanBuffer::new(
        &device,
        1024,
        vk::BufferUsageFlags::TRANSFER_DST,
        MemoryLocation::GpuOnly,
    )
    .unwrap();

    let pool = CommandPool::new(&device).unwrap();
    let mut cmd = pool.allocate(CommandBufferLevel::Primary).unwrap();
    {
        let mut op = cmd.command_operator(CommandBufferUsage::ONE_TIME_SUBMIT).unwrap();
        op.copy_buffer(&staging, &target);
        op.end_recording().unwrap();
    }

    let fence = device.create_fence(false).unwrap();
    let info = SubmitInfo::new(device.device_index()).execute(&cmd);
    device.graphics_queue().submit(&info, Some(fence.as_ref())).unwrap();
    fence.wait(Duration::from_secs(5)).unwrap();

    pool.release(cmd).unwrap();
    assert_eq!(pool.allocated_count(), 0);
}

// ============================================================================
// SWAPCHAIN / FRAME LOOP TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_swapchain_creation_and_recreate() {
    let device = create_device();
    let mut swapchain = VulkanSwapchain::new(&device, 800, 600).unwrap();

    assert!(swapchain.image_count() >= 2);
    let extent = swapchain.extent();
    assert!(extent.width > 0 && extent.height > 0);
    assert!(swapchain.image(swapchain.image_count()).is_none());

    swapchain.recreate(800, 600).unwrap();
    assert!(swapchain.image_count() >= 2);
    assert!(swapchain.image(0).is_some());
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_frame_loop_through_resource_manager() {
    let mut rm = ResourceManager::new();
    let device = rm.insert_resource(create_device());
    let swapchain = VulkanSwapchain::new(rm.get(device).unwrap(), 800, 600).unwrap();
    let swapchain = rm.insert_resource(swapchain);
    let pool = CommandPool::new(rm.get(device).unwrap()).unwrap();
    let pool = rm.insert_resource(pool);

    let mut renderer = Renderer::new(
        &rm,
        RendererCreateInfo {
            device,
            swapchain,
            command_pool: pool,
            config: RendererConfig::default(),
        },
    )
    .unwrap();
    renderer.set_record_command_buffer_fn(record_clear);

    for _ in 0..4 {
        match renderer.render(&rm) {
            Ok(PresentStatus::Optimal) | Ok(PresentStatus::Suboptimal) => {}
            // Hidden windows may report a stale surface on some platforms
            Err(Error::SwapchainOutOfDate) => break,
            Err(e) => panic!("render failed: {}", e),
        }
    }

    renderer.destroy(&rm).unwrap();

    // Pool, swapchain and device go in reverse creation order
    assert_eq!(rm.reset(), 3);
    assert!(rm.get(device).is_err());
}
