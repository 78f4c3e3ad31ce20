/// VulkanImage - image plus its default view
///
/// Images created with `new` own their memory. Swapchain images only own the
/// view; the swapchain owns the image itself.

use ash::vk;
use gpu_allocator::vulkan::Allocation;
use gpu_allocator::MemoryLocation;
use std::sync::Arc;
use cobalt_gpu::cobalt::{AsAny, Resource, Result};
use cobalt_gpu::cobalt::device::{Extent2D, Extent3D, Image};

use crate::vulkan_context::VulkanContext;
use crate::vulkan_convert::{aspect_for_format, vk_error};
use crate::vulkan_device::VulkanDevice;

pub struct VulkanImage {
    ctx: Arc<VulkanContext>,
    pub(crate) image: vk::Image,
    pub(crate) view: vk::ImageView,
    pub(crate) format: vk::Format,
    pub(crate) aspect: vk::ImageAspectFlags,
    extent: Extent3D,
    /// None for swapchain images
    allocation: Option<Allocation>,
}

impl VulkanImage {
    /// Create a 2D image in device-local memory
    ///
    /// The aspect (color, depth, stencil) is derived from `format`.
    pub fn new(
        device: &VulkanDevice,
        extent: Extent2D,
        format: vk::Format,
        usage: vk::ImageUsageFlags,
    ) -> Result<Self> {
        let ctx = device.context();
        unsafe {
            let create_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(format)
                .extent(vk::Extent3D { width: extent.width, height: extent.height, depth: 1 })
                .mip_levels(1)
                .array_layers(1)
                .samples(vk::SampleCountFlags::TYPE_1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = ctx
                .device
                .create_image(&create_info, None)
                .map_err(|e| vk_error(e, "create image"))?;

            let requirements = ctx.device.get_image_memory_requirements(image);
            let allocation = match ctx.allocate("image", requirements, MemoryLocation::GpuOnly, false) {
                Ok(allocation) => allocation,
                Err(e) => {
                    ctx.device.destroy_image(image, None);
                    return Err(e);
                }
            };

            if let Err(e) = ctx
                .device
                .bind_image_memory(image, allocation.memory(), allocation.offset())
            {
                ctx.free(allocation);
                ctx.device.destroy_image(image, None);
                return Err(vk_error(e, "bind image memory"));
            }

            let view = match create_view(&ctx, image, format) {
                Ok(view) => view,
                Err(e) => {
                    ctx.free(allocation);
                    ctx.device.destroy_image(image, None);
                    return Err(e);
                }
            };

            cobalt_gpu::engine_trace!(
                "cobalt::vulkan",
                "Image created ({}x{}, {:?})",
                extent.width,
                extent.height,
                format
            );

            Ok(Self {
                ctx,
                image,
                view,
                format,
                aspect: aspect_for_format(format),
                extent: extent.into(),
                allocation: Some(allocation),
            })
        }
    }

    /// Wrap an image owned by a swapchain, creating its view
    pub(crate) fn from_swapchain(
        ctx: Arc<VulkanContext>,
        image: vk::Image,
        format: vk::Format,
        extent: Extent2D,
    ) -> Result<Self> {
        let view = create_view(&ctx, image, format)?;
        Ok(Self {
            ctx,
            image,
            view,
            format,
            aspect: vk::ImageAspectFlags::COLOR,
            extent: extent.into(),
            allocation: None,
        })
    }

    pub fn raw(&self) -> vk::Image {
        self.image
    }

    pub fn view(&self) -> vk::ImageView {
        self.view
    }

    pub fn format(&self) -> vk::Format {
        self.format
    }
}

fn create_view(ctx: &VulkanContext, image: vk::Image, format: vk::Format) -> Result<vk::ImageView> {
    let create_info = vk::ImageViewCreateInfo::default()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format)
        .components(vk::ComponentMapping {
            r: vk::ComponentSwizzle::IDENTITY,
            g: vk::ComponentSwizzle::IDENTITY,
            b: vk::ComponentSwizzle::IDENTITY,
            a: vk::ComponentSwizzle::IDENTITY,
        })
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: aspect_for_format(format),
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        });

    unsafe { ctx.device.create_image_view(&create_info, None) }
        .map_err(|e| vk_error(e, "create image view"))
}

impl Image for VulkanImage {
    fn extent(&self) -> Extent3D {
        self.extent
    }
}

impl Resource for VulkanImage {}

impl Drop for VulkanImage {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_image_view(self.view, None);

            // Swapchain images are destroyed with their swapchain
            if let Some(allocation) = self.allocation.take() {
                self.ctx.free(allocation);
                self.ctx.device.destroy_image(self.image, None);
            }
        }
    }
}

/// Concrete image behind a `dyn Image` created by this backend
pub(crate) fn vulkan_image(image: &dyn Image) -> Option<&VulkanImage> {
    image.as_any().downcast_ref::<VulkanImage>()
}
