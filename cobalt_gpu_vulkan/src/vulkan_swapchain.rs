/// VulkanSwapchain - presentable images for the device's window surface
///
/// Acquisition and recreation live here; presentation goes through the
/// device's queue so it can be batched with other swapchains.

use ash::vk;
use std::sync::Arc;
use cobalt_gpu::cobalt::{AsAny, Error, Resource, Result};
use cobalt_gpu::cobalt::device::{Extent2D, Semaphore, Swapchain};
use cobalt_gpu::{engine_debug, engine_info};

use crate::vulkan_context::VulkanContext;
use crate::vulkan_convert::{extent_from_vk, vk_error, vk_init_error};
use crate::vulkan_device::VulkanDevice;
use crate::vulkan_image::VulkanImage;
use crate::vulkan_sync::raw_semaphore;

pub struct VulkanSwapchain {
    ctx: Arc<VulkanContext>,
    pub(crate) swapchain: vk::SwapchainKHR,
    /// Views over the swapchain-owned images
    images: Vec<VulkanImage>,
    format: vk::Format,
    extent: vk::Extent2D,
}

impl VulkanSwapchain {
    /// Create a swapchain for the device's surface
    ///
    /// # Arguments
    ///
    /// * `device` - Device whose surface is presented to
    /// * `width` - Requested width, used when the surface leaves the size to us
    /// * `height` - Requested height
    pub fn new(device: &VulkanDevice, width: u32, height: u32) -> Result<Self> {
        let ctx = device.context();
        let (swapchain, images, format, extent) =
            create_swapchain(&ctx, width, height, vk::SwapchainKHR::null())?;

        engine_info!(
            "cobalt::vulkan",
            "Swapchain created ({}x{}, {} images, {:?})",
            extent.width,
            extent.height,
            images.len(),
            format
        );

        Ok(Self { ctx, swapchain, images, format, extent })
    }

    pub fn raw(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// Image at `index`, for use as a rendering attachment
    pub fn image(&self, index: u32) -> Option<&VulkanImage> {
        self.images.get(index as usize)
    }
}

impl Swapchain for VulkanSwapchain {
    fn acquire_next_image(&self, signal: &dyn Semaphore) -> Result<Option<u32>> {
        let semaphore = raw_semaphore(signal)?;
        let result = unsafe {
            self.ctx.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                semaphore,
                vk::Fence::null(),
            )
        };

        match result {
            Ok((index, suboptimal)) => {
                if suboptimal {
                    engine_debug!("cobalt::vulkan", "Swapchain suboptimal on acquire");
                }
                Ok(Some(index))
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(None),
            Err(e) => Err(vk_error(e, "acquire next image")),
        }
    }

    fn image_count(&self) -> u32 {
        self.images.len() as u32
    }

    fn extent(&self) -> Extent2D {
        extent_from_vk(self.extent)
    }

    fn recreate(&mut self, width: u32, height: u32) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .device_wait_idle()
                .map_err(|e| vk_error(e, "wait idle before swapchain recreation"))?;
        }

        let old = self.swapchain;
        let (swapchain, images, format, extent) = create_swapchain(&self.ctx, width, height, old)?;

        // Old views go before the old swapchain that owns their images
        self.images = images;
        unsafe {
            self.ctx.swapchain_loader.destroy_swapchain(old, None);
        }
        self.swapchain = swapchain;
        self.format = format;
        self.extent = extent;

        engine_info!(
            "cobalt::vulkan",
            "Swapchain recreated ({}x{}, {} images)",
            extent.width,
            extent.height,
            self.images.len()
        );
        Ok(())
    }
}

impl Resource for VulkanSwapchain {}

impl Drop for VulkanSwapchain {
    fn drop(&mut self) {
        self.images.clear();
        unsafe {
            self.ctx.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

/// Native swapchain behind a `dyn Swapchain` created by this backend
pub(crate) fn raw_swapchain(swapchain: &dyn Swapchain) -> Option<vk::SwapchainKHR> {
    swapchain
        .as_any()
        .downcast_ref::<VulkanSwapchain>()
        .map(|s| s.swapchain)
}

// ===== CREATION =====

/// Pick the surface extent: the surface's own size when it has one,
/// otherwise the requested size clamped to what the surface allows
pub(crate) fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    width: u32,
    height: u32,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }
    vk::Extent2D {
        width: width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

/// One image more than the minimum, capped by the maximum (0 means no cap)
pub(crate) fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        count.min(capabilities.max_image_count)
    } else {
        count
    }
}

/// Prefer an sRGB 8-bit format, else whatever the surface lists first
pub(crate) fn choose_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .find(|f| {
            (f.format == vk::Format::B8G8R8A8_SRGB || f.format == vk::Format::R8G8B8A8_SRGB)
                && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| formats.first())
        .copied()
}

fn create_swapchain(
    ctx: &Arc<VulkanContext>,
    width: u32,
    height: u32,
    old_swapchain: vk::SwapchainKHR,
) -> Result<(vk::SwapchainKHR, Vec<VulkanImage>, vk::Format, vk::Extent2D)> {
    unsafe {
        let capabilities = ctx
            .surface_loader
            .get_physical_device_surface_capabilities(ctx.physical_device, ctx.surface)
            .map_err(|e| vk_init_error(e, "get surface capabilities"))?;

        let formats = ctx
            .surface_loader
            .get_physical_device_surface_formats(ctx.physical_device, ctx.surface)
            .map_err(|e| vk_init_error(e, "get surface formats"))?;

        let surface_format = match choose_format(&formats) {
            Some(format) => format,
            None => {
                return Err(Error::InitializationFailed(
                    "Surface reports no formats".to_string(),
                ))
            }
        };

        let extent = choose_extent(&capabilities, width, height);

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(ctx.surface)
            .min_image_count(choose_image_count(&capabilities))
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(vk::PresentModeKHR::FIFO)
            .clipped(true)
            .old_swapchain(old_swapchain);

        let swapchain = ctx
            .swapchain_loader
            .create_swapchain(&create_info, None)
            .map_err(|e| vk_init_error(e, "create swapchain"))?;

        let raw_images = match ctx.swapchain_loader.get_swapchain_images(swapchain) {
            Ok(images) => images,
            Err(e) => {
                ctx.swapchain_loader.destroy_swapchain(swapchain, None);
                return Err(vk_init_error(e, "get swapchain images"));
            }
        };

        let mut images = Vec::with_capacity(raw_images.len());
        for image in raw_images {
            match VulkanImage::from_swapchain(
                Arc::clone(ctx),
                image,
                surface_format.format,
                extent_from_vk(extent),
            ) {
                Ok(image) => images.push(image),
                Err(e) => {
                    images.clear();
                    ctx.swapchain_loader.destroy_swapchain(swapchain, None);
                    return Err(e);
                }
            }
        }

        Ok((swapchain, images, surface_format.format, extent))
    }
}

#[cfg(test)]
#[path = "vulkan_swapchain_tests.rs"]
mod tests;
