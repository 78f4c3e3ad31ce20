/// Conversions between the backend-agnostic types and their Vulkan counterparts
///
/// Pure functions, testable without a GPU.

use ash::vk;
use std::time::Duration;
use cobalt_gpu::cobalt::Error;
use cobalt_gpu::cobalt::device::{
    AccessFlags, BufferImageCopy, ClearValue, CommandBufferLevel, CommandBufferUsage,
    Extent2D, ImageLayout, IndexType, LoadOp, PipelineStages, Rect2D, ShaderStages, StoreOp,
    Viewport,
};

// ===== ERRORS =====

/// Map a failed Vulkan call to an engine error and log it
///
/// `ERROR_OUT_OF_DATE_KHR` becomes `SwapchainOutOfDate`, the out of memory
/// results become `OutOfMemory`, everything else a `BackendError` naming
/// `what`.
pub(crate) fn vk_error(result: vk::Result, what: &str) -> Error {
    let error = match result {
        vk::Result::ERROR_OUT_OF_DATE_KHR => Error::SwapchainOutOfDate,
        vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => {
            Error::OutOfMemory
        }
        _ => Error::BackendError(format!("{}: {:?}", what, result)),
    };
    cobalt_gpu::engine_error!("cobalt::vulkan", "{} failed: {:?}", what, result);
    error
}

/// Map the result of a bounded wait
pub(crate) fn vk_wait_error(result: vk::Result, timeout: Duration, what: &str) -> Error {
    if result == vk::Result::TIMEOUT {
        Error::Timeout(timeout)
    } else {
        vk_error(result, what)
    }
}

/// Map a failed Vulkan call made while bootstrapping the device or swapchain
pub(crate) fn vk_init_error(result: vk::Result, what: &str) -> Error {
    cobalt_gpu::engine_error!("cobalt::vulkan", "Failed to {}: {:?}", what, result);
    Error::InitializationFailed(format!("Failed to {}: {:?}", what, result))
}

/// Wait timeout in nanoseconds, saturating at `u64::MAX`
pub(crate) fn timeout_nanos(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_nanos()).unwrap_or(u64::MAX)
}

// ===== FLAGS =====

pub(crate) fn shader_stages_to_vk(stages: ShaderStages) -> vk::ShaderStageFlags {
    vk::ShaderStageFlags::from_raw(stages.bits())
}

pub(crate) fn pipeline_stages_to_vk(stages: PipelineStages) -> vk::PipelineStageFlags2 {
    vk::PipelineStageFlags2::from_raw(stages.bits())
}

pub(crate) fn access_to_vk(access: AccessFlags) -> vk::AccessFlags2 {
    vk::AccessFlags2::from_raw(access.bits())
}

pub(crate) fn usage_to_vk(usage: CommandBufferUsage) -> vk::CommandBufferUsageFlags {
    vk::CommandBufferUsageFlags::from_raw(usage.bits())
}

pub(crate) fn level_to_vk(level: CommandBufferLevel) -> vk::CommandBufferLevel {
    match level {
        CommandBufferLevel::Primary => vk::CommandBufferLevel::PRIMARY,
        CommandBufferLevel::Secondary => vk::CommandBufferLevel::SECONDARY,
    }
}

// ===== ENUMS =====

pub(crate) fn image_layout_to_vk(layout: ImageLayout) -> vk::ImageLayout {
    match layout {
        ImageLayout::Undefined => vk::ImageLayout::UNDEFINED,
        ImageLayout::General => vk::ImageLayout::GENERAL,
        ImageLayout::ColorAttachment => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        ImageLayout::DepthStencilAttachment => vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        ImageLayout::ShaderReadOnly => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        ImageLayout::TransferSrc => vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        ImageLayout::TransferDst => vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        ImageLayout::PresentSrc => vk::ImageLayout::PRESENT_SRC_KHR,
    }
}

pub(crate) fn load_op_to_vk(load_op: LoadOp) -> vk::AttachmentLoadOp {
    match load_op {
        LoadOp::Load => vk::AttachmentLoadOp::LOAD,
        LoadOp::Clear => vk::AttachmentLoadOp::CLEAR,
        LoadOp::DontCare => vk::AttachmentLoadOp::DONT_CARE,
    }
}

pub(crate) fn store_op_to_vk(store_op: StoreOp) -> vk::AttachmentStoreOp {
    match store_op {
        StoreOp::Store => vk::AttachmentStoreOp::STORE,
        StoreOp::DontCare => vk::AttachmentStoreOp::DONT_CARE,
    }
}

pub(crate) fn index_type_to_vk(index_type: IndexType) -> vk::IndexType {
    match index_type {
        IndexType::U16 => vk::IndexType::UINT16,
        IndexType::U32 => vk::IndexType::UINT32,
    }
}

pub(crate) fn clear_value_to_vk(value: ClearValue) -> vk::ClearValue {
    match value {
        ClearValue::Color(color) => vk::ClearValue {
            color: vk::ClearColorValue { float32: color },
        },
        ClearValue::DepthStencil { depth, stencil } => vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue { depth, stencil },
        },
    }
}

// ===== GEOMETRY =====

pub(crate) fn rect_to_vk(rect: Rect2D) -> vk::Rect2D {
    vk::Rect2D {
        offset: vk::Offset2D { x: rect.x, y: rect.y },
        extent: vk::Extent2D { width: rect.width, height: rect.height },
    }
}

pub(crate) fn viewport_to_vk(viewport: &Viewport) -> vk::Viewport {
    vk::Viewport {
        x: viewport.x,
        y: viewport.y,
        width: viewport.width,
        height: viewport.height,
        min_depth: viewport.min_depth,
        max_depth: viewport.max_depth,
    }
}

pub(crate) fn extent_from_vk(extent: vk::Extent2D) -> Extent2D {
    Extent2D::new(extent.width, extent.height)
}

pub(crate) fn buffer_image_copy_to_vk(
    region: &BufferImageCopy,
    aspect_mask: vk::ImageAspectFlags,
) -> vk::BufferImageCopy {
    vk::BufferImageCopy {
        buffer_offset: region.buffer_offset,
        buffer_row_length: region.buffer_row_length,
        buffer_image_height: region.buffer_image_height,
        image_subresource: vk::ImageSubresourceLayers {
            aspect_mask,
            mip_level: region.mip_level,
            base_array_layer: region.base_array_layer,
            layer_count: region.layer_count,
        },
        image_offset: vk::Offset3D {
            x: region.image_offset[0],
            y: region.image_offset[1],
            z: region.image_offset[2],
        },
        image_extent: vk::Extent3D {
            width: region.image_extent.width,
            height: region.image_extent.height,
            depth: region.image_extent.depth,
        },
    }
}

/// Aspect of an image created with `format`
pub(crate) fn aspect_for_format(format: vk::Format) -> vk::ImageAspectFlags {
    match format {
        vk::Format::D16_UNORM | vk::Format::D32_SFLOAT | vk::Format::X8_D24_UNORM_PACK32 => {
            vk::ImageAspectFlags::DEPTH
        }
        vk::Format::D16_UNORM_S8_UINT
        | vk::Format::D24_UNORM_S8_UINT
        | vk::Format::D32_SFLOAT_S8_UINT => {
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        }
        vk::Format::S8_UINT => vk::ImageAspectFlags::STENCIL,
        _ => vk::ImageAspectFlags::COLOR,
    }
}

#[cfg(test)]
#[path = "vulkan_convert_tests.rs"]
mod tests;
