/// Command allocator and recorder - Vulkan implementation
///
/// The native pool is shared by the allocator and every buffer allocated
/// from it, so buffers can be freed in any order relative to the pool.

use ash::vk;
use std::sync::{Arc, Mutex};
use cobalt_gpu::cobalt::Result;
use cobalt_gpu::cobalt::device::{
    Buffer, BufferImageCopy, CommandAllocator, CommandBufferLevel, CommandBufferUsage,
    CommandRecorder, DependencyInfo, Image, ImageLayout, IndexType, Pipeline, Rect2D,
    RenderingAttachment, RenderingInfo, ShaderStages, Viewport,
};
use cobalt_gpu::{engine_error, engine_warn};

use crate::vulkan_buffer::raw_buffer;
use crate::vulkan_context::VulkanContext;
use crate::vulkan_convert::{
    access_to_vk, buffer_image_copy_to_vk, clear_value_to_vk, image_layout_to_vk,
    index_type_to_vk, level_to_vk, load_op_to_vk, pipeline_stages_to_vk, rect_to_vk,
    shader_stages_to_vk, store_op_to_vk, usage_to_vk, viewport_to_vk, vk_error,
};
use crate::vulkan_image::vulkan_image;
use crate::vulkan_pipeline::vulkan_pipeline;

/// Native pool plus the context that destroys it
struct PoolInner {
    ctx: Arc<VulkanContext>,
    /// Allocation and freeing need external synchronization
    pool: Mutex<vk::CommandPool>,
}

impl Drop for PoolInner {
    fn drop(&mut self) {
        if let Ok(pool) = self.pool.get_mut() {
            unsafe {
                self.ctx.device.destroy_command_pool(*pool, None);
            }
        }
    }
}

// ============================================================================
// ALLOCATOR
// ============================================================================

pub struct VulkanCommandAllocator {
    inner: Arc<PoolInner>,
}

impl VulkanCommandAllocator {
    pub(crate) fn new(ctx: Arc<VulkanContext>) -> Result<Self> {
        let create_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(ctx.graphics_queue_family)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

        let pool = unsafe { ctx.device.create_command_pool(&create_info, None) }
            .map_err(|e| vk_error(e, "create command pool"))?;

        Ok(Self {
            inner: Arc::new(PoolInner { ctx, pool: Mutex::new(pool) }),
        })
    }
}

impl CommandAllocator for VulkanCommandAllocator {
    fn allocate(&mut self, level: CommandBufferLevel) -> Result<Box<dyn CommandRecorder>> {
        let pool = self.inner.pool.lock().map_err(|_| {
            cobalt_gpu::engine_err!("cobalt::vulkan", "Command pool mutex poisoned")
        })?;

        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(*pool)
            .level(level_to_vk(level))
            .command_buffer_count(1);

        let buffers = unsafe { self.inner.ctx.device.allocate_command_buffers(&allocate_info) }
            .map_err(|e| vk_error(e, "allocate command buffer"))?;
        drop(pool);

        let buffer = match buffers.first() {
            Some(&buffer) => buffer,
            None => cobalt_gpu::engine_bail!("cobalt::vulkan", "Driver returned no command buffer"),
        };

        Ok(Box::new(VulkanCommandRecorder {
            pool: Arc::clone(&self.inner),
            buffer,
            level,
        }))
    }
}

// ============================================================================
// RECORDER
// ============================================================================

/// One native command buffer
///
/// Emission methods skip objects that were not created by this backend and
/// log an error instead.
pub struct VulkanCommandRecorder {
    pool: Arc<PoolInner>,
    pub(crate) buffer: vk::CommandBuffer,
    level: CommandBufferLevel,
}

impl VulkanCommandRecorder {
    pub fn raw(&self) -> vk::CommandBuffer {
        self.buffer
    }

    fn device(&self) -> &ash::Device {
        &self.pool.ctx.device
    }

    fn attachment_info(attachment: &RenderingAttachment<'_>) -> Option<vk::RenderingAttachmentInfo<'static>> {
        let image = match vulkan_image(attachment.image) {
            Some(image) => image,
            None => {
                engine_error!("cobalt::vulkan", "begin_rendering: attachment is not a Vulkan image");
                return None;
            }
        };
        Some(
            vk::RenderingAttachmentInfo::default()
                .image_view(image.view)
                .image_layout(image_layout_to_vk(attachment.layout))
                .load_op(load_op_to_vk(attachment.load_op))
                .store_op(store_op_to_vk(attachment.store_op))
                .clear_value(clear_value_to_vk(attachment.clear_value)),
        )
    }

    fn raw_buffer_or_log(buffer: &dyn Buffer, what: &str) -> Option<vk::Buffer> {
        let raw = raw_buffer(buffer);
        if raw.is_none() {
            engine_error!("cobalt::vulkan", "{}: buffer is not a Vulkan buffer", what);
        }
        raw
    }
}

impl CommandRecorder for VulkanCommandRecorder {
    fn begin(&mut self, usage: CommandBufferUsage) -> Result<()> {
        // Secondary buffers inherit nothing; dynamic rendering carries the attachments
        let inheritance = vk::CommandBufferInheritanceInfo::default();
        let mut begin_info = vk::CommandBufferBeginInfo::default().flags(usage_to_vk(usage));
        if self.level == CommandBufferLevel::Secondary {
            begin_info = begin_info.inheritance_info(&inheritance);
        }

        unsafe {
            self.device()
                .begin_command_buffer(self.buffer, &begin_info)
                .map_err(|e| vk_error(e, "begin command buffer"))
        }
    }

    fn end(&mut self) -> Result<()> {
        unsafe {
            self.device()
                .end_command_buffer(self.buffer)
                .map_err(|e| vk_error(e, "end command buffer"))
        }
    }

    fn reset(&mut self) -> Result<()> {
        unsafe {
            self.device()
                .reset_command_buffer(self.buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| vk_error(e, "reset command buffer"))
        }
    }

    fn begin_rendering(&mut self, info: &RenderingInfo<'_>) {
        let mut colors = Vec::with_capacity(info.color_attachments.len());
        for attachment in info.color_attachments {
            match Self::attachment_info(attachment) {
                Some(color) => colors.push(color),
                None => return,
            }
        }
        let depth = match info.depth_attachment {
            Some(attachment) => match Self::attachment_info(attachment) {
                Some(depth) => Some(depth),
                None => return,
            },
            None => None,
        };

        let mut rendering_info = vk::RenderingInfo::default()
            .render_area(rect_to_vk(info.render_area))
            .layer_count(1)
            .color_attachments(&colors);
        if let Some(depth) = depth.as_ref() {
            rendering_info = rendering_info.depth_attachment(depth);
        }

        unsafe {
            self.device().cmd_begin_rendering(self.buffer, &rendering_info);
        }
    }

    fn end_rendering(&mut self) {
        unsafe {
            self.device().cmd_end_rendering(self.buffer);
        }
    }

    fn pipeline_barrier(&mut self, dependency: &DependencyInfo<'_>) {
        let memory_barriers: Vec<vk::MemoryBarrier2> = dependency
            .memory_barriers
            .iter()
            .map(|barrier| {
                vk::MemoryBarrier2::default()
                    .src_stage_mask(pipeline_stages_to_vk(barrier.src_stages))
                    .src_access_mask(access_to_vk(barrier.src_access))
                    .dst_stage_mask(pipeline_stages_to_vk(barrier.dst_stages))
                    .dst_access_mask(access_to_vk(barrier.dst_access))
            })
            .collect();

        let mut image_barriers = Vec::with_capacity(dependency.image_barriers.len());
        for barrier in &dependency.image_barriers {
            let image = match vulkan_image(barrier.image) {
                Some(image) => image,
                None => {
                    engine_error!("cobalt::vulkan", "pipeline_barrier: image is not a Vulkan image");
                    return;
                }
            };
            image_barriers.push(
                vk::ImageMemoryBarrier2::default()
                    .src_stage_mask(pipeline_stages_to_vk(barrier.src_stages))
                    .src_access_mask(access_to_vk(barrier.src_access))
                    .dst_stage_mask(pipeline_stages_to_vk(barrier.dst_stages))
                    .dst_access_mask(access_to_vk(barrier.dst_access))
                    .old_layout(image_layout_to_vk(barrier.old_layout))
                    .new_layout(image_layout_to_vk(barrier.new_layout))
                    .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .image(image.image)
                    .subresource_range(vk::ImageSubresourceRange {
                        aspect_mask: image.aspect,
                        base_mip_level: 0,
                        level_count: vk::REMAINING_MIP_LEVELS,
                        base_array_layer: 0,
                        layer_count: vk::REMAINING_ARRAY_LAYERS,
                    }),
            );
        }

        let dependency_info = vk::DependencyInfo::default()
            .memory_barriers(&memory_barriers)
            .image_memory_barriers(&image_barriers);

        unsafe {
            self.device().cmd_pipeline_barrier2(self.buffer, &dependency_info);
        }
    }

    fn set_viewport(&mut self, viewport: &Viewport) {
        unsafe {
            self.device().cmd_set_viewport(self.buffer, 0, &[viewport_to_vk(viewport)]);
        }
    }

    fn set_scissor(&mut self, scissor: &Rect2D) {
        unsafe {
            self.device().cmd_set_scissor(self.buffer, 0, &[rect_to_vk(*scissor)]);
        }
    }

    fn bind_pipeline(&mut self, pipeline: &dyn Pipeline, frame_index: u32) {
        let pipeline = match vulkan_pipeline(pipeline) {
            Some(pipeline) => pipeline,
            None => {
                engine_error!("cobalt::vulkan", "bind_pipeline: pipeline is not a Vulkan pipeline");
                return;
            }
        };

        unsafe {
            self.device()
                .cmd_bind_pipeline(self.buffer, pipeline.bind_point, pipeline.pipeline);
            if let Some(set) = pipeline.descriptor_set(frame_index) {
                self.device().cmd_bind_descriptor_sets(
                    self.buffer,
                    pipeline.bind_point,
                    pipeline.layout,
                    0,
                    &[set],
                    &[],
                );
            }
        }
    }

    fn bind_vertex_buffers(&mut self, first_binding: u32, buffers: &[&dyn Buffer], offsets: &[u64]) {
        let mut raw = Vec::with_capacity(buffers.len());
        for &buffer in buffers {
            match Self::raw_buffer_or_log(buffer, "bind_vertex_buffers") {
                Some(buffer) => raw.push(buffer),
                None => return,
            }
        }
        unsafe {
            self.device()
                .cmd_bind_vertex_buffers(self.buffer, first_binding, &raw, offsets);
        }
    }

    fn bind_index_buffer(&mut self, buffer: &dyn Buffer, offset: u64, index_type: IndexType) {
        if let Some(raw) = Self::raw_buffer_or_log(buffer, "bind_index_buffer") {
            unsafe {
                self.device()
                    .cmd_bind_index_buffer(self.buffer, raw, offset, index_type_to_vk(index_type));
            }
        }
    }

    fn push_constants(&mut self, pipeline: &dyn Pipeline, stages: ShaderStages, offset: u32, data: &[u8]) {
        let pipeline = match vulkan_pipeline(pipeline) {
            Some(pipeline) => pipeline,
            None => {
                engine_error!("cobalt::vulkan", "push_constants: pipeline is not a Vulkan pipeline");
                return;
            }
        };
        unsafe {
            self.device().cmd_push_constants(
                self.buffer,
                pipeline.layout,
                shader_stages_to_vk(stages),
                offset,
                data,
            );
        }
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
        unsafe {
            self.device()
                .cmd_draw(self.buffer, vertex_count, instance_count, first_vertex, first_instance);
        }
    }

    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        unsafe {
            self.device().cmd_draw_indexed(
                self.buffer,
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            );
        }
    }

    fn copy_buffer_to_image(
        &mut self,
        src: &dyn Buffer,
        dst: &dyn Image,
        dst_layout: ImageLayout,
        regions: &[BufferImageCopy],
    ) {
        let src = match Self::raw_buffer_or_log(src, "copy_buffer_to_image") {
            Some(src) => src,
            None => return,
        };
        let dst = match vulkan_image(dst) {
            Some(dst) => dst,
            None => {
                engine_error!("cobalt::vulkan", "copy_buffer_to_image: destination is not a Vulkan image");
                return;
            }
        };

        let regions: Vec<vk::BufferImageCopy> = regions
            .iter()
            .map(|region| buffer_image_copy_to_vk(region, dst.aspect))
            .collect();

        unsafe {
            self.device().cmd_copy_buffer_to_image(
                self.buffer,
                src,
                dst.image,
                image_layout_to_vk(dst_layout),
                &regions,
            );
        }
    }

    fn copy_buffer(&mut self, src: &dyn Buffer, dst: &dyn Buffer, size: u64) {
        let (src, dst) = match (
            Self::raw_buffer_or_log(src, "copy_buffer"),
            Self::raw_buffer_or_log(dst, "copy_buffer"),
        ) {
            (Some(src), Some(dst)) => (src, dst),
            _ => return,
        };
        let region = vk::BufferCopy { src_offset: 0, dst_offset: 0, size };
        unsafe {
            self.device().cmd_copy_buffer(self.buffer, src, dst, &[region]);
        }
    }
}

impl Drop for VulkanCommandRecorder {
    fn drop(&mut self) {
        match self.pool.pool.lock() {
            Ok(pool) => unsafe {
                self.pool.ctx.device.free_command_buffers(*pool, &[self.buffer]);
            },
            Err(_) => {
                engine_warn!("cobalt::vulkan", "Command pool mutex poisoned, command buffer leaked");
            }
        }
    }
}

/// Native command buffer behind a `dyn CommandRecorder` created by this backend
pub(crate) fn raw_command_buffer(recorder: &dyn CommandRecorder) -> Option<vk::CommandBuffer> {
    recorder
        .as_any()
        .downcast_ref::<VulkanCommandRecorder>()
        .map(|r| r.buffer)
}
