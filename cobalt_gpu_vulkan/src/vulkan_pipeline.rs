/// VulkanPipeline - wraps a pipeline built outside the crate

use ash::vk;
use std::sync::Arc;
use cobalt_gpu::cobalt::{AsAny, Resource};
use cobalt_gpu::cobalt::device::Pipeline;

use crate::vulkan_context::VulkanContext;
use crate::vulkan_device::VulkanDevice;

pub struct VulkanPipeline {
    ctx: Arc<VulkanContext>,
    pub(crate) pipeline: vk::Pipeline,
    pub(crate) layout: vk::PipelineLayout,
    pub(crate) bind_point: vk::PipelineBindPoint,
    /// Descriptor sets bound at set 0, one per frame in flight (not owned)
    pub(crate) descriptor_sets: Vec<vk::DescriptorSet>,
}

impl VulkanPipeline {
    /// Take ownership of a native pipeline and its layout
    ///
    /// `descriptor_sets` holds one set per frame slot; binding the pipeline
    /// for frame `i` binds `descriptor_sets[i % len]`. The sets stay owned
    /// by their descriptor pool.
    ///
    /// # Safety
    ///
    /// `pipeline` and `layout` must have been created on `device` and must
    /// not be destroyed elsewhere. The descriptor sets must outlive every
    /// command buffer recorded with this pipeline.
    pub unsafe fn from_raw(
        device: &VulkanDevice,
        pipeline: vk::Pipeline,
        layout: vk::PipelineLayout,
        bind_point: vk::PipelineBindPoint,
        descriptor_sets: Vec<vk::DescriptorSet>,
    ) -> Self {
        Self {
            ctx: device.context(),
            pipeline,
            layout,
            bind_point,
            descriptor_sets,
        }
    }

    pub fn raw(&self) -> vk::Pipeline {
        self.pipeline
    }

    pub fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }

    /// Descriptor set bound for `frame_index`, if any
    pub(crate) fn descriptor_set(&self, frame_index: u32) -> Option<vk::DescriptorSet> {
        if self.descriptor_sets.is_empty() {
            None
        } else {
            Some(self.descriptor_sets[frame_index as usize % self.descriptor_sets.len()])
        }
    }
}

impl Pipeline for VulkanPipeline {}

impl Resource for VulkanPipeline {}

impl Drop for VulkanPipeline {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_pipeline(self.pipeline, None);
            self.ctx.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}

/// Concrete pipeline behind a `dyn Pipeline` created by this backend
pub(crate) fn vulkan_pipeline(pipeline: &dyn Pipeline) -> Option<&VulkanPipeline> {
    pipeline.as_any().downcast_ref::<VulkanPipeline>()
}
