/// Raw command emission surface implemented by backends
///
/// Backends emit native commands without checking the recording protocol;
/// `CommandBuffer` and `CommandOperator` enforce it.

use bitflags::bitflags;
use crate::error::Result;
use crate::resource::AsAny;
use super::{
    Buffer, BufferImageCopy, DependencyInfo, Image, ImageLayout, IndexType, Pipeline,
    Rect2D, RenderingAttachment, ShaderStages, Viewport,
};

/// Command buffer level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandBufferLevel {
    Primary,
    Secondary,
}

bitflags! {
    /// Recording hints (bit values match Vulkan)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CommandBufferUsage: u32 {
        const ONE_TIME_SUBMIT = 0x1;
        const RENDER_PASS_CONTINUE = 0x2;
        const SIMULTANEOUS_USE = 0x4;
    }
}

/// Parameters of a dynamic rendering scope
#[derive(Clone, Copy)]
pub struct RenderingInfo<'a> {
    pub render_area: Rect2D,
    pub color_attachments: &'a [RenderingAttachment<'a>],
    pub depth_attachment: Option<&'a RenderingAttachment<'a>>,
}

/// Allocates native command buffers
pub trait CommandAllocator: Send {
    fn allocate(&mut self, level: CommandBufferLevel) -> Result<Box<dyn CommandRecorder>>;
}

/// One native command buffer
///
/// Dropping the recorder frees the native buffer.
pub trait CommandRecorder: AsAny + Send {
    fn begin(&mut self, usage: CommandBufferUsage) -> Result<()>;
    fn end(&mut self) -> Result<()>;
    fn reset(&mut self) -> Result<()>;

    fn begin_rendering(&mut self, info: &RenderingInfo<'_>);
    fn end_rendering(&mut self);
    fn pipeline_barrier(&mut self, dependency: &DependencyInfo<'_>);

    fn set_viewport(&mut self, viewport: &Viewport);
    fn set_scissor(&mut self, scissor: &Rect2D);

    /// Bind the pipeline and its resources for frame slot `frame_index`
    fn bind_pipeline(&mut self, pipeline: &dyn Pipeline, frame_index: u32);
    fn bind_vertex_buffers(&mut self, first_binding: u32, buffers: &[&dyn Buffer], offsets: &[u64]);
    fn bind_index_buffer(&mut self, buffer: &dyn Buffer, offset: u64, index_type: IndexType);
    fn push_constants(&mut self, pipeline: &dyn Pipeline, stages: ShaderStages, offset: u32, data: &[u8]);

    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32);
    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    );

    fn copy_buffer_to_image(
        &mut self,
        src: &dyn Buffer,
        dst: &dyn Image,
        dst_layout: ImageLayout,
        regions: &[BufferImageCopy],
    );
    fn copy_buffer(&mut self, src: &dyn Buffer, dst: &dyn Buffer, size: u64);
}
