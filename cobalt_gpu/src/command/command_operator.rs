/// Command operator - scoped recording session over one CommandBuffer
///
/// Obtained from [`CommandBuffer::command_operator`]. Every emission method
/// requires the session to be open; calling one after `end_recording` is a
/// programming error and panics. Dropping an operator whose session is still
/// open ends the recording, on every exit path.

use crate::device::{
    Buffer, BufferImageCopy, CommandRecorder, DependencyInfo, Image, ImageLayout, IndexType,
    Pipeline, Rect2D, RenderingAttachment, RenderingInfo, ShaderStages, Viewport,
};
use crate::error::{Error, Result};
use super::CommandBuffer;

pub struct CommandOperator<'a> {
    buffer: &'a mut CommandBuffer,
    recording: bool,
    render_area: Option<Rect2D>,
    viewport: Option<Viewport>,
}

impl<'a> CommandOperator<'a> {
    pub(crate) fn new(buffer: &'a mut CommandBuffer) -> Self {
        Self {
            buffer,
            recording: true,
            render_area: None,
            viewport: None,
        }
    }

    fn ensure_recording(&self) {
        if !self.recording {
            crate::engine_fatal!(
                "cobalt::CommandOperator",
                "not recording: buffer {} already ended its session",
                self.buffer.pool_index()
            );
        }
    }

    fn recorder(&mut self) -> &mut dyn CommandRecorder {
        self.ensure_recording();
        self.buffer.recorder_mut()
    }

    /// Whether the session is still open
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    // ===== STORED STATE =====

    /// Remember the render area used when no override is given
    ///
    /// Used by `begin_rendering` and as the scissor fallback.
    pub fn store_render_area(&mut self, area: Rect2D) {
        self.render_area = Some(area);
    }

    /// Remember the viewport used when no override is given
    pub fn store_viewport(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
    }

    pub fn render_area(&self) -> Option<Rect2D> {
        self.render_area
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    // ===== SESSION =====

    /// Close the session; the buffer becomes `Executable`
    pub fn end_recording(&mut self) -> Result<()> {
        self.ensure_recording();
        self.recording = false;
        self.buffer.finish_recording()
    }

    /// Open a dynamic rendering scope
    ///
    /// # Arguments
    ///
    /// * `color` - Color attachments
    /// * `depth` - Optional depth attachment
    /// * `area` - Render area override; the stored render area otherwise
    ///
    /// # Errors
    ///
    /// `Error::NoRenderArea` if there is neither an override nor a stored
    /// area. Nothing is recorded in that case.
    pub fn begin_rendering(
        &mut self,
        color: &[RenderingAttachment<'_>],
        depth: Option<&RenderingAttachment<'_>>,
        area: Option<Rect2D>,
    ) -> Result<()> {
        self.ensure_recording();
        let render_area = area.or(self.render_area).ok_or(Error::NoRenderArea)?;
        self.recorder().begin_rendering(&RenderingInfo {
            render_area,
            color_attachments: color,
            depth_attachment: depth,
        });
        Ok(())
    }

    pub fn end_rendering(&mut self) {
        self.recorder().end_rendering();
    }

    /// Record a pipeline barrier; empty dependencies record nothing
    pub fn insert_barrier(&mut self, dependency: &DependencyInfo<'_>) {
        let recorder = self.recorder();
        if !dependency.is_empty() {
            recorder.pipeline_barrier(dependency);
        }
    }

    // ===== DYNAMIC STATE =====

    /// Set the viewport, falling back to the stored one
    ///
    /// # Errors
    ///
    /// `Error::NoViewport` if neither is available.
    pub fn set_viewport(&mut self, viewport: Option<Viewport>) -> Result<()> {
        self.ensure_recording();
        let viewport = viewport.or(self.viewport).ok_or(Error::NoViewport)?;
        self.recorder().set_viewport(&viewport);
        Ok(())
    }

    /// Set the scissor, falling back to the stored render area
    ///
    /// # Errors
    ///
    /// `Error::NoRenderArea` if neither is available.
    pub fn set_scissor(&mut self, scissor: Option<Rect2D>) -> Result<()> {
        self.ensure_recording();
        let scissor = scissor.or(self.render_area).ok_or(Error::NoRenderArea)?;
        self.recorder().set_scissor(&scissor);
        Ok(())
    }

    // ===== BINDING =====

    /// Bind a pipeline with its per-frame resources for `frame_index`
    pub fn bind_pipeline(&mut self, pipeline: &dyn Pipeline, frame_index: u32) {
        self.recorder().bind_pipeline(pipeline, frame_index);
    }

    /// # Panics
    ///
    /// If `buffers` and `offsets` differ in length.
    pub fn bind_vertex_buffers(&mut self, first_binding: u32, buffers: &[&dyn Buffer], offsets: &[u64]) {
        if buffers.len() != offsets.len() {
            crate::engine_fatal!(
                "cobalt::CommandOperator",
                "bind_vertex_buffers: {} buffers but {} offsets",
                buffers.len(),
                offsets.len()
            );
        }
        self.recorder().bind_vertex_buffers(first_binding, buffers, offsets);
    }

    pub fn bind_index_buffer(&mut self, buffer: &dyn Buffer, offset: u64, index_type: IndexType) {
        self.recorder().bind_index_buffer(buffer, offset, index_type);
    }

    pub fn push_constants(&mut self, pipeline: &dyn Pipeline, stages: ShaderStages, offset: u32, data: &[u8]) {
        self.recorder().push_constants(pipeline, stages, offset, data);
    }

    /// Push a plain-old-data value as constants
    pub fn push_constants_pod<T: bytemuck::Pod>(
        &mut self,
        pipeline: &dyn Pipeline,
        stages: ShaderStages,
        offset: u32,
        value: &T,
    ) {
        self.push_constants(pipeline, stages, offset, bytemuck::bytes_of(value));
    }

    // ===== DRAWING =====

    /// Draw; zero vertices or instances records nothing
    pub fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
        let recorder = self.recorder();
        if vertex_count == 0 || instance_count == 0 {
            return;
        }
        recorder.draw(vertex_count, instance_count, first_vertex, first_instance);
    }

    /// Indexed draw; zero indices or instances records nothing
    pub fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        let recorder = self.recorder();
        if index_count == 0 || instance_count == 0 {
            return;
        }
        recorder.draw_indexed(index_count, instance_count, first_index, vertex_offset, first_instance);
    }

    // ===== TRANSFER =====

    pub fn copy_buffer_to_image(
        &mut self,
        src: &dyn Buffer,
        dst: &dyn Image,
        dst_layout: ImageLayout,
        regions: &[BufferImageCopy],
    ) {
        let recorder = self.recorder();
        if !regions.is_empty() {
            recorder.copy_buffer_to_image(src, dst, dst_layout, regions);
        }
    }

    /// Copy `min(src.size(), dst.size())` bytes from the start of `src` to the start of `dst`
    pub fn copy_buffer(&mut self, src: &dyn Buffer, dst: &dyn Buffer) {
        let recorder = self.recorder();
        let size = src.size().min(dst.size());
        if size > 0 {
            recorder.copy_buffer(src, dst, size);
        }
    }
}

impl Drop for CommandOperator<'_> {
    fn drop(&mut self) {
        if self.recording {
            self.recording = false;
            // Errors are already logged by finish_recording
            let _ = self.buffer.finish_recording();
        }
    }
}

#[cfg(test)]
#[path = "command_operator_tests.rs"]
mod tests;
