/// Plain data types shared by the recording surface

use bitflags::bitflags;
use super::Image;

/// 2D size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// 3D size in texels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent3D {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl From<Extent2D> for Extent3D {
    fn from(extent: Extent2D) -> Self {
        Self { width: extent.width, height: extent.height, depth: 1 }
    }
}

/// Rectangle for render area and scissor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect2D {
    /// Rectangle at the origin covering `extent`
    pub fn from_extent(extent: Extent2D) -> Self {
        Self { x: 0, y: 0, width: extent.width, height: extent.height }
    }
}

/// Viewport transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Viewport covering `extent` with depth range [0, 1]
    pub fn from_extent(extent: Extent2D) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// Clear value for an attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    Color([f32; 4]),
    DepthStencil { depth: f32, stencil: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOp {
    Load,
    Clear,
    DontCare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Store,
    DontCare,
}

/// Image layouts used by barriers and attachments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageLayout {
    Undefined,
    General,
    ColorAttachment,
    DepthStencilAttachment,
    ShaderReadOnly,
    TransferSrc,
    TransferDst,
    PresentSrc,
}

/// One attachment of a dynamic rendering scope
#[derive(Clone, Copy)]
pub struct RenderingAttachment<'a> {
    pub image: &'a dyn Image,
    pub layout: ImageLayout,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub clear_value: ClearValue,
}

impl<'a> RenderingAttachment<'a> {
    /// Color attachment cleared to `color` and stored
    pub fn color(image: &'a dyn Image, color: [f32; 4]) -> Self {
        Self {
            image,
            layout: ImageLayout::ColorAttachment,
            load_op: LoadOp::Clear,
            store_op: StoreOp::Store,
            clear_value: ClearValue::Color(color),
        }
    }

    /// Depth attachment cleared to `depth`, contents discarded afterwards
    pub fn depth(image: &'a dyn Image, depth: f32) -> Self {
        Self {
            image,
            layout: ImageLayout::DepthStencilAttachment,
            load_op: LoadOp::Clear,
            store_op: StoreOp::DontCare,
            clear_value: ClearValue::DepthStencil { depth, stencil: 0 },
        }
    }
}

/// Index element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    U16,
    U32,
}

impl IndexType {
    pub fn size_bytes(&self) -> u32 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

bitflags! {
    /// Shader stages (bit values match Vulkan)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStages: u32 {
        const VERTEX = 0x1;
        const FRAGMENT = 0x10;
        const COMPUTE = 0x20;
        const ALL_GRAPHICS = 0x1F;
    }
}

bitflags! {
    /// Memory access types for barriers (bit values match Vulkan access2)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u64 {
        const INDIRECT_COMMAND_READ = 0x1;
        const INDEX_READ = 0x2;
        const VERTEX_ATTRIBUTE_READ = 0x4;
        const UNIFORM_READ = 0x8;
        const INPUT_ATTACHMENT_READ = 0x10;
        const SHADER_READ = 0x20;
        const SHADER_WRITE = 0x40;
        const COLOR_ATTACHMENT_READ = 0x80;
        const COLOR_ATTACHMENT_WRITE = 0x100;
        const DEPTH_STENCIL_ATTACHMENT_READ = 0x200;
        const DEPTH_STENCIL_ATTACHMENT_WRITE = 0x400;
        const TRANSFER_READ = 0x800;
        const TRANSFER_WRITE = 0x1000;
        const HOST_READ = 0x2000;
        const HOST_WRITE = 0x4000;
        const MEMORY_READ = 0x8000;
        const MEMORY_WRITE = 0x10000;
    }
}

bitflags! {
    /// Pipeline stages for barriers and semaphore waits (bit values match Vulkan stage2)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PipelineStages: u64 {
        const TOP_OF_PIPE = 0x1;
        const DRAW_INDIRECT = 0x2;
        const VERTEX_INPUT = 0x4;
        const VERTEX_SHADER = 0x8;
        const FRAGMENT_SHADER = 0x80;
        const EARLY_FRAGMENT_TESTS = 0x100;
        const LATE_FRAGMENT_TESTS = 0x200;
        const COLOR_ATTACHMENT_OUTPUT = 0x400;
        const COMPUTE_SHADER = 0x800;
        const TRANSFER = 0x1000;
        const BOTTOM_OF_PIPE = 0x2000;
        const HOST = 0x4000;
        const ALL_GRAPHICS = 0x8000;
        const ALL_COMMANDS = 0x10000;
    }
}

// ===== BARRIERS =====

/// Global memory dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryBarrier {
    pub src_stages: PipelineStages,
    pub src_access: AccessFlags,
    pub dst_stages: PipelineStages,
    pub dst_access: AccessFlags,
}

/// Dependency and layout transition over a whole image
#[derive(Clone, Copy)]
pub struct ImageBarrier<'a> {
    pub image: &'a dyn Image,
    pub src_stages: PipelineStages,
    pub src_access: AccessFlags,
    pub dst_stages: PipelineStages,
    pub dst_access: AccessFlags,
    pub old_layout: ImageLayout,
    pub new_layout: ImageLayout,
}

impl<'a> ImageBarrier<'a> {
    /// Undefined to color attachment, before the first draw into a swapchain image
    pub fn to_color_attachment(image: &'a dyn Image) -> Self {
        Self {
            image,
            src_stages: PipelineStages::COLOR_ATTACHMENT_OUTPUT,
            src_access: AccessFlags::empty(),
            dst_stages: PipelineStages::COLOR_ATTACHMENT_OUTPUT,
            dst_access: AccessFlags::COLOR_ATTACHMENT_WRITE,
            old_layout: ImageLayout::Undefined,
            new_layout: ImageLayout::ColorAttachment,
        }
    }

    /// Color attachment to present source, after the last draw
    pub fn to_present(image: &'a dyn Image) -> Self {
        Self {
            image,
            src_stages: PipelineStages::COLOR_ATTACHMENT_OUTPUT,
            src_access: AccessFlags::COLOR_ATTACHMENT_WRITE,
            dst_stages: PipelineStages::BOTTOM_OF_PIPE,
            dst_access: AccessFlags::empty(),
            old_layout: ImageLayout::ColorAttachment,
            new_layout: ImageLayout::PresentSrc,
        }
    }
}

/// Set of barriers recorded as one pipeline barrier
#[derive(Clone, Default)]
pub struct DependencyInfo<'a> {
    pub memory_barriers: Vec<MemoryBarrier>,
    pub image_barriers: Vec<ImageBarrier<'a>>,
}

impl<'a> DependencyInfo<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn memory(mut self, barrier: MemoryBarrier) -> Self {
        self.memory_barriers.push(barrier);
        self
    }

    pub fn image(mut self, barrier: ImageBarrier<'a>) -> Self {
        self.image_barriers.push(barrier);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.memory_barriers.is_empty() && self.image_barriers.is_empty()
    }
}

// ===== COPIES =====

/// Region of a buffer to image copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferImageCopy {
    pub buffer_offset: u64,
    /// Row length in texels, 0 = tightly packed
    pub buffer_row_length: u32,
    /// Image height in texels, 0 = tightly packed
    pub buffer_image_height: u32,
    pub mip_level: u32,
    pub base_array_layer: u32,
    pub layer_count: u32,
    pub image_offset: [i32; 3],
    pub image_extent: Extent3D,
}

impl BufferImageCopy {
    /// Tightly packed copy of mip 0, layer 0, covering `extent`
    pub fn whole_image(extent: Extent3D) -> Self {
        Self {
            buffer_offset: 0,
            buffer_row_length: 0,
            buffer_image_height: 0,
            mip_level: 0,
            base_array_layer: 0,
            layer_count: 1,
            image_offset: [0, 0, 0],
            image_extent: extent,
        }
    }
}
