//! Frames-in-flight synchronization and the frame loop

mod render_sync;
mod renderer;

pub use render_sync::{FrameSync, RenderSync};
pub use renderer::{
    Renderer, RendererConfig, RendererCreateInfo, RecordCommandBufferFn, UpdateUniformBufferFn,
};
