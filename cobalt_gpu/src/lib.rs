/*!
# Cobalt GPU

Backend-agnostic core of the Cobalt GPU resource lifecycle manager.

This crate owns every GPU-adjacent object through a generation-checked handle
table, tears them down in reverse creation order through a deletion queue, and
drives the per-frame synchronization protocol (wait, acquire, record, submit,
present) across N frames in flight. Native graphics APIs plug in through the
traits in [`device`]; the Vulkan implementation lives in `cobalt_gpu_vulkan`.

## Architecture

- **ResourceManager**: owns resources, issues typed `Handle<T>`s, destroys in LIFO order
- **HandleTable**: generation-checked slot map behind every handle
- **DeletionQueue**: LIFO stack of deferred cleanup actions
- **CommandPool / CommandBuffer / CommandOperator**: allocation and scoped recording
- **RenderSync / Renderer**: frames-in-flight synchronization and the frame loop
- **Engine**: process-wide singleton access and logging
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod utils;
pub mod resource;
pub mod device;
pub mod command;
pub mod render;

// Main cobalt namespace module
pub mod cobalt {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Resource ownership
    pub use crate::resource::{
        Resource, AsAny, Handle, HandleTable, SlotKey, DeletionQueue, ResourceManager,
    };

    // Command recording
    pub use crate::command::{
        CommandPool, CommandBuffer, CommandBufferState, CommandOperator,
    };

    // Frame loop
    pub use crate::render::{
        Renderer, RendererConfig, RendererCreateInfo, RenderSync, FrameSync,
    };

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Backend interface sub-module
    pub mod device {
        pub use crate::device::*;
    }
}
