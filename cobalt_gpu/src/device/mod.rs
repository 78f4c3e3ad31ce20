/// Backend interface - traits a native graphics API implements

pub mod graphics_device;
pub mod types;
pub mod objects;
pub mod swapchain;
pub mod submit;
pub mod command_recorder;

pub use graphics_device::*;
pub use types::*;
pub use objects::*;
pub use swapchain::*;
pub use submit::*;
pub use command_recorder::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
