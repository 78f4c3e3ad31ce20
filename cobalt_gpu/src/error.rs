//! Error types for the Cobalt GPU core
//!
//! Every recoverable condition of the resource manager, the recording
//! protocol and the frame loop is a variant of [`Error`]. Contract violations
//! (recording into a locked buffer, emitting commands outside a recording
//! session) are not represented here: they panic.

use std::fmt;
use std::time::Duration;

/// Result type for Cobalt operations
pub type Result<T> = std::result::Result<T, Error>;

/// Cobalt errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error (Vulkan, mock, etc.)
    BackendError(String),

    /// Out of GPU or host memory
    OutOfMemory,

    /// Resource exists but cannot be used as requested (wrong type, bad index)
    InvalidResource(String),

    /// Initialization failed (engine, device, subsystems)
    InitializationFailed(String),

    /// Handle refers to a slot whose occupant was destroyed
    StaleHandle(String),

    /// Swapchain no longer matches the surface and must be recreated
    SwapchainOutOfDate,

    /// A bounded wait expired before the GPU signaled
    Timeout(Duration),

    /// No render area override given and none stored on the operator
    NoRenderArea,

    /// No viewport override given and none stored on the operator
    NoViewport,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::StaleHandle(msg) => write!(f, "Stale handle: {}", msg),
            Error::SwapchainOutOfDate => write!(f, "Swapchain out of date"),
            Error::Timeout(timeout) => write!(f, "Wait timed out after {:?}", timeout),
            Error::NoRenderArea => write!(f, "No render area configured"),
            Error::NoViewport => write!(f, "No viewport configured"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
