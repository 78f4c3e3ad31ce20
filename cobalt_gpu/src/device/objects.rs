/// Opaque GPU objects the backend creates and the recorder consumes

use crate::resource::AsAny;
use super::Extent3D;

/// GPU buffer
pub trait Buffer: AsAny + Send + Sync {
    /// Size in bytes
    fn size(&self) -> u64;
}

/// GPU image (texture, attachment or swapchain image)
pub trait Image: AsAny + Send + Sync {
    fn extent(&self) -> Extent3D;
}

/// Built graphics or compute pipeline
///
/// Constructed outside this crate; the backend wraps the native object.
pub trait Pipeline: AsAny + Send + Sync {}
