/// Swapchain trait - images presented to a window surface

use crate::error::Result;
use crate::resource::AsAny;
use super::{Extent2D, Semaphore};

/// Ring of presentable images
pub trait Swapchain: AsAny + Send + Sync {
    /// Acquire the next image, signaling `signal` when it is ready
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the swapchain is out of date and must be recreated.
    fn acquire_next_image(&self, signal: &dyn Semaphore) -> Result<Option<u32>>;

    /// Number of images
    fn image_count(&self) -> u32;

    /// Current image size
    fn extent(&self) -> Extent2D;

    /// Rebuild the images for a new surface size
    ///
    /// The caller must make sure no submitted work still references the old
    /// images.
    fn recreate(&mut self, width: u32, height: u32) -> Result<()>;
}
