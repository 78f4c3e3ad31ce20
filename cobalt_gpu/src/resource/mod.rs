//! Resource ownership
//!
//! Every GPU-adjacent object lives in the [`ResourceManager`] as a boxed
//! [`Resource`], is referenced through typed [`Handle`]s, and is destroyed by
//! the manager's [`DeletionQueue`] in reverse creation order.

mod resource;
mod handle_table;
mod handle;
mod deletion_queue;
mod resource_manager;

pub use resource::{Resource, AsAny};
pub use handle_table::{HandleTable, SlotKey};
pub use handle::Handle;
pub use deletion_queue::{DeletionQueue, DeferredAction};
pub use resource_manager::ResourceManager;
