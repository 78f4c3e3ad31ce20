/// Central owner of every GPU-adjacent object.
///
/// Resources are boxed into a generation-checked [`HandleTable`] and handed
/// back as typed [`Handle`]s. Each registration pushes a deletion action on a
/// LIFO [`DeletionQueue`]; `reset` (and `Drop`) runs the queue so resources
/// die in reverse creation order.
///
/// Every manager carries a process-unique id that is stamped into the
/// handles it issues, so a handle never resolves in a manager other than its
/// issuer (including a manager created after an engine restart).

use std::any::type_name;
use std::sync::atomic::{AtomicU64, Ordering};
use crate::error::{Error, Result};
use super::{AsAny, DeletionQueue, Handle, HandleTable, Resource};

type ResourceTable = HandleTable<Box<dyn Resource>>;

static NEXT_MANAGER_ID: AtomicU64 = AtomicU64::new(1);

pub struct ResourceManager {
    id: u64,
    resources: ResourceTable,
    deletion_queue: DeletionQueue<ResourceTable>,
}

impl ResourceManager {
    /// Create a new empty resource manager
    pub fn new() -> Self {
        let id = NEXT_MANAGER_ID.fetch_add(1, Ordering::Relaxed);
        crate::engine_debug!("cobalt::ResourceManager", "Resource manager {} created", id);
        Self {
            id,
            resources: HandleTable::new(),
            deletion_queue: DeletionQueue::new(),
        }
    }

    // ===== CREATION =====

    /// Construct a resource and take ownership of it
    ///
    /// `ctor` runs first; only a successfully built value is stored and
    /// scheduled for destruction. A failed construction leaves the manager
    /// untouched.
    ///
    /// # Errors
    ///
    /// Whatever `ctor` returns, logged at ERROR.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let device = rm.create_resource(|| VulkanDevice::new(&window, Config::default()))?;
    /// let swapchain = VulkanSwapchain::new(rm.get(device)?, 1280, 720)?;
    /// let swapchain = rm.insert_resource(swapchain);
    /// ```
    pub fn create_resource<T, F>(&mut self, ctor: F) -> Result<Handle<T>>
    where
        T: Resource,
        F: FnOnce() -> Result<T>,
    {
        let value = ctor().map_err(|e| {
            crate::engine_error!(
                "cobalt::ResourceManager",
                "Failed to create {}: {}",
                type_name::<T>(),
                e
            );
            e
        })?;
        Ok(self.insert_resource(value))
    }

    /// Take ownership of an already-built resource
    pub fn insert_resource<T: Resource>(&mut self, value: T) -> Handle<T> {
        let name = value.resource_name();
        let key = self.resources.insert(Box::new(value));

        self.deletion_queue.push(move |resources| {
            if let Some(resource) = resources.erase(key) {
                crate::engine_trace!(
                    "cobalt::ResourceManager",
                    "Destroying {} ({:?})",
                    resource.resource_name(),
                    key
                );
                drop(resource);
            }
        });

        crate::engine_debug!("cobalt::ResourceManager", "Registered {} ({:?})", name, key);

        Handle::new(self.id, key)
    }

    /// Schedule an arbitrary cleanup action on the deletion queue
    ///
    /// It runs in LIFO order with the resource destructions: after every
    /// resource registered later, before every resource registered earlier.
    pub fn defer<F>(&mut self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.deletion_queue.push(move |_| action());
    }

    // ===== ACCESS =====

    /// Borrow the resource behind `handle`
    ///
    /// # Errors
    ///
    /// - `Error::StaleHandle` if the resource was destroyed or the handle
    ///   was issued by another manager
    /// - `Error::InvalidResource` if the slot holds another type
    pub fn get<T: Resource>(&self, handle: Handle<T>) -> Result<&T> {
        self.check_issuer(handle)?;
        let resource: &dyn Resource = &**self.resources.resolve(handle.key())?;
        let name = resource.resource_name();
        resource
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| Self::type_mismatch::<T>(handle, name))
    }

    /// Mutably borrow the resource behind `handle`
    pub fn get_mut<T: Resource>(&mut self, handle: Handle<T>) -> Result<&mut T> {
        self.check_issuer(handle)?;
        let resource: &mut dyn Resource = &mut **self.resources.resolve_mut(handle.key())?;
        let name = resource.resource_name();
        resource
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or_else(|| Self::type_mismatch::<T>(handle, name))
    }

    /// Whether `handle` still refers to a live resource
    pub fn contains<T>(&self, handle: Handle<T>) -> bool {
        handle.manager_id() == self.id && self.resources.contains(handle.key())
    }

    /// Process-unique id stamped into every handle this manager issues
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of live resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Number of actions waiting on the deletion queue
    pub fn pending_deletions(&self) -> usize {
        self.deletion_queue.len()
    }

    // ===== TEARDOWN =====

    /// Destroy everything in reverse creation order
    ///
    /// The manager is empty and reusable afterwards. Outstanding handles are
    /// stale. Returns the number of deferred actions run.
    pub fn reset(&mut self) -> usize {
        let count = self.deletion_queue.flush(&mut self.resources);
        debug_assert!(self.resources.is_empty(), "resource registered without a deletion action");
        if count > 0 {
            crate::engine_debug!("cobalt::ResourceManager", "Flushed {} deferred actions", count);
        }
        count
    }

    fn check_issuer<T>(&self, handle: Handle<T>) -> Result<()> {
        if handle.manager_id() == self.id {
            return Ok(());
        }
        crate::engine_warn!(
            "cobalt::ResourceManager",
            "{:?} was issued by manager {}, not {}",
            handle,
            handle.manager_id(),
            self.id
        );
        Err(Error::StaleHandle(format!(
            "{:?} belongs to resource manager {}, not {}",
            handle.key(),
            handle.manager_id(),
            self.id
        )))
    }

    fn type_mismatch<T>(handle: Handle<T>, actual: &str) -> Error {
        crate::engine_warn!(
            "cobalt::ResourceManager",
            "{:?} refers to {}, not {}",
            handle,
            actual,
            type_name::<T>()
        );
        Error::InvalidResource(format!(
            "{:?} refers to {}, not {}",
            handle.key(),
            actual,
            type_name::<T>()
        ))
    }
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ResourceManager {
    fn drop(&mut self) {
        self.reset();
    }
}

#[cfg(test)]
#[path = "resource_manager_tests.rs"]
mod tests;
