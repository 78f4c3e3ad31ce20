/// Typed, non-owning reference to a ResourceManager entry

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use super::SlotKey;

/// Copyable identity of a resource of type `T`
///
/// A handle never keeps its resource alive. Resolve it through the
/// manager that issued it; once the resource is destroyed, or when it is
/// presented to any other manager, the handle resolves to
/// `Error::StaleHandle`.
pub struct Handle<T> {
    manager: u64,
    key: SlotKey,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) fn new(manager: u64, key: SlotKey) -> Self {
        Self {
            manager,
            key,
            _marker: PhantomData,
        }
    }

    /// Id of the ResourceManager that issued this handle
    pub fn manager_id(&self) -> u64 {
        self.manager
    }

    /// Untyped slot key
    pub fn key(&self) -> SlotKey {
        self.key
    }
}

// Manual impls: derives would require T: Clone/Eq/...

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.manager == other.manager && self.key == other.key
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.manager.hash(state);
        self.key.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = std::any::type_name::<T>();
        let short = name.rsplit("::").next().unwrap_or(name);
        write!(f, "Handle<{}>(manager {}, {:?})", short, self.manager, self.key)
    }
}
