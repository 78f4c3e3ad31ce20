/// Generation-checked storage behind every Handle

use slotmap::{new_key_type, SlotMap};
use crate::error::{Error, Result};

new_key_type! {
    /// Slot index + generation identifying one HandleTable entry
    pub struct SlotKey;
}

/// Slot map from [`SlotKey`] to an owned value
///
/// Erasing an entry bumps its slot's generation, so every key issued for the
/// previous occupant stops resolving, even after the index is reused.
pub struct HandleTable<V> {
    slots: SlotMap<SlotKey, V>,
}

impl<V> HandleTable<V> {
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
        }
    }

    /// Store a value and return its key
    pub fn insert(&mut self, value: V) -> SlotKey {
        self.slots.insert(value)
    }

    /// Remove and return the value, or `None` if the key is stale
    pub fn erase(&mut self, key: SlotKey) -> Option<V> {
        self.slots.remove(key)
    }

    /// Borrow the value behind `key`
    ///
    /// # Errors
    ///
    /// `Error::StaleHandle` if the slot was erased (or reused since).
    pub fn resolve(&self, key: SlotKey) -> Result<&V> {
        self.slots.get(key).ok_or_else(|| Self::stale(key))
    }

    /// Mutably borrow the value behind `key`
    pub fn resolve_mut(&mut self, key: SlotKey) -> Result<&mut V> {
        self.slots.get_mut(key).ok_or_else(|| Self::stale(key))
    }

    pub fn contains(&self, key: SlotKey) -> bool {
        self.slots.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn stale(key: SlotKey) -> Error {
        crate::engine_warn!("cobalt::HandleTable", "Stale handle {:?}", key);
        Error::StaleHandle(format!("{:?}", key))
    }
}

impl<V> Default for HandleTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "handle_table_tests.rs"]
mod tests;
