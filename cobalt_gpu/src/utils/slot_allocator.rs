/// Hands out and recycles `u32` slot indices.
///
/// Command pools use it to give every command buffer a stable index inside
/// the pool. Released indices are reused LIFO. Releasing an index that is not
/// live is reported instead of corrupting the free list.
///
/// # Example
///
/// ```
/// use cobalt_gpu::utils::SlotAllocator;
///
/// let mut slots = SlotAllocator::new();
/// let a = slots.alloc();       // 0
/// let _b = slots.alloc();      // 1
/// assert!(slots.free(a));
/// assert_eq!(slots.alloc(), 0); // recycled
/// assert!(!slots.free(7));      // never handed out
/// ```
pub struct SlotAllocator {
    free_list: Vec<u32>,
    live: Vec<bool>,
    len: u32,
}

impl SlotAllocator {
    pub fn new() -> Self {
        Self {
            free_list: Vec::new(),
            live: Vec::new(),
            len: 0,
        }
    }

    /// Take the most recently released index, or a fresh one
    pub fn alloc(&mut self) -> u32 {
        let id = match self.free_list.pop() {
            Some(id) => id,
            None => {
                self.live.push(false);
                (self.live.len() - 1) as u32
            }
        };
        self.live[id as usize] = true;
        self.len += 1;
        id
    }

    /// Return an index to the pool
    ///
    /// Returns `false` (and changes nothing) if `id` is not currently allocated.
    pub fn free(&mut self, id: u32) -> bool {
        match self.live.get_mut(id as usize) {
            Some(slot) if *slot => {
                *slot = false;
                self.len -= 1;
                self.free_list.push(id);
                true
            }
            _ => false,
        }
    }

    /// Whether `id` is currently allocated
    pub fn is_live(&self, id: u32) -> bool {
        self.live.get(id as usize).copied().unwrap_or(false)
    }

    /// Highest index ever allocated + 1
    pub fn high_water_mark(&self) -> u32 {
        self.live.len() as u32
    }

    /// Number of currently allocated slots
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for SlotAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "slot_allocator_tests.rs"]
mod tests;
