/// LIFO queue of deferred cleanup actions

/// One deferred action, given mutable access to the context `C`
pub type DeferredAction<C> = Box<dyn FnOnce(&mut C) + Send>;

/// Stack of cleanup actions run newest-first
///
/// Resources are pushed in dependency order (device before swapchain before
/// command pool), so running the stack backwards destroys dependents before
/// what they depend on.
///
/// # Example
///
/// ```
/// use cobalt_gpu::cobalt::DeletionQueue;
///
/// let mut queue: DeletionQueue<Vec<&str>> = DeletionQueue::new();
/// queue.push(|log| log.push("device"));
/// queue.push(|log| log.push("swapchain"));
///
/// let mut log = Vec::new();
/// assert_eq!(queue.flush(&mut log), 2);
/// assert_eq!(log, ["swapchain", "device"]);
/// ```
pub struct DeletionQueue<C = ()> {
    actions: Vec<DeferredAction<C>>,
}

impl<C> DeletionQueue<C> {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// Register an action to run at the next flush
    pub fn push<F>(&mut self, action: F)
    where
        F: FnOnce(&mut C) + Send + 'static,
    {
        self.actions.push(Box::new(action));
    }

    /// Run every pending action in reverse registration order
    ///
    /// Returns the number of actions run.
    pub fn flush(&mut self, context: &mut C) -> usize {
        let mut count = 0;
        while let Some(action) = self.actions.pop() {
            action(context);
            count += 1;
        }
        count
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl DeletionQueue<()> {
    /// Flush a queue that needs no context
    pub fn flush_all(&mut self) -> usize {
        self.flush(&mut ())
    }
}

impl<C> Default for DeletionQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Drop for DeletionQueue<C> {
    fn drop(&mut self) {
        if !self.actions.is_empty() {
            crate::engine_warn!(
                "cobalt::DeletionQueue",
                "Dropped with {} pending actions; they will not run",
                self.actions.len()
            );
        }
    }
}

#[cfg(test)]
#[path = "deletion_queue_tests.rs"]
mod tests;
