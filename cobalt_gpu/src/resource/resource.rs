/// Resource trait - anything owned by the ResourceManager

use std::any::Any;

/// Upcast to `Any` for downcasting trait objects
///
/// Implemented for every `'static` type. Call it through a trait object
/// (`&dyn Resource`, `&dyn Fence`, ...), never on a `Box`, or the box itself
/// is what gets upcast.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A value owned by the [`ResourceManager`](crate::cobalt::ResourceManager)
///
/// Destruction is `Drop`, run by the manager's deletion queue once the
/// resource's slot is erased. Implementors release their native objects in
/// `Drop`.
pub trait Resource: AsAny + Send {
    /// Name used in log messages
    fn resource_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
