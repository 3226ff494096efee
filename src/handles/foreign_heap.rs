use crate::handles::foreign_handle::{ForeignHandle, HostRef};

/// The host side of the handle protocol.
///
/// Implementations pin a host object when a handle is created and unpin it on
/// release. Compilation contexts never mint handles themselves: they ask the
/// heap for one and remember that they own it.
pub trait ForeignHeap: Send + Sync {
    /// Whether the host can track handles at all.
    ///
    /// When this returns `false` the context manager hands out no contexts and
    /// callers run unscoped.
    fn supports_handle_tracking(&self) -> bool {
        true
    }

    /// Pins `object` and returns a handle to it.
    fn create_handle(&self, object: HostRef) -> ForeignHandle;

    /// Unpins the object behind `handle`.
    ///
    /// Called exactly once per handle by the owning context.
    fn release(&self, handle: ForeignHandle);
}
