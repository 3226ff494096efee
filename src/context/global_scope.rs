use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::handles::ForeignHandle;

/// Shared state behind every guard returned by `ContextManager::enter_global`.
///
/// The nesting depth is updated lock-free. The release decision is taken
/// under the handle lock and re-reads the depth there, so an enter racing
/// with the last exit keeps its handles.
pub(crate) struct GlobalScope {
    depth: AtomicUsize,
    handles: Mutex<Vec<ForeignHandle>>,
}

impl GlobalScope {
    pub(crate) fn new() -> Self {
        Self {
            depth: AtomicUsize::new(0),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Returns the depth after entering.
    pub(crate) fn enter(&self) -> usize {
        self.depth.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Returns the depth after exiting.
    ///
    /// Panics on an exit without a matching enter.
    pub(crate) fn exit(&self) -> usize {
        let mut current = self.depth.load(Ordering::Acquire);
        loop {
            assert!(current > 0, "global compilation context exited more often than entered");
            match self.depth.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return current - 1,
                Err(actual) => current = actual,
            }
        }
    }

    pub(crate) fn adopt(&self, handle: ForeignHandle) {
        self.handles.lock().push(handle);
    }

    pub(crate) fn owns(&self, handle: ForeignHandle) -> bool {
        self.handles.lock().contains(&handle)
    }

    /// Takes every owned handle if nobody is inside the scope any more.
    pub(crate) fn take_if_idle(&self) -> Vec<ForeignHandle> {
        let mut handles = self.handles.lock();
        if self.depth.load(Ordering::Acquire) == 0 {
            std::mem::take(&mut *handles)
        } else {
            Vec::new()
        }
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth.load(Ordering::Acquire)
    }

    pub(crate) fn owned_count(&self) -> usize {
        self.handles.lock().len()
    }
}
