use std::{fmt, sync::Arc};

use crate::{
    context::{global_scope::GlobalScope, manager::ManagerShared},
    handles::{ForeignHandle, HostRef},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKind {
    /// Scoped to one compilation; releases its handles on close.
    Local,
    /// Shared, reference-counted scope for handles that must outlive a
    /// compilation (cached snippets and the like).
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextState {
    Open,
    /// Terminal.
    Closed,
}

enum Ownership {
    Local(Vec<ForeignHandle>),
    Global(Arc<GlobalScope>),
}

/// Scope that owns the foreign handles created through it.
///
/// Obtained from [`ContextManager::open_local`] or
/// [`ContextManager::enter_global`]. Dropping the context closes it, so every
/// exit path (including unwinding) releases what it owns. Closing is
/// idempotent.
///
/// A context that is never closed, e.g. passed to [`std::mem::forget`], keeps
/// its host objects pinned for the rest of the process. Nothing detects this;
/// [`ContextManager::stats`] shows the resulting gap between created and
/// released handles.
///
/// Creating or adopting handles through a closed context is a contract
/// violation and panics.
///
/// [`ContextManager::open_local`]: crate::context::ContextManager::open_local
/// [`ContextManager::enter_global`]: crate::context::ContextManager::enter_global
/// [`ContextManager::stats`]: crate::context::ContextManager::stats
pub struct CompilationContext {
    id: u64,
    description: Arc<str>,
    state: ContextState,
    ownership: Ownership,
    shared: Arc<ManagerShared>,
}

impl CompilationContext {
    pub(crate) fn local(id: u64, description: Arc<str>, shared: Arc<ManagerShared>) -> Self {
        Self {
            id,
            description,
            state: ContextState::Open,
            ownership: Ownership::Local(Vec::new()),
            shared,
        }
    }

    pub(crate) fn global(
        id: u64,
        description: Arc<str>,
        scope: Arc<GlobalScope>,
        shared: Arc<ManagerShared>,
    ) -> Self {
        Self {
            id,
            description,
            state: ContextState::Open,
            ownership: Ownership::Global(scope),
            shared,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> ContextKind {
        match self.ownership {
            Ownership::Local(_) => ContextKind::Local,
            Ownership::Global(_) => ContextKind::Global,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ContextState::Open
    }

    /// Number of handles currently owned by this scope.
    ///
    /// For a global context this counts the handles of the shared scope, not
    /// just the ones created through this guard.
    /// Handles owned through this context; zero once it is closed.
    pub fn owned_count(&self) -> usize {
        if self.state == ContextState::Closed {
            return 0;
        }
        match &self.ownership {
            Ownership::Local(handles) => handles.len(),
            Ownership::Global(scope) => scope.owned_count(),
        }
    }

    /// A closed guard owns nothing, even while the global scope it exited
    /// is still held by an outer guard.
    pub fn owns(&self, handle: ForeignHandle) -> bool {
        if self.state == ContextState::Closed {
            return false;
        }
        match &self.ownership {
            Ownership::Local(handles) => handles.contains(&handle),
            Ownership::Global(scope) => scope.owns(handle),
        }
    }

    /// Pins `object` in the host heap and takes ownership of the handle.
    pub fn create_handle(&mut self, object: HostRef) -> ForeignHandle {
        self.assert_open("create a handle");
        let handle = self.shared.heap.create_handle(object);
        if self.shared.config.log_handle_traffic {
            log::trace!("context {} pinned {} as {}", self.id, object, handle);
        }
        self.take_ownership(handle);
        handle
    }

    /// Takes ownership of a handle minted elsewhere against this scope.
    pub fn adopt(&mut self, handle: ForeignHandle) {
        self.assert_open("adopt a handle");
        if self.shared.config.log_handle_traffic {
            log::trace!("context {} adopted {}", self.id, handle);
        }
        self.take_ownership(handle);
    }

    /// Releases the owned handles and marks the context closed.
    ///
    /// A global context only releases once the last enter has been closed.
    /// Calling this again is a no-op.
    pub fn close(&mut self) {
        if self.state == ContextState::Closed {
            return;
        }
        self.state = ContextState::Closed;

        match &mut self.ownership {
            Ownership::Local(handles) => {
                let handles = std::mem::take(handles);
                log::debug!(
                    "closing local context {} ({}): releasing {} handles",
                    self.id,
                    self.description,
                    handles.len()
                );
                release_all(&self.shared, self.id, handles);
                self.shared.stats.record_context_closed();
            }
            Ownership::Global(scope) => {
                let depth = scope.exit();
                self.shared.stats.record_global_exit();
                log::debug!("exited global context (depth {})", depth);
                if depth == 0 {
                    let handles = scope.take_if_idle();
                    if !handles.is_empty() {
                        log::debug!("releasing {} global handles", handles.len());
                    }
                    release_all(&self.shared, self.id, handles);
                }
            }
        }
    }

    fn take_ownership(&mut self, handle: ForeignHandle) {
        match &mut self.ownership {
            Ownership::Local(handles) => handles.push(handle),
            Ownership::Global(scope) => scope.adopt(handle),
        }
        self.shared.stats.record_handle_created();
    }

    fn assert_open(&self, operation: &str) {
        assert!(
            self.state == ContextState::Open,
            "cannot {} through closed compilation context {} ({})",
            operation,
            self.id,
            self.description
        );
    }
}

fn release_all(shared: &ManagerShared, context_id: u64, handles: Vec<ForeignHandle>) {
    let count = handles.len();
    for handle in handles {
        if shared.config.log_handle_traffic {
            log::trace!("context {} released {}", context_id, handle);
        }
        shared.heap.release(handle);
    }
    shared.stats.record_handles_released(count);
}

impl Drop for CompilationContext {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for CompilationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilationContext")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("description", &self.description)
            .field("state", &self.state)
            .field("owned", &self.owned_count())
            .finish()
    }
}
