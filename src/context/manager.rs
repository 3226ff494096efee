use std::sync::{
    Arc, OnceLock,
    atomic::{AtomicU64, Ordering},
};

use crate::{
    config::ScopeConfig,
    context::{compilation_context::CompilationContext, global_scope::GlobalScope},
    error::HostRefError,
    handles::ForeignHeap,
    leak_detector::{ScopeStats, ScopeStatsSnapshot},
};

const GLOBAL_DESCRIPTION: &str = "global";

/// State every context keeps a reference to.
pub(crate) struct ManagerShared {
    pub(crate) heap: Arc<dyn ForeignHeap>,
    pub(crate) stats: ScopeStats,
    pub(crate) config: ScopeConfig,
}

/// Hands out compilation contexts against one host heap.
///
/// The manager owns the global context. It is created lazily by the first
/// [`enter_global`](Self::enter_global) and lives as long as the manager or
/// any guard on it. Construct one manager per host and pass it by reference;
/// [`install_process_manager`] is available for hosts that need a single
/// process-wide instance.
pub struct ContextManager {
    shared: Arc<ManagerShared>,
    global: OnceLock<Arc<GlobalScope>>,
    global_description: Arc<str>,
    next_id: AtomicU64,
}

impl ContextManager {
    pub fn new(heap: Arc<dyn ForeignHeap>) -> Self {
        Self::with_config(heap, ScopeConfig::default())
    }

    pub fn with_config(heap: Arc<dyn ForeignHeap>, config: ScopeConfig) -> Self {
        Self {
            shared: Arc::new(ManagerShared {
                heap,
                stats: ScopeStats::new(),
                config,
            }),
            global: OnceLock::new(),
            global_description: Arc::from(GLOBAL_DESCRIPTION),
            next_id: AtomicU64::new(1),
        }
    }

    /// Whether contexts are handed out at all.
    ///
    /// `false` when the host cannot track handles or tracking is disabled in
    /// the configuration.
    pub fn is_supported(&self) -> bool {
        self.shared.config.handle_tracking && self.shared.heap.supports_handle_tracking()
    }

    /// Enters the global context, creating it on first use.
    ///
    /// Every returned guard counts as one nesting level; the global handles
    /// are released when the last guard closes. Returns `None` when scoping is
    /// unsupported, in which case the caller proceeds unscoped.
    pub fn enter_global(&self) -> Option<CompilationContext> {
        if !self.is_supported() {
            return None;
        }

        let scope = self.global.get_or_init(|| Arc::new(GlobalScope::new()));
        let depth = scope.enter();
        self.shared.stats.record_global_enter();
        log::debug!("entered global context (depth {})", depth);

        Some(CompilationContext::global(
            self.next_id(),
            Arc::clone(&self.global_description),
            Arc::clone(scope),
            Arc::clone(&self.shared),
        ))
    }

    /// Opens a fresh local context labelled with `description`.
    ///
    /// Returns `None` when scoping is unsupported.
    ///
    /// # Panics
    ///
    /// Panics if `description` is empty.
    pub fn open_local(&self, description: &str) -> Option<CompilationContext> {
        assert!(
            !description.is_empty(),
            "local compilation context requires a description"
        );

        if !self.is_supported() {
            return None;
        }

        let id = self.next_id();
        self.shared.stats.record_context_opened();
        log::debug!("opened local context {} ({})", id, description);

        Some(CompilationContext::local(
            id,
            Arc::from(description),
            Arc::clone(&self.shared),
        ))
    }

    /// Current nesting depth of the global context (0 if never entered).
    pub fn global_depth(&self) -> usize {
        self.global.get().map_or(0, |scope| scope.depth())
    }

    /// Handles currently owned by the global context.
    pub fn global_handle_count(&self) -> usize {
        self.global.get().map_or(0, |scope| scope.owned_count())
    }

    pub fn stats(&self) -> ScopeStatsSnapshot {
        self.shared.stats.snapshot()
    }

    pub fn heap(&self) -> &Arc<dyn ForeignHeap> {
        &self.shared.heap
    }

    pub fn config(&self) -> &ScopeConfig {
        &self.shared.config
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl std::fmt::Debug for ContextManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextManager")
            .field("supported", &self.is_supported())
            .field("global_depth", &self.global_depth())
            .field("stats", &self.stats())
            .finish()
    }
}

static PROCESS_MANAGER: OnceLock<ContextManager> = OnceLock::new();

/// Installs `manager` as the process-wide instance.
///
/// The instance lives until process exit. Installing twice is an error and
/// leaves the first instance in place.
pub fn install_process_manager(
    manager: ContextManager,
) -> Result<&'static ContextManager, HostRefError> {
    PROCESS_MANAGER
        .set(manager)
        .map_err(|_| HostRefError::ManagerAlreadyInstalled)?;
    PROCESS_MANAGER
        .get()
        .ok_or(HostRefError::ManagerAlreadyInstalled)
}

/// The process-wide manager, if one was installed.
pub fn process_manager() -> Option<&'static ContextManager> {
    PROCESS_MANAGER.get()
}
