use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

use crate::error::HostRefError;

/// Point-in-time copy of a manager's context and handle counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ScopeStatsSnapshot {
    pub contexts_opened: usize,
    pub contexts_closed: usize,
    pub global_enters: usize,
    pub global_exits: usize,
    pub handles_created: usize,
    pub handles_released: usize,
}

impl ScopeStatsSnapshot {
    /// Handles created but not yet released.
    ///
    /// Non-zero after every context has closed means a context was leaked.
    pub fn leaked_handles(&self) -> usize {
        self.handles_created.saturating_sub(self.handles_released)
    }

    /// Local contexts plus global enters still waiting for their close.
    pub fn open_contexts(&self) -> usize {
        self.contexts_opened.saturating_sub(self.contexts_closed)
            + self.global_enters.saturating_sub(self.global_exits)
    }

    pub fn to_json(&self) -> Result<String, HostRefError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Relaxed counters; they are diagnostics, not synchronization.
#[derive(Debug, Default)]
pub struct ScopeStats {
    contexts_opened: AtomicUsize,
    contexts_closed: AtomicUsize,
    global_enters: AtomicUsize,
    global_exits: AtomicUsize,
    handles_created: AtomicUsize,
    handles_released: AtomicUsize,
}

impl ScopeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_context_opened(&self) {
        self.contexts_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_context_closed(&self) {
        self.contexts_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_global_enter(&self) {
        self.global_enters.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_global_exit(&self) {
        self.global_exits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_handle_created(&self) {
        self.handles_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_handles_released(&self, count: usize) {
        self.handles_released.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ScopeStatsSnapshot {
        ScopeStatsSnapshot {
            contexts_opened: self.contexts_opened.load(Ordering::Relaxed),
            contexts_closed: self.contexts_closed.load(Ordering::Relaxed),
            global_enters: self.global_enters.load(Ordering::Relaxed),
            global_exits: self.global_exits.load(Ordering::Relaxed),
            handles_created: self.handles_created.load(Ordering::Relaxed),
            handles_released: self.handles_released.load(Ordering::Relaxed),
        }
    }
}
