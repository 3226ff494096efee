use std::{collections::HashSet, sync::Arc};

use parking_lot::RwLock;
#[cfg(feature = "parallel-resolve")]
use rayon::prelude::*;

use crate::{
    config::{DEFAULT_PARALLEL_RESOLVE_THRESHOLD, ScopeConfig},
    error::ResolutionFailure,
    registry::{type_loader::TypeLoader, weak_entry::WeakEntry},
};

/// Immutable point-in-time view of a [`WeakLoaderSet`].
///
/// Later `add` calls publish a new version; an existing snapshot never
/// changes.
pub struct Snapshot<L: ?Sized> {
    entries: Arc<Vec<WeakEntry<L>>>,
}

impl<L: ?Sized> Snapshot<L> {
    /// Number of entries, dead ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WeakEntry<L>> {
        self.entries.iter()
    }

    pub fn contains(&self, loader: &Arc<L>) -> bool {
        self.entries.iter().any(|entry| entry.refers_to(loader))
    }

    pub fn live_count(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.is_dead()).count()
    }
}

impl<L: ?Sized> Clone for Snapshot<L> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

/// Concurrent copy-on-write set of weakly held loaders.
///
/// Readers clone the published `Arc` and scan it without holding any lock.
/// Writers copy the current version, extend it and publish the copy only if
/// no other writer got there first, retrying otherwise. Loaders are never kept
/// alive by the set; entries whose loader has been dropped are skipped during
/// [`resolve`](Self::resolve) and pruned from the next published version.
pub struct WeakLoaderSet<L: TypeLoader + ?Sized> {
    current: RwLock<Arc<Vec<WeakEntry<L>>>>,
    #[cfg_attr(not(feature = "parallel-resolve"), allow(dead_code))]
    parallel_threshold: usize,
}

impl<L: TypeLoader + ?Sized> Default for WeakLoaderSet<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: TypeLoader + ?Sized> WeakLoaderSet<L> {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Vec::new())),
            parallel_threshold: DEFAULT_PARALLEL_RESOLVE_THRESHOLD,
        }
    }

    pub fn with_config(config: &ScopeConfig) -> Self {
        let mut set = Self::new();
        set.parallel_threshold = config.parallel_resolve_threshold;
        set
    }

    /// Creates a set seeded with `loaders`, skipping duplicates.
    pub fn with_loaders<'a, I>(loaders: I) -> Self
    where
        I: IntoIterator<Item = &'a Arc<L>>,
        L: 'a,
    {
        let mut entries: Vec<WeakEntry<L>> = Vec::new();
        for loader in loaders {
            if !entries.iter().any(|entry| entry.refers_to(loader)) {
                entries.push(WeakEntry::new(loader));
            }
        }

        let set = Self::new();
        *set.current.write() = Arc::new(entries);
        set
    }

    /// Registers `loader` unless a live entry already wraps it.
    ///
    /// Returns whether a new entry was published.
    pub fn add(&self, loader: &Arc<L>) -> bool {
        loop {
            let current = self.load();
            if current.iter().any(|entry| entry.refers_to(loader)) {
                return false;
            }

            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(WeakEntry::new(loader));

            if self.publish(&current, next) {
                log::debug!(
                    "registered loader `{}` ({} entries)",
                    loader.loader_name(),
                    current.len() + 1
                );
                return true;
            }
        }
    }

    /// Resolves `name` against every live loader in the current snapshot.
    ///
    /// Loaders that fail contribute a [`ResolutionFailure`] to `failures`;
    /// the name may still resolve through another loader. Returns every type
    /// that was produced, which may be empty.
    pub fn resolve(&self, name: &str, failures: &mut Vec<ResolutionFailure>) -> HashSet<L::Type> {
        let snapshot = self.load();
        let live: Vec<Arc<L>> = snapshot.iter().filter_map(WeakEntry::get).collect();
        let dead = snapshot.len() - live.len();

        let mut resolved = HashSet::new();
        for outcome in self.load_all(&live, name) {
            match outcome {
                Ok(ty) => {
                    resolved.insert(ty);
                }
                Err(failure) => failures.push(failure),
            }
        }

        if dead > 0 {
            self.prune(&snapshot);
        }

        resolved
    }

    /// Returns the currently published version.
    pub fn snapshot(&self) -> Snapshot<L> {
        Snapshot {
            entries: self.load(),
        }
    }

    pub fn contains(&self, loader: &Arc<L>) -> bool {
        self.load().iter().any(|entry| entry.refers_to(loader))
    }

    /// Number of entries in the current version, dead ones included.
    pub fn len(&self) -> usize {
        self.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.load().is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.load().iter().filter(|entry| !entry.is_dead()).count()
    }

    fn load(&self) -> Arc<Vec<WeakEntry<L>>> {
        self.current.read().clone()
    }

    /// Swaps in `next` if `expected` is still the published version.
    fn publish(&self, expected: &Arc<Vec<WeakEntry<L>>>, next: Vec<WeakEntry<L>>) -> bool {
        let mut current = self.current.write();
        if !Arc::ptr_eq(&*current, expected) {
            return false;
        }
        *current = Arc::new(next);
        true
    }

    /// Drops dead entries from `scanned` if nobody published since the scan.
    ///
    /// A lost race leaves the dead entries for the next scan.
    fn prune(&self, scanned: &Arc<Vec<WeakEntry<L>>>) {
        let next: Vec<WeakEntry<L>> = scanned
            .iter()
            .filter(|entry| !entry.is_dead())
            .cloned()
            .collect();
        let removed = scanned.len() - next.len();

        if self.publish(scanned, next) {
            log::warn!("pruned {} dead loader entries", removed);
        }
    }

    fn load_all(&self, live: &[Arc<L>], name: &str) -> Vec<Result<L::Type, ResolutionFailure>> {
        #[cfg(feature = "parallel-resolve")]
        if live.len() >= self.parallel_threshold {
            return live
                .par_iter()
                .map(|loader| load_one(loader.as_ref(), name))
                .collect();
        }

        live.iter()
            .map(|loader| load_one(loader.as_ref(), name))
            .collect()
    }
}

fn load_one<L: TypeLoader + ?Sized>(loader: &L, name: &str) -> Result<L::Type, ResolutionFailure> {
    loader.load_type(name).map_err(|error| {
        log::trace!("loader `{}` failed on `{}`: {}", loader.loader_name(), name, error);
        ResolutionFailure {
            loader: loader.loader_name().to_string(),
            error,
        }
    })
}

impl<L: TypeLoader + ?Sized> std::fmt::Debug for WeakLoaderSet<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let current = self.load();
        f.debug_struct("WeakLoaderSet")
            .field("entries", &current.len())
            .field("live", &current.iter().filter(|e| !e.is_dead()).count())
            .finish()
    }
}
