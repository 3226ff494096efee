use std::{
    hash::{Hash, Hasher},
    sync::{Arc, Weak},
};

/// Non-owning, identity-based reference to a loader.
///
/// Two live entries are equal when they point at the same allocation. All dead
/// entries are equal to one another and never equal to a live one. The hash
/// follows the same rule: the referent's address while live, zero once dead.
pub struct WeakEntry<L: ?Sized> {
    referent: Weak<L>,
}

impl<L: ?Sized> WeakEntry<L> {
    pub fn new(loader: &Arc<L>) -> Self {
        Self {
            referent: Arc::downgrade(loader),
        }
    }

    /// Upgrades to a strong reference if the loader is still alive.
    pub fn get(&self) -> Option<Arc<L>> {
        self.referent.upgrade()
    }

    pub fn is_dead(&self) -> bool {
        self.referent.strong_count() == 0
    }

    /// Returns `true` if this entry is live and wraps `loader`.
    pub fn refers_to(&self, loader: &Arc<L>) -> bool {
        !self.is_dead() && std::ptr::addr_eq(self.referent.as_ptr(), Arc::as_ptr(loader))
    }

    fn identity(&self) -> Option<*const ()> {
        self.get().map(|strong| Arc::as_ptr(&strong) as *const ())
    }
}

impl<L: ?Sized> Clone for WeakEntry<L> {
    fn clone(&self) -> Self {
        Self {
            referent: Weak::clone(&self.referent),
        }
    }
}

impl<L: ?Sized> PartialEq for WeakEntry<L> {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl<L: ?Sized> Eq for WeakEntry<L> {}

impl<L: ?Sized> Hash for WeakEntry<L> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().map_or(0, |ptr| ptr as usize).hash(state);
    }
}

impl<L: ?Sized> std::fmt::Debug for WeakEntry<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.identity() {
            Some(ptr) => write!(f, "WeakEntry({:p})", ptr),
            None => f.write_str("WeakEntry(<dead>)"),
        }
    }
}
