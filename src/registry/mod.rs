//! Weakly held loader registry.
//!
//! The compiler resolves type names against every loader it has seen so far.
//! Loaders come and go with the host application, so the registry must never
//! keep one alive, and it is read far more often than it is written (a
//! resolve per name versus an add per newly seen loader). [`WeakLoaderSet`]
//! therefore publishes immutable snapshots: resolves scan a snapshot without
//! blocking writers, and an add publishes a copy with one more entry.

pub mod type_loader;
pub mod weak_entry;
pub mod weak_loader_set;

pub use type_loader::TypeLoader;
pub use weak_entry::WeakEntry;
pub use weak_loader_set::{Snapshot, WeakLoaderSet};

#[cfg(test)]
mod weak_loader_set_test;
