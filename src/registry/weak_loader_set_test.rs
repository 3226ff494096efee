use std::{
    collections::HashSet,
    hash::{DefaultHasher, Hash, Hasher},
    sync::Arc,
};

use crate::{
    config::ScopeConfig,
    error::{LoadError, ResolutionFailure},
};

use super::{TypeLoader, WeakEntry, WeakLoaderSet};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LoadedType {
    loader: String,
    name: String,
}

struct MapLoader {
    name: String,
    known: HashSet<String>,
}

impl MapLoader {
    fn new(name: &str, known: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            known: known.iter().map(|n| n.to_string()).collect(),
        })
    }
}

impl TypeLoader for MapLoader {
    type Type = LoadedType;

    fn loader_name(&self) -> &str {
        &self.name
    }

    fn load_type(&self, name: &str) -> Result<LoadedType, LoadError> {
        if self.known.contains(name) {
            Ok(LoadedType {
                loader: self.name.clone(),
                name: name.to_string(),
            })
        } else {
            Err(LoadError::not_found(name))
        }
    }
}

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn add_then_resolve_finds_type() {
    let set = WeakLoaderSet::new();
    let loader = MapLoader::new("app", &["com.example.Foo"]);
    assert!(set.add(&loader));

    let mut failures = Vec::new();
    let resolved = set.resolve("com.example.Foo", &mut failures);

    let expected: HashSet<_> = [LoadedType {
        loader: "app".to_string(),
        name: "com.example.Foo".to_string(),
    }]
    .into_iter()
    .collect();
    assert_eq!(resolved, expected);
    assert!(failures.is_empty());
}

#[test]
fn missing_type_reports_one_failure_per_loader() {
    let set = WeakLoaderSet::new();
    let loader = MapLoader::new("app", &["com.example.Foo"]);
    set.add(&loader);

    let mut failures = Vec::new();
    let resolved = set.resolve("com.example.Missing", &mut failures);

    assert!(resolved.is_empty());
    assert_eq!(
        failures,
        vec![ResolutionFailure {
            loader: "app".to_string(),
            error: LoadError::not_found("com.example.Missing"),
        }]
    );
}

#[test]
fn partial_failure_still_returns_successes() {
    let set = WeakLoaderSet::new();
    let boot = MapLoader::new("boot", &["java.lang.Object"]);
    let app = MapLoader::new("app", &["com.example.Foo"]);
    set.add(&boot);
    set.add(&app);

    let mut failures = Vec::new();
    let resolved = set.resolve("com.example.Foo", &mut failures);

    assert_eq!(resolved.len(), 1);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].loader, "boot");
}

#[test]
fn adding_same_loader_twice_is_rejected() {
    let set = WeakLoaderSet::new();
    let loader = MapLoader::new("app", &[]);
    assert!(set.add(&loader));
    assert!(!set.add(&loader));
    assert!(!set.add(&Arc::clone(&loader)));
    assert_eq!(set.len(), 1);
}

#[test]
fn distinct_loaders_with_same_name_are_distinct_entries() {
    let set = WeakLoaderSet::new();
    assert!(set.add(&MapLoader::new("app", &[])));
    let second = MapLoader::new("app", &[]);
    assert!(set.add(&second));
    assert!(set.contains(&second));
}

#[test]
fn set_does_not_keep_loaders_alive() {
    let set = WeakLoaderSet::new();
    let loader = MapLoader::new("plugin", &["com.example.Foo"]);
    let weak = Arc::downgrade(&loader);
    set.add(&loader);

    drop(loader);
    assert!(weak.upgrade().is_none());
    assert_eq!(set.live_count(), 0);
}

#[test]
fn dead_entries_are_skipped_and_pruned() {
    let set = WeakLoaderSet::new();
    let keep = MapLoader::new("keep", &["com.example.Foo"]);
    let gone = MapLoader::new("gone", &["com.example.Foo"]);
    set.add(&keep);
    set.add(&gone);
    drop(gone);

    assert_eq!(set.len(), 2);

    let mut failures = Vec::new();
    let resolved = set.resolve("com.example.Foo", &mut failures);

    assert_eq!(resolved.len(), 1);
    assert!(resolved.iter().all(|ty| ty.loader == "keep"));
    assert!(failures.is_empty());
    assert_eq!(set.len(), 1, "dead entry is pruned after the scan");
}

#[test]
fn snapshot_does_not_observe_later_adds() {
    let set = WeakLoaderSet::new();
    let first = MapLoader::new("first", &[]);
    set.add(&first);

    let before = set.snapshot();
    let second = MapLoader::new("second", &[]);
    set.add(&second);

    assert_eq!(before.len(), 1);
    assert!(before.contains(&first));
    assert!(!before.contains(&second));
    assert!(set.snapshot().contains(&second));
}

#[test]
fn snapshot_survives_pruning() {
    let set = WeakLoaderSet::new();
    let gone = MapLoader::new("gone", &[]);
    set.add(&gone);
    let before = set.snapshot();
    drop(gone);

    set.resolve("anything", &mut Vec::new());

    assert_eq!(before.len(), 1);
    assert_eq!(before.live_count(), 0);
    assert!(set.is_empty());
}

#[test]
fn seeded_set_skips_duplicates() {
    let a = MapLoader::new("a", &[]);
    let b = MapLoader::new("b", &[]);
    let set = WeakLoaderSet::with_loaders([&a, &b, &a]);
    assert_eq!(set.len(), 2);
    assert!(set.contains(&a) && set.contains(&b));
}

#[test]
fn parallel_resolve_matches_sequential() {
    let loaders: Vec<_> = (0..16)
        .map(|i| {
            let known: &[&str] = if i % 2 == 0 { &["com.example.Even"] } else { &[] };
            MapLoader::new(&format!("loader-{i}"), known)
        })
        .collect();

    let parallel = WeakLoaderSet::with_config(&ScopeConfig {
        parallel_resolve_threshold: 0,
        ..ScopeConfig::default()
    });
    let sequential = WeakLoaderSet::with_config(&ScopeConfig {
        parallel_resolve_threshold: usize::MAX,
        ..ScopeConfig::default()
    });
    for loader in &loaders {
        parallel.add(loader);
        sequential.add(loader);
    }

    let mut parallel_failures = Vec::new();
    let mut sequential_failures = Vec::new();
    let a = parallel.resolve("com.example.Even", &mut parallel_failures);
    let b = sequential.resolve("com.example.Even", &mut sequential_failures);

    assert_eq!(a, b);
    assert_eq!(a.len(), 8);
    assert_eq!(parallel_failures, sequential_failures);
}

#[test]
fn concurrent_adds_register_every_loader_once() {
    let set = Arc::new(WeakLoaderSet::<MapLoader>::new());
    let loaders: Vec<_> = (0..64)
        .map(|i| MapLoader::new(&format!("l{i}"), &[]))
        .collect();
    let loaders = Arc::new(loaders);

    let threads: Vec<_> = (0..4)
        .map(|_| {
            let set = Arc::clone(&set);
            let loaders = Arc::clone(&loaders);
            std::thread::spawn(move || loaders.iter().filter(|l| set.add(l)).count())
        })
        .collect();
    let added: usize = threads.into_iter().map(|t| t.join().unwrap()).sum();

    assert_eq!(added, 64);
    assert_eq!(set.len(), 64);
}

#[test]
fn pruning_races_with_concurrent_adds() {
    let seeded: Vec<_> = (0..16)
        .map(|i| MapLoader::new(&format!("seed-{i}"), &["com.example.Foo"]))
        .collect();
    let set = WeakLoaderSet::with_loaders(&seeded);
    drop(seeded);

    let kept: Vec<Vec<_>> = (0..4)
        .map(|t| {
            (0..32)
                .map(|i| MapLoader::new(&format!("kept-{t}-{i}"), &["com.example.Foo"]))
                .collect()
        })
        .collect();

    std::thread::scope(|scope| {
        for (t, loaders) in kept.iter().enumerate() {
            let set = &set;
            scope.spawn(move || {
                for (i, loader) in loaders.iter().enumerate() {
                    assert!(set.add(loader));
                    // A loader that dies right away keeps resolvers pruning.
                    let transient = MapLoader::new(&format!("transient-{t}-{i}"), &[]);
                    set.add(&transient);
                }
            });
        }
        for _ in 0..4 {
            let set = &set;
            scope.spawn(move || {
                for _ in 0..64 {
                    set.resolve("com.example.Foo", &mut Vec::new());
                }
            });
        }
    });

    let mut failures = Vec::new();
    let resolved = set.resolve("com.example.Foo", &mut failures);

    for loader in kept.iter().flatten() {
        assert!(set.contains(loader), "pruning dropped `{}`", loader.name);
    }
    assert_eq!(set.len(), set.live_count());
    assert_eq!(set.live_count(), 4 * 32);
    assert_eq!(resolved.len(), 4 * 32);
    assert!(failures.is_empty());
}

#[test]
fn weak_entry_identity_rules() {
    let a = MapLoader::new("a", &[]);
    let b = MapLoader::new("a", &[]);

    let a1 = WeakEntry::new(&a);
    let a2 = WeakEntry::new(&a);
    let b1 = WeakEntry::new(&b);

    assert_eq!(a1, a2);
    assert_eq!(hash_of(&a1), hash_of(&a2));
    assert_ne!(a1, b1);
    assert!(a1.refers_to(&a));
    assert!(!a1.refers_to(&b));

    drop(a);
    drop(b);
    assert!(a1.is_dead());
    assert_eq!(a1, b1, "dead entries compare equal");
    assert_eq!(hash_of(&a1), hash_of(&b1));
    assert!(a1.get().is_none());
}

#[test]
fn live_and_dead_entries_differ() {
    let live = MapLoader::new("live", &[]);
    let dead = WeakEntry::new(&MapLoader::new("dead", &[]));
    assert_ne!(WeakEntry::new(&live), dead);
}
