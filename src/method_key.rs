use std::{
    collections::HashMap,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

/// Map key identifying a method within one compilation.
///
/// The identity hash comes from the host's method object, which is only stable
/// while that compilation runs; keys must not be carried across compilations.
/// Equality compares the hash first and only then the three names.
#[derive(Debug, Clone)]
pub struct MethodKey {
    declaring_type: Arc<str>,
    name: Arc<str>,
    descriptor: Arc<str>,
    identity_hash: u32,
}

impl MethodKey {
    pub fn new(
        declaring_type: impl Into<Arc<str>>,
        name: impl Into<Arc<str>>,
        descriptor: impl Into<Arc<str>>,
        identity_hash: u32,
    ) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
            descriptor: descriptor.into(),
            identity_hash,
        }
    }

    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn identity_hash(&self) -> u32 {
        self.identity_hash
    }
}

impl PartialEq for MethodKey {
    fn eq(&self, other: &Self) -> bool {
        self.identity_hash == other.identity_hash
            && self.name == other.name
            && self.descriptor == other.descriptor
            && self.declaring_type == other.declaring_type
    }
}

impl Eq for MethodKey {}

impl Hash for MethodKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.identity_hash);
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.declaring_type, self.name, self.descriptor)
    }
}

/// Per-compilation table keyed by [`MethodKey`].
///
/// Dropped (or cleared) with the compilation that filled it.
#[derive(Debug)]
pub struct MethodKeyTable<V> {
    entries: HashMap<MethodKey, V>,
}

impl<V> Default for MethodKeyTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MethodKeyTable<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, key: &MethodKey) -> Option<&V> {
        self.entries.get(key)
    }

    /// Returns the value for `key`, computing it on first lookup.
    pub fn get_or_insert_with<F>(&mut self, key: MethodKey, compute: F) -> &mut V
    where
        F: FnOnce(&MethodKey) -> V,
    {
        self.entries.entry(key).or_insert_with_key(compute)
    }

    pub fn insert(&mut self, key: MethodKey, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &MethodKey> {
        self.entries.keys()
    }
}
