use std::hash::Hash;

use crate::error::LoadError;

/// A loader that can turn a type name into a resolved type.
///
/// The registry only ever holds loaders weakly, so implementors are free to
/// own large structures (a whole class hierarchy) without the registry
/// keeping them alive.
pub trait TypeLoader: Send + Sync {
    type Type: Clone + Eq + Hash + Send;

    /// Name used in resolution failures.
    fn loader_name(&self) -> &str;

    fn load_type(&self, name: &str) -> Result<Self::Type, LoadError>;
}
