pub mod config;
pub mod context;
pub mod error;
pub mod handles;
pub mod leak_detector;
pub mod method_key;
pub mod registry;

pub use config::ScopeConfig;
pub use context::{CompilationContext, ContextKind, ContextManager, ContextState};
pub use error::{HostRefError, LoadError, ResolutionFailure};
pub use handles::{ForeignHandle, ForeignHeap, HandleTable, HostRef};
pub use method_key::{MethodKey, MethodKeyTable};
pub use registry::{TypeLoader, WeakLoaderSet};
