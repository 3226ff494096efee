//! Compilation contexts and the manager that hands them out.
//!
//! A compilation pins host objects through foreign handles. Each handle is
//! owned by the context it was created through and is released when that
//! context closes:
//!
//! - a **local** context is scoped to one compilation and releases its handles
//!   as soon as it is closed or dropped;
//! - the **global** context is shared and reference counted. Each
//!   `enter_global` adds a nesting level and the handles are only released
//!   when the last level closes.
//!
//! Both kinds expose the same handle API, so code that pins objects does not
//! need to know which lifetime it is feeding.
//!
//! ```ignore
//! let manager = ContextManager::new(Arc::new(HandleTable::new()));
//! if let Some(mut ctx) = manager.open_local("compile Foo.bar") {
//!     let handle = ctx.create_handle(HostRef(0x7f00_1000));
//!     // ... fold `handle` into a constant ...
//! } // released here
//! ```

pub mod compilation_context;
mod global_scope;
pub mod manager;

pub use compilation_context::{CompilationContext, ContextKind, ContextState};
pub use manager::{ContextManager, install_process_manager, process_manager};
