pub mod foreign_handle;
pub mod foreign_heap;
pub mod handle_table;

pub use foreign_handle::{ForeignHandle, HostRef};
pub use foreign_heap::ForeignHeap;
pub use handle_table::HandleTable;
