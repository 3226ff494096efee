use std::fmt;

/// Handle to an object pinned in the host heap.
///
/// A `ForeignHandle` is a lightweight, copyable slot reference. It has no
/// meaning on its own: the context that created it owns it, and the host heap
/// resolves it. The generation distinguishes successive occupants of the same
/// slot so a stale handle never aliases a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ForeignHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl ForeignHandle {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the raw host slot index backing this handle.
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ForeignHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.index, self.generation)
    }
}

/// Identity of an object living in the host heap (its address or a stable id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostRef(pub u64);

impl fmt::Display for HostRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}
