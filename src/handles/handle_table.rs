use parking_lot::Mutex;

use crate::handles::{
    foreign_handle::{ForeignHandle, HostRef},
    foreign_heap::ForeignHeap,
};

struct Slot {
    object: HostRef,
    generation: u32,
}

struct TableInner {
    slots: Vec<Option<Slot>>,
    generations: Vec<u32>,
    free_list: Vec<u32>,
    total_created: usize,
    total_released: usize,
    double_releases: usize,
}

/// In-process host heap that pins objects in a slot table.
///
/// Embedders without a real host VM use this as their [`ForeignHeap`]; it also
/// records enough bookkeeping to check that every handle is released exactly
/// once.
pub struct HandleTable {
    inner: Mutex<TableInner>,
    tracking: bool,
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleTable {
    /// Creates an empty table with handle tracking enabled.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TableInner {
                slots: Vec::new(),
                generations: Vec::new(),
                free_list: Vec::new(),
                total_created: 0,
                total_released: 0,
                double_releases: 0,
            }),
            tracking: true,
        }
    }

    /// Creates a table that reports no handle tracking support.
    pub fn untracked() -> Self {
        let mut table = Self::new();
        table.tracking = false;
        table
    }

    /// Pins `object` and returns a handle to it.
    ///
    /// Freed slots are reused through the internal free-list before growing
    /// the slot vector; reuse bumps the slot generation.
    pub fn pin(&self, object: HostRef) -> ForeignHandle {
        let mut inner = self.inner.lock();
        inner.total_created += 1;

        if let Some(idx) = inner.free_list.pop() {
            let generation = inner.generations[idx as usize].wrapping_add(1);
            inner.generations[idx as usize] = generation;
            inner.slots[idx as usize] = Some(Slot { object, generation });
            ForeignHandle::new(idx, generation)
        } else {
            let idx = slot_index(inner.slots.len());
            inner.slots.push(Some(Slot {
                object,
                generation: 0,
            }));
            inner.generations.push(0);
            ForeignHandle::new(idx, 0)
        }
    }

    /// Unpins the object behind `handle`.
    ///
    /// Returns `false` when the handle was already released (or never issued
    /// by this table); such calls are counted as double releases.
    pub fn unpin(&self, handle: ForeignHandle) -> bool {
        let mut inner = self.inner.lock();
        let idx = handle.index as usize;
        let live = matches!(
            inner.slots.get(idx),
            Some(Some(slot)) if slot.generation == handle.generation
        );

        if !live {
            inner.double_releases += 1;
            log::warn!("release of stale foreign handle {}", handle);
            return false;
        }

        inner.slots[idx] = None;
        inner.free_list.push(handle.index);
        inner.total_released += 1;
        true
    }

    /// Returns the pinned object for a live handle.
    pub fn get(&self, handle: ForeignHandle) -> Option<HostRef> {
        let inner = self.inner.lock();
        match inner.slots.get(handle.index as usize) {
            Some(Some(slot)) if slot.generation == handle.generation => Some(slot.object),
            _ => None,
        }
    }

    /// Returns `true` while `handle` still pins its object.
    pub fn is_live(&self, handle: ForeignHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Returns the number of currently pinned objects.
    pub fn live_count(&self) -> usize {
        let inner = self.inner.lock();
        inner.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn total_created(&self) -> usize {
        self.inner.lock().total_created
    }

    pub fn total_released(&self) -> usize {
        self.inner.lock().total_released
    }

    /// Number of release calls that hit an already-free slot.
    pub fn double_releases(&self) -> usize {
        self.inner.lock().double_releases
    }
}

/// Index for the next fresh slot. Handles carry a `u32` index, so a table
/// may never grow past `u32::MAX` slots.
pub(crate) fn slot_index(len: usize) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| {
        panic!("foreign handle table cannot address slot {len}: u32 index space exhausted")
    })
}

impl ForeignHeap for HandleTable {
    fn supports_handle_tracking(&self) -> bool {
        self.tracking
    }

    fn create_handle(&self, object: HostRef) -> ForeignHandle {
        self.pin(object)
    }

    fn release(&self, handle: ForeignHandle) {
        self.unpin(handle);
    }
}

impl std::fmt::Debug for HandleTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleTable")
            .field("live", &self.live_count())
            .field("tracking", &self.tracking)
            .finish()
    }
}
