//! Allocation, transfer and release of space-resident arrays.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::trace;

use crate::allocator::Allocator;
use crate::buffer::{ArrayId, SpaceArray};
use crate::data::{inc_data_init_count, init_data, init_data_const};
use crate::error::Result;
use crate::registry::registry;
use crate::{MemorySpace, Real};

/// Allocation/free counts for one space.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SpaceUsage {
    pub allocations: u64,
    pub frees: u64,
}

impl SpaceUsage {
    pub fn live(&self) -> u64 {
        self.allocations - self.frees
    }
}

#[derive(Debug, Default)]
pub(crate) struct Ledger {
    usage: HashMap<MemorySpace, SpaceUsage>,
    live: HashMap<ArrayId, MemorySpace>,
}

impl Ledger {
    fn record_alloc(&mut self, id: ArrayId, space: MemorySpace) {
        self.usage.entry(space).or_default().allocations += 1;
        self.live.insert(id, space);
    }

    pub(crate) fn record_free(&mut self, id: ArrayId, space: MemorySpace) {
        if self.live.remove(&id).is_some() {
            self.usage.entry(space).or_default().frees += 1;
        }
    }
}

/// Front door for every array a kernel owns.
///
/// Each successful [`allocate`](Self::allocate) is recorded in a ledger and each
/// release is checked off against it; resource-safety checks read the ledger back
/// through [`usage`](Self::usage) and [`is_balanced`](Self::is_balanced).
#[derive(Debug, Default)]
pub struct MemorySpaceManager {
    overrides: HashMap<MemorySpace, Arc<dyn Allocator>>,
    ledger: Arc<Mutex<Ledger>>,
    initializations: AtomicU64,
}

impl MemorySpaceManager {
    /// Manager backed by the global allocator registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the allocator used for `allocator.space()`.
    pub fn with_allocator(mut self, allocator: Arc<dyn Allocator>) -> Self {
        self.overrides.insert(allocator.space(), allocator);
        self
    }

    fn allocator(&self, space: MemorySpace) -> Arc<dyn Allocator> {
        match self.overrides.get(&space) {
            Some(allocator) => Arc::clone(allocator),
            None => registry().get(space),
        }
    }

    /// Allocate a zeroed array of `len` elements in `space`.
    pub fn allocate(&self, space: MemorySpace, len: usize) -> Result<SpaceArray> {
        let allocator = self.allocator(space);
        let raw = allocator.alloc(len)?;
        let array = SpaceArray::new(raw, allocator, Arc::clone(&self.ledger));

        self.ledger.lock().record_alloc(array.id(), space);
        trace!(space = %space, len, id = array.id().0, "allocated array");
        Ok(array)
    }

    /// Allocate in the space named by `tag`.
    pub fn allocate_tagged(&self, tag: &str, len: usize) -> Result<SpaceArray> {
        self.allocate(MemorySpace::parse(tag)?, len)
    }

    /// Copy host values into `array`.
    ///
    /// `host` must have exactly `array.len()` elements. This is a caller
    /// precondition and is only asserted in debug builds.
    pub fn initialize_from_host(&self, array: &mut SpaceArray, host: &[Real]) {
        array.copyin(host);
        self.initializations.fetch_add(1, Ordering::Relaxed);
        inc_data_init_count();
    }

    /// Copy `array` back into a host buffer of the same length.
    pub fn retrieve_to_host(&self, array: &SpaceArray, host: &mut [Real]) {
        array.copyout(host);
    }

    /// Release `array`.
    pub fn free(&self, array: SpaceArray) {
        trace!(space = %array.space(), id = array.id().0, "freeing array");
        drop(array);
    }

    /// Wait for outstanding device work touching `space`.
    pub fn synchronize(&self, space: MemorySpace) -> Result<()> {
        self.allocator(space).synchronize()
    }

    /// Allocate an array shaped like `host` and fill it from `host`.
    pub fn alloc_and_init(&self, space: MemorySpace, host: &[Real]) -> Result<SpaceArray> {
        let mut array = self.allocate(space, host.len())?;
        self.initialize_from_host(&mut array, host);
        Ok(array)
    }

    /// Allocate and fill with a constant.
    pub fn alloc_and_init_const(&self, space: MemorySpace, len: usize, value: Real) -> Result<SpaceArray> {
        self.alloc_and_init(space, &init_data_const(len, value))
    }

    /// Allocate and fill with the deterministic [`init_data`] pattern.
    pub fn alloc_and_init_data(&self, space: MemorySpace, len: usize, factor: Real) -> Result<SpaceArray> {
        self.alloc_and_init(space, &init_data(len, factor))
    }

    /// Copy `array` into a freshly allocated host vector.
    pub fn to_host_vec(&self, array: &SpaceArray) -> Vec<Real> {
        let mut host = vec![0.0; array.len()];
        self.retrieve_to_host(array, &mut host);
        host
    }

    pub fn usage(&self, space: MemorySpace) -> SpaceUsage {
        self.ledger.lock().usage.get(&space).copied().unwrap_or_default()
    }

    /// Host-to-space initializations performed through this manager.
    pub fn initialization_count(&self) -> u64 {
        self.initializations.load(Ordering::Relaxed)
    }

    /// Arrays allocated through this manager and not yet released.
    pub fn live_arrays(&self) -> usize {
        self.ledger.lock().live.len()
    }

    /// Every allocation has been matched by exactly one release.
    pub fn is_balanced(&self) -> bool {
        let ledger = self.ledger.lock();
        ledger.live.is_empty() && ledger.usage.values().all(|usage| usage.allocations == usage.frees)
    }
}
