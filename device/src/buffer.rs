use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::allocator::{Allocator, RawBuffer};
use crate::error::{NotHostAccessibleSnafu, Result};
use crate::manager::Ledger;
use crate::{MemorySpace, Real};

/// Process-unique identity of an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArrayId(pub u64);

impl ArrayId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ArrayId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// An array of reals resident in one memory space.
///
/// The handle is exclusively owned: it is not `Clone`, and releasing it
/// (explicitly through [`crate::MemorySpaceManager::free`] or by dropping it)
/// consumes it, so an allocation is returned to its allocator exactly once.
pub struct SpaceArray {
    raw: RawBuffer,
    space: MemorySpace,
    id: ArrayId,
    allocator: Arc<dyn Allocator>,
    ledger: Arc<Mutex<Ledger>>,
}

impl SpaceArray {
    pub(crate) fn new(raw: RawBuffer, allocator: Arc<dyn Allocator>, ledger: Arc<Mutex<Ledger>>) -> Self {
        let space = raw.space();
        Self { raw, space, id: ArrayId::next(), allocator, ledger }
    }

    pub fn id(&self) -> ArrayId {
        self.id
    }

    pub fn space(&self) -> MemorySpace {
        self.space
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Read the array from host code.
    pub fn host_view(&self) -> Result<&[Real]> {
        let space = self.space;
        snafu::ensure!(space.is_host_accessible(), NotHostAccessibleSnafu { space });
        Ok(self.raw.as_slice())
    }

    /// Write the array from host code.
    pub fn host_view_mut(&mut self) -> Result<&mut [Real]> {
        let space = self.space;
        snafu::ensure!(space.is_host_accessible(), NotHostAccessibleSnafu { space });
        Ok(self.raw.as_mut_slice())
    }

    /// View used by kernel bodies running in the array's own space.
    ///
    /// Kernel code for a GPU family executes "on the device", so device-only
    /// arrays are readable here even though [`Self::host_view`] rejects them.
    pub fn kernel_view(&self) -> &[Real] {
        self.raw.as_slice()
    }

    pub fn kernel_view_mut(&mut self) -> &mut [Real] {
        self.raw.as_mut_slice()
    }

    /// Copy `src` into the array. Lengths must match.
    pub(crate) fn copyin(&mut self, src: &[Real]) {
        debug_assert_eq!(self.len(), src.len(), "host/space length mismatch on copyin");
        self.raw.as_mut_slice().copy_from_slice(src);
    }

    /// Copy the array into `dst`. Lengths must match.
    pub(crate) fn copyout(&self, dst: &mut [Real]) {
        debug_assert_eq!(self.len(), dst.len(), "host/space length mismatch on copyout");
        dst.copy_from_slice(self.raw.as_slice());
    }
}

impl std::fmt::Debug for SpaceArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpaceArray")
            .field("id", &self.id)
            .field("space", &self.space)
            .field("len", &self.len())
            .finish()
    }
}

impl Drop for SpaceArray {
    fn drop(&mut self) {
        let raw = std::mem::replace(&mut self.raw, RawBuffer::Device { data: Box::default() });
        self.ledger.lock().record_free(self.id, self.space);
        self.allocator.free(raw);
    }
}
