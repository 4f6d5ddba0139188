use std::sync::atomic::{AtomicUsize, Ordering};

use aligned_vec::{AVec, RuntimeAlign};

use crate::error::{AllocationTooLargeSnafu, Result};
use crate::{MemorySpace, Real};

/// Storage behind a space-resident array.
///
/// Every variant is zero-initialized on allocation. Host and pinned storage keep
/// the alignment the space asks for; managed and device storage are owned by the
/// emulated device.
#[derive(Debug)]
pub enum RawBuffer {
    Host { data: AVec<Real, RuntimeAlign> },
    Pinned { data: AVec<Real, RuntimeAlign> },
    Managed { data: Box<[Real]> },
    Device { data: Box<[Real]> },
}

impl RawBuffer {
    /// Space this storage belongs to.
    pub fn space(&self) -> MemorySpace {
        match self {
            RawBuffer::Host { .. } => MemorySpace::Host,
            RawBuffer::Pinned { .. } => MemorySpace::Pinned,
            RawBuffer::Managed { .. } => MemorySpace::Managed,
            RawBuffer::Device { .. } => MemorySpace::Device,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn as_slice(&self) -> &[Real] {
        match self {
            RawBuffer::Host { data } | RawBuffer::Pinned { data } => data,
            RawBuffer::Managed { data } | RawBuffer::Device { data } => data,
        }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Real] {
        match self {
            RawBuffer::Host { data } | RawBuffer::Pinned { data } => data,
            RawBuffer::Managed { data } | RawBuffer::Device { data } => data,
        }
    }
}

fn check_len(len: usize) -> Result<()> {
    let fits = len.checked_mul(size_of::<Real>()).is_some_and(|bytes| bytes <= isize::MAX as usize);
    snafu::ensure!(fits, AllocationTooLargeSnafu { len });
    Ok(())
}

fn aligned_zeroes(align: usize, len: usize) -> AVec<Real, RuntimeAlign> {
    AVec::from_iter(align, std::iter::repeat_n(0.0, len))
}

pub trait Allocator: Send + Sync + std::fmt::Debug {
    /// Space served by this allocator.
    fn space(&self) -> MemorySpace;
    fn alloc(&self, len: usize) -> Result<RawBuffer>;
    fn free(&self, _buffer: RawBuffer) {}
    fn synchronize(&self) -> Result<()> {
        Ok(())
    }
    fn name(&self) -> &str;
}

/// Pageable host memory.
#[derive(Debug, Clone)]
pub struct HostAllocator;

impl Allocator for HostAllocator {
    fn space(&self) -> MemorySpace {
        MemorySpace::Host
    }

    fn alloc(&self, len: usize) -> Result<RawBuffer> {
        check_len(len)?;
        Ok(RawBuffer::Host { data: aligned_zeroes(MemorySpace::Host.alignment(), len) })
    }

    fn name(&self) -> &str {
        "Host"
    }
}

/// Page-locked host memory, mapped into the device address space.
#[derive(Debug, Clone)]
pub struct PinnedAllocator;

impl Allocator for PinnedAllocator {
    fn space(&self) -> MemorySpace {
        MemorySpace::Pinned
    }

    fn alloc(&self, len: usize) -> Result<RawBuffer> {
        check_len(len)?;
        Ok(RawBuffer::Pinned { data: aligned_zeroes(MemorySpace::Pinned.alignment(), len) })
    }

    fn name(&self) -> &str {
        "Pinned"
    }
}

/// Bookkeeping shared by the allocators that hand out device-visible storage.
#[derive(Debug, Default)]
struct Residency {
    bytes: AtomicUsize,
}

impl Residency {
    fn acquire(&self, len: usize) {
        self.bytes.fetch_add(len * size_of::<Real>(), Ordering::Relaxed);
    }

    fn release(&self, len: usize) {
        self.bytes.fetch_sub(len * size_of::<Real>(), Ordering::Relaxed);
    }

    fn get(&self) -> usize {
        self.bytes.load(Ordering::Relaxed)
    }
}

/// Unified memory visible to both host and device.
#[derive(Debug, Default)]
pub struct ManagedAllocator {
    resident: Residency,
}

impl ManagedAllocator {
    /// Bytes of managed memory currently allocated.
    pub fn resident_bytes(&self) -> usize {
        self.resident.get()
    }
}

impl Allocator for ManagedAllocator {
    fn space(&self) -> MemorySpace {
        MemorySpace::Managed
    }

    fn alloc(&self, len: usize) -> Result<RawBuffer> {
        check_len(len)?;
        self.resident.acquire(len);
        Ok(RawBuffer::Managed { data: vec![0.0; len].into_boxed_slice() })
    }

    fn free(&self, buffer: RawBuffer) {
        self.resident.release(buffer.len());
    }

    fn synchronize(&self) -> Result<()> {
        // Emulated device work completes before the launch returns; only the
        // host/device memory ordering is left to enforce.
        std::sync::atomic::fence(Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "Managed"
    }
}

/// Device-only memory.
#[derive(Debug, Default)]
pub struct DeviceAllocator {
    resident: Residency,
}

impl DeviceAllocator {
    /// Bytes of device memory currently allocated.
    pub fn resident_bytes(&self) -> usize {
        self.resident.get()
    }
}

impl Allocator for DeviceAllocator {
    fn space(&self) -> MemorySpace {
        MemorySpace::Device
    }

    fn alloc(&self, len: usize) -> Result<RawBuffer> {
        check_len(len)?;
        self.resident.acquire(len);
        Ok(RawBuffer::Device { data: vec![0.0; len].into_boxed_slice() })
    }

    fn free(&self, buffer: RawBuffer) {
        self.resident.release(buffer.len());
    }

    fn synchronize(&self) -> Result<()> {
        std::sync::atomic::fence(Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "Device"
    }
}
