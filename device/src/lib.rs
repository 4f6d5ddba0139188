//! Memory spaces for benchmark data.
//!
//! Kernels own their arrays through [`SpaceArray`] handles obtained from a
//! [`MemorySpaceManager`]. Four spaces are modelled: pageable host memory,
//! pinned host memory, managed (unified) memory and device-only memory. The
//! manager pairs every allocation with exactly one free and counts data
//! initializations for diagnostics.

pub mod allocator;
pub mod buffer;
pub mod data;
pub mod error;
pub mod manager;
pub mod registry;
pub mod space;

#[cfg(test)]
pub mod test;

pub use allocator::{Allocator, DeviceAllocator, HostAllocator, ManagedAllocator, PinnedAllocator, RawBuffer};
pub use buffer::{ArrayId, SpaceArray};
pub use data::{data_init_count, init_data, init_data_const, init_scalar, reset_data_init_count};
pub use error::*;
pub use manager::{MemorySpaceManager, SpaceUsage};
pub use registry::{AllocatorRegistry, allocator, registry};
pub use space::MemorySpace;

/// Element type of every benchmark array.
pub type Real = f64;
