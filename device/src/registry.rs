use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::MemorySpace;
use crate::allocator::{Allocator, DeviceAllocator, HostAllocator, ManagedAllocator, PinnedAllocator};
use crate::error::Result;

/// Process-wide allocator per memory space.
pub struct AllocatorRegistry {
    allocators: RwLock<HashMap<MemorySpace, Arc<dyn Allocator>>>,
}

impl AllocatorRegistry {
    fn new() -> Self {
        Self { allocators: RwLock::new(HashMap::new()) }
    }

    /// Get or create the allocator for a space.
    pub fn get(&self, space: MemorySpace) -> Arc<dyn Allocator> {
        // Fast path: read lock
        {
            let allocators = self.allocators.read();
            if let Some(allocator) = allocators.get(&space) {
                return Arc::clone(allocator);
            }
        }

        let mut allocators = self.allocators.write();

        // Double-check after acquiring write lock
        if let Some(allocator) = allocators.get(&space) {
            return Arc::clone(allocator);
        }

        let allocator = Self::create_allocator(space);
        allocators.insert(space, Arc::clone(&allocator));
        allocator
    }

    /// Get an allocator by parsing a space tag.
    pub fn get_tagged(&self, tag: &str) -> Result<Arc<dyn Allocator>> {
        Ok(self.get(MemorySpace::parse(tag)?))
    }

    fn create_allocator(space: MemorySpace) -> Arc<dyn Allocator> {
        match space {
            MemorySpace::Host => Arc::new(HostAllocator),
            MemorySpace::Pinned => Arc::new(PinnedAllocator),
            MemorySpace::Managed => Arc::new(ManagedAllocator::default()),
            MemorySpace::Device => Arc::new(DeviceAllocator::default()),
        }
    }
}

static REGISTRY: Lazy<AllocatorRegistry> = Lazy::new(AllocatorRegistry::new);

/// Get the global allocator registry.
pub fn registry() -> &'static AllocatorRegistry {
    &REGISTRY
}

/// Convenience function to get the allocator of a space.
pub fn allocator(space: MemorySpace) -> Arc<dyn Allocator> {
    registry().get(space)
}
