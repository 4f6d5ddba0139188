use std::sync::Arc;

use crate::{
    Allocator, DeviceAllocator, Error, MemorySpace, MemorySpaceManager, RawBuffer, Result, SpaceUsage, data_init_count,
};

#[test]
fn test_round_trip_through_every_space() {
    let manager = MemorySpaceManager::new();
    let host: Vec<f64> = (0..32).map(|i| i as f64 * 0.5).collect();

    for space in <MemorySpace as strum::VariantArray>::VARIANTS {
        let array = manager.alloc_and_init(*space, &host).unwrap();
        let mut back = vec![0.0; host.len()];
        manager.retrieve_to_host(&array, &mut back);
        assert_eq!(back, host, "space {space}");
        manager.free(array);
    }
    assert!(manager.is_balanced());
}

#[test]
fn test_allocation_ledger() {
    let manager = MemorySpaceManager::new();
    let a = manager.allocate(MemorySpace::Pinned, 8).unwrap();
    let b = manager.allocate(MemorySpace::Pinned, 8).unwrap();
    let c = manager.allocate(MemorySpace::Device, 8).unwrap();

    assert_eq!(manager.usage(MemorySpace::Pinned), SpaceUsage { allocations: 2, frees: 0 });
    assert_eq!(manager.live_arrays(), 3);
    assert!(!manager.is_balanced());

    manager.free(a);
    manager.free(c);
    assert_eq!(manager.usage(MemorySpace::Pinned).live(), 1);
    assert_eq!(manager.usage(MemorySpace::Device), SpaceUsage { allocations: 1, frees: 1 });

    manager.free(b);
    assert!(manager.is_balanced());
    assert_eq!(manager.usage(MemorySpace::Host), SpaceUsage::default());
}

#[test]
fn test_allocate_tagged_invalid_space() {
    let manager = MemorySpaceManager::new();
    let err = manager.allocate_tagged("constant", 4).unwrap_err();

    assert!(matches!(err, Error::InvalidSpace { ref tag } if tag == "constant"));
    assert_eq!(manager.live_arrays(), 0);
}

#[test]
fn test_alloc_and_init_const() {
    let manager = MemorySpaceManager::new();
    let array = manager.alloc_and_init_const(MemorySpace::Managed, 6, 1.25).unwrap();

    assert_eq!(manager.to_host_vec(&array), vec![1.25; 6]);
    manager.free(array);
}

#[test]
fn test_initialization_increments_counter() {
    let manager = MemorySpaceManager::new();

    let before = data_init_count();
    let a = manager.alloc_and_init_data(MemorySpace::Host, 4, 0.1).unwrap();
    let mut b = manager.allocate(MemorySpace::Device, 4).unwrap();
    manager.initialize_from_host(&mut b, &[0.0; 4]);

    // Other tests initialize concurrently, so only a lower bound holds here.
    assert!(data_init_count() - before >= 2);
    manager.free(a);
    manager.free(b);
}

#[test]
fn test_device_allocator_residency_returns_to_zero() {
    let device = Arc::new(DeviceAllocator::default());
    let manager = MemorySpaceManager::new().with_allocator(device.clone());

    let array = manager.allocate(MemorySpace::Device, 128).unwrap();
    assert_eq!(device.resident_bytes(), 128 * size_of::<f64>());
    manager.free(array);
    assert_eq!(device.resident_bytes(), 0);
}

#[derive(Debug)]
struct ExhaustedAllocator;

impl Allocator for ExhaustedAllocator {
    fn space(&self) -> MemorySpace {
        MemorySpace::Device
    }

    fn alloc(&self, len: usize) -> Result<RawBuffer> {
        crate::AllocationFailedSnafu { space: MemorySpace::Device, len, reason: "out of memory" }.fail()
    }

    fn name(&self) -> &str {
        "Exhausted"
    }
}

#[test]
fn test_failed_allocation_is_not_recorded() {
    let manager = MemorySpaceManager::new().with_allocator(Arc::new(ExhaustedAllocator));

    assert!(matches!(manager.allocate(MemorySpace::Device, 4), Err(Error::AllocationFailed { .. })));
    assert_eq!(manager.usage(MemorySpace::Device), SpaceUsage::default());

    // Other spaces still come from the registry.
    let host = manager.allocate(MemorySpace::Host, 4).unwrap();
    manager.free(host);
    assert!(manager.is_balanced());
}

#[test]
fn test_manager_counts_its_own_initializations() {
    let manager = MemorySpaceManager::new();
    let a = manager.alloc_and_init_const(MemorySpace::Pinned, 3, 0.0).unwrap();
    let b = manager.alloc_and_init_data(MemorySpace::Device, 3, 1.0).unwrap();

    assert_eq!(manager.initialization_count(), 2);
    manager.free(a);
    manager.free(b);
}
