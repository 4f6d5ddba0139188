use crate::{Error, MemorySpace, MemorySpaceManager};

#[test]
fn test_host_view_of_host_array() {
    let manager = MemorySpaceManager::new();
    let array = manager.alloc_and_init(MemorySpace::Host, &[1.0, 2.0, 3.0]).unwrap();

    assert_eq!(array.host_view().unwrap(), &[1.0, 2.0, 3.0]);
    manager.free(array);
}

#[test]
fn test_device_array_rejects_host_view() {
    let manager = MemorySpaceManager::new();
    let mut array = manager.alloc_and_init(MemorySpace::Device, &[4.0, 5.0]).unwrap();

    let err = array.host_view().unwrap_err();
    assert!(matches!(err, Error::NotHostAccessible { space: MemorySpace::Device }));
    assert!(array.host_view_mut().is_err());

    // Device code still sees the data.
    assert_eq!(array.kernel_view(), &[4.0, 5.0]);
    manager.free(array);
}

#[test]
fn test_managed_and_pinned_are_host_visible() {
    let manager = MemorySpaceManager::new();
    for space in [MemorySpace::Pinned, MemorySpace::Managed] {
        let mut array = manager.allocate(space, 4).unwrap();
        array.host_view_mut().unwrap()[2] = 7.0;
        assert_eq!(array.kernel_view()[2], 7.0);
        manager.free(array);
    }
}

#[test]
fn test_ids_are_unique() {
    let manager = MemorySpaceManager::new();
    let a = manager.allocate(MemorySpace::Host, 1).unwrap();
    let b = manager.allocate(MemorySpace::Host, 1).unwrap();

    assert_ne!(a.id(), b.id());
    manager.free(a);
    manager.free(b);
}

#[test]
fn test_empty_array() {
    let manager = MemorySpaceManager::new();
    let array = manager.allocate(MemorySpace::Device, 0).unwrap();

    assert!(array.is_empty());
    assert_eq!(manager.to_host_vec(&array), Vec::<f64>::new());
    manager.free(array);
    assert!(manager.is_balanced());
}

#[test]
fn test_dropped_array_is_released() {
    let manager = MemorySpaceManager::new();
    {
        let _scratch = manager.allocate(MemorySpace::Pinned, 16).unwrap();
        assert_eq!(manager.live_arrays(), 1);
    }

    assert!(manager.is_balanced());
    assert_eq!(manager.usage(MemorySpace::Pinned).frees, 1);
}
