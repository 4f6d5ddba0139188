use std::sync::Arc;

use crate::{Error, MemorySpace, registry};

#[test]
fn test_registry_host() {
    let allocator = crate::allocator(MemorySpace::Host);
    assert_eq!(allocator.name(), "Host");
    assert_eq!(allocator.space(), MemorySpace::Host);
}

#[test]
fn test_registry_caches_allocators() {
    let first = registry().get(MemorySpace::Device);
    let second = registry().get(MemorySpace::Device);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_registry_every_space() {
    for space in <MemorySpace as strum::VariantArray>::VARIANTS {
        assert_eq!(registry().get(*space).space(), *space);
    }
}

#[test]
fn test_registry_tagged() {
    assert_eq!(registry().get_tagged("unified").unwrap().space(), MemorySpace::Managed);
    assert!(matches!(registry().get_tagged("scratchpad"), Err(Error::InvalidSpace { .. })));
}
