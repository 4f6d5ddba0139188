use std::sync::Arc;

use perfsuite_device::MemorySpaceManager;
use strum::VariantArray;

use crate::test::{ExhaustedDevice, TestKernel, small_params};
use crate::{Error, KernelInstance, LifecycleState, Operation, RunOutcome, Tuning, VariantId, VariantSet};

fn instance() -> KernelInstance {
    KernelInstance::new(TestKernel::all("Test_AXPY").boxed())
}

#[test]
fn test_run_before_set_up() {
    let memory = MemorySpaceManager::new();
    let params = small_params();
    let mut kernel = instance();

    let err = kernel.run_variant(VariantId::BaseSeq, &Tuning::untuned(), &memory, &params).unwrap_err();
    assert!(matches!(
        err,
        Error::Lifecycle { operation: Operation::RunVariant, state: LifecycleState::Uninitialized, .. }
    ));
    assert!(matches!(kernel.update_checksum(VariantId::BaseSeq, &memory, &params), Err(Error::Lifecycle { .. })));
    assert!(matches!(kernel.tear_down(VariantId::BaseSeq, &memory, &params), Err(Error::Lifecycle { .. })));
}

#[test]
fn test_set_up_tear_down_without_runs() {
    let memory = MemorySpaceManager::new();
    let params = small_params();
    let mut kernel = instance();

    kernel.set_up(VariantId::BaseSeq, &memory, &params).unwrap();
    assert_eq!(kernel.state(), LifecycleState::DataReady);
    assert_eq!(kernel.problem_size(), 100);

    kernel.tear_down(VariantId::BaseSeq, &memory, &params).unwrap();
    assert_eq!(kernel.state(), LifecycleState::DataTornDown);
    assert!(kernel.checksums().is_empty());
    assert!(memory.is_balanced());
}

#[test]
fn test_double_tear_down() {
    let memory = MemorySpaceManager::new();
    let params = small_params();
    let mut kernel = instance();

    kernel.set_up(VariantId::BaseSeq, &memory, &params).unwrap();
    kernel.tear_down(VariantId::BaseSeq, &memory, &params).unwrap();

    let err = kernel.tear_down(VariantId::BaseSeq, &memory, &params).unwrap_err();
    assert!(matches!(err, Error::Lifecycle { operation: Operation::TearDown, .. }));
    assert!(memory.is_balanced());
}

#[test]
fn test_double_set_up() {
    let memory = MemorySpaceManager::new();
    let params = small_params();
    let mut kernel = instance();

    kernel.set_up(VariantId::BaseSeq, &memory, &params).unwrap();
    let err = kernel.set_up(VariantId::BaseSeq, &memory, &params).unwrap_err();
    assert!(matches!(err, Error::Lifecycle { operation: Operation::SetUp, state: LifecycleState::DataReady, .. }));
    kernel.tear_down(VariantId::BaseSeq, &memory, &params).unwrap();
}

#[test]
fn test_checksum_once_per_run() {
    let memory = MemorySpaceManager::new();
    let params = small_params();
    let mut kernel = instance();
    let variant = VariantId::LambdaThreads;

    kernel.set_up(variant, &memory, &params).unwrap();
    assert!(matches!(kernel.update_checksum(variant, &memory, &params), Err(Error::Lifecycle { .. })));

    kernel.run_variant(variant, &Tuning::untuned(), &memory, &params).unwrap();
    // A second run before the first is checksummed is out of order.
    assert!(matches!(
        kernel.run_variant(variant, &Tuning::untuned(), &memory, &params),
        Err(Error::Lifecycle { .. })
    ));

    kernel.update_checksum(variant, &memory, &params).unwrap();
    assert!(matches!(kernel.update_checksum(variant, &memory, &params), Err(Error::Lifecycle { .. })));

    kernel.tear_down(variant, &memory, &params).unwrap();
    assert_eq!(kernel.state(), LifecycleState::ChecksumRecorded);
}

#[test]
fn test_run_with_other_variant_than_set_up() {
    let memory = MemorySpaceManager::new();
    let params = small_params();
    let mut kernel = instance();

    kernel.set_up(VariantId::BaseSeq, &memory, &params).unwrap();
    let err = kernel.run_variant(VariantId::BaseGpuLaunch, &Tuning::block(128), &memory, &params).unwrap_err();
    assert!(matches!(err, Error::Lifecycle { .. }));
    kernel.tear_down(VariantId::BaseSeq, &memory, &params).unwrap();
}

#[test]
fn test_unsupported_variant_is_not_an_error() {
    let memory = MemorySpaceManager::new();
    let params = small_params();
    let supported: VariantSet = VariantId::BaseSeq | VariantId::BaseThreads;
    let mut kernel = KernelInstance::new(TestKernel::new("Test_Partial", supported).boxed());

    kernel.set_up(VariantId::LambdaSeq, &memory, &params).unwrap();
    let outcome = kernel.run_variant(VariantId::LambdaSeq, &Tuning::untuned(), &memory, &params).unwrap();
    assert_eq!(outcome, RunOutcome::Unsupported);

    kernel.tear_down(VariantId::LambdaSeq, &memory, &params).unwrap();
    assert_eq!(kernel.state(), LifecycleState::DataTornDown);
    assert!(kernel.checksum(VariantId::LambdaSeq, "default").is_none());
}

#[test]
fn test_repeated_runs_start_from_initial_data() {
    let memory = MemorySpaceManager::new();
    let params = small_params();
    let mut kernel = instance();
    let variant = VariantId::BaseSeq;

    kernel.set_up(variant, &memory, &params).unwrap();
    let mut values = Vec::new();
    for _ in 0..3 {
        kernel.run_variant(variant, &Tuning::untuned(), &memory, &params).unwrap();
        values.push(kernel.update_checksum(variant, &memory, &params).unwrap());
    }
    kernel.tear_down(variant, &memory, &params).unwrap();

    assert_eq!(values[0], values[1]);
    assert_eq!(values[1], values[2]);
    let slot = kernel.checksum(variant, "default").unwrap();
    assert_eq!(slot.updates, 3);
    assert_eq!(slot.mean(), values[0]);
    assert!(memory.is_balanced());
}

#[test]
fn test_variants_agree_on_checksum() {
    let memory = MemorySpaceManager::new();
    let params = small_params();
    let mut kernel = instance();

    let mut reference = None;
    for &variant in VariantId::VARIANTS {
        let tuning = if variant.family().is_tunable() { Tuning::block(64) } else { Tuning::untuned() };
        kernel.set_up(variant, &memory, &params).unwrap();
        kernel.run_variant(variant, &tuning, &memory, &params).unwrap();
        let value = kernel.update_checksum(variant, &memory, &params).unwrap();
        kernel.tear_down(variant, &memory, &params).unwrap();

        let expected = *reference.get_or_insert(value);
        assert_eq!(value, expected, "{variant}");
    }
}

#[test]
fn test_run_without_timed_region() {
    let memory = MemorySpaceManager::new();
    let params = small_params();
    let mut kernel = KernelInstance::new(TestKernel::all("Test_Untimed").untimed().boxed());

    kernel.set_up(VariantId::BaseSeq, &memory, &params).unwrap();
    let err = kernel.run_variant(VariantId::BaseSeq, &Tuning::untuned(), &memory, &params).unwrap_err();
    assert!(matches!(err, Error::Timer { .. }));

    // The instance is still usable for cleanup.
    assert_eq!(kernel.state(), LifecycleState::DataReady);
    kernel.tear_down(VariantId::BaseSeq, &memory, &params).unwrap();
    assert!(memory.is_balanced());
}

#[test]
fn test_failed_set_up_releases_partial_data() {
    let memory = MemorySpaceManager::new().with_allocator(Arc::new(ExhaustedDevice));
    let params = small_params();
    let mut kernel = instance();

    let err = kernel.set_up(VariantId::BaseGpuLaunch, &memory, &params).unwrap_err();
    assert!(matches!(err, Error::Device { .. }));
    assert_eq!(kernel.state(), LifecycleState::Uninitialized);
    assert!(memory.is_balanced());

    // Host-side variants are unaffected.
    kernel.set_up(VariantId::BaseSeq, &memory, &params).unwrap();
    kernel.tear_down(VariantId::BaseSeq, &memory, &params).unwrap();
}
