use std::sync::Arc;

use perfsuite_device::MemorySpaceManager;
use test_case::test_case;

use crate::test::{ExhaustedDevice, TestKernel, small_params};
use crate::{
    CollectingSink, Error, ExecutionFamily, LifecycleState, Operation, RunParams, SkipReason, SuiteRunner, VariantId,
    VariantSet,
};

fn runner(params: RunParams) -> SuiteRunner {
    let mut runner = SuiteRunner::new(params);
    runner.add_kernel(TestKernel::all("Test_AXPY").boxed());
    runner
}

#[test]
fn test_full_suite() {
    let mut runner = runner(small_params());
    let report = runner.run().unwrap();

    // Seq, Threads and GpuOffload are untuned; GpuLaunch has five block sizes.
    assert_eq!(report.records().len(), 3 + 3 + 3 * 5 + 3);
    assert!(report.diagnostics().is_empty());
    assert!(report.all_checksums_consistent());
    assert!(runner.memory().is_balanced());

    for record in report.records() {
        assert_eq!(record.elapsed, record.timing.total);
        assert_eq!(record.problem_size, 100);
        assert_eq!(record.reps, 5);
        if record.variant.family() != ExecutionFamily::GpuLaunch {
            assert_eq!(record.tuning, "default");
        }
    }
    assert!(report.record("Test_AXPY", VariantId::LibraryGpuLaunch, "block_1024").is_some());
}

#[test_case(vec![128, 256], 2)]
#[test_case(vec![128, 4096], 1)]
#[test_case(vec![], 5)]
fn test_block_size_allow_list(allowed: Vec<usize>, per_variant: usize) {
    let params = RunParams::builder().size_factor(0.1).gpu_block_sizes(allowed).build().unwrap();
    let report = runner(params).run().unwrap();

    let launch = report.records().iter().filter(|r| r.variant.family() == ExecutionFamily::GpuLaunch).count();
    assert_eq!(launch, 3 * per_variant);
}

#[test]
fn test_allow_list_excluding_every_candidate() {
    let params = RunParams::builder().size_factor(0.1).gpu_block_sizes(vec![999]).build().unwrap();
    let report = runner(params).run().unwrap();

    let skipped: Vec<_> = report.diagnostics().iter().filter(|d| d.reason == SkipReason::NoValidTuning).collect();
    assert_eq!(skipped.len(), 3);
    assert!(skipped.iter().all(|d| d.variant.family() == ExecutionFamily::GpuLaunch));
    assert_eq!(report.records().len(), 9);
}

#[test]
fn test_unsupported_variant_diagnostics_only_when_requested() {
    let supported: VariantSet = VariantId::BaseSeq | VariantId::LambdaSeq;

    let mut implicit = SuiteRunner::new(small_params());
    implicit.add_kernel(TestKernel::new("Test_Partial", supported).boxed());
    let report = implicit.run().unwrap();
    assert_eq!(report.records().len(), 2);
    assert!(report.diagnostics().is_empty());

    let params =
        RunParams::builder().size_factor(0.1).variants(VariantId::BaseSeq | VariantId::BaseThreads).build().unwrap();
    let mut explicit = SuiteRunner::new(params);
    explicit.add_kernel(TestKernel::new("Test_Partial", supported).boxed());
    let report = explicit.run().unwrap();

    assert_eq!(report.records().len(), 1);
    assert_eq!(report.diagnostics().len(), 1);
    assert_eq!(report.diagnostics()[0].variant, VariantId::BaseThreads);
    assert_eq!(report.diagnostics()[0].reason, SkipReason::UnsupportedVariant);
}

#[test]
fn test_set_up_failure_skips_rest_of_kernel() {
    let memory = MemorySpaceManager::new().with_allocator(Arc::new(ExhaustedDevice));
    let mut runner = SuiteRunner::with_memory(small_params(), memory);
    runner.add_kernel(TestKernel::all("Test_First").boxed());
    runner.add_kernel(TestKernel::all("Test_Second").boxed());

    let report = runner.run().unwrap();

    // Seq and Threads run on the host; the first GPU variant fails to allocate.
    for kernel in ["Test_First", "Test_Second"] {
        assert_eq!(report.records_for(kernel).count(), 6, "{kernel}");
    }
    assert_eq!(report.diagnostics().len(), 2);
    for diagnostic in report.diagnostics() {
        assert_eq!(diagnostic.variant, VariantId::BaseGpuLaunch);
        assert!(matches!(diagnostic.reason, SkipReason::SetUpFailed { .. }));
    }
    assert!(runner.memory().is_balanced());
}

#[test]
fn test_run_failure_halts_suite() {
    let mut runner = SuiteRunner::new(small_params());
    runner.add_kernel(TestKernel::all("Test_Untimed").untimed().boxed());
    runner.add_kernel(TestKernel::all("Test_Never").boxed());

    for _ in 0..2 {
        // The failing kernel is torn down, so a second run fails the same way.
        let err = runner.run().unwrap_err();
        match err {
            Error::KernelFailure { kernel, variant, operation, source } => {
                assert_eq!(kernel, "Test_Untimed");
                assert_eq!(variant, VariantId::BaseSeq);
                assert_eq!(operation, Operation::RunVariant);
                assert!(matches!(*source, Error::Timer { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(runner.memory().is_balanced());
        assert_eq!(runner.kernels()[0].state(), LifecycleState::DataTornDown);
        assert_eq!(runner.kernels()[1].state(), LifecycleState::Uninitialized);
    }
}

#[test]
fn test_elapsed_grows_with_repetitions() {
    let run = |rep_factor: f64| {
        let params = RunParams::builder().rep_factor(rep_factor).variants(VariantSet::only(VariantId::BaseSeq)).build().unwrap();
        let report = runner(params).run().unwrap();
        report.record("Test_AXPY", VariantId::BaseSeq, "default").unwrap().clone()
    };

    let short = run(1.0);
    let long = run(100.0);

    assert_eq!(short.reps, 5);
    assert_eq!(long.reps, 500);
    assert_eq!(short.problem_size, long.problem_size);
    assert!(long.elapsed >= short.elapsed, "{:?} < {:?}", long.elapsed, short.elapsed);
}

#[test]
fn test_kernel_selection() {
    let params = RunParams::builder().size_factor(0.1).kernels(vec!["Test_B".to_string()]).build().unwrap();
    let mut runner = SuiteRunner::new(params);
    runner.add_kernel(TestKernel::all("Test_A").boxed());
    runner.add_kernel(TestKernel::all("Test_B").boxed());

    let report = runner.run().unwrap();
    assert!(report.records().iter().all(|r| r.kernel == "Test_B"));
    assert!(!report.records().is_empty());
}

#[test]
fn test_multiple_passes_average_checksum() {
    let variants = VariantId::BaseSeq | VariantId::BaseGpuOffload;
    let single = RunParams::builder().size_factor(0.1).variants(variants).build().unwrap();
    let triple = RunParams::builder().size_factor(0.1).npasses(3).variants(variants).build().unwrap();

    let one = runner(single).run().unwrap();
    let three = runner(triple).run().unwrap();

    for (a, b) in one.records().iter().zip(three.records()) {
        assert_eq!(b.timing.passes(), 3);
        assert!(b.timing.min <= b.timing.mean);
        assert!((a.checksum - b.checksum).abs() <= 1e-9 * a.checksum.abs());
    }
}

#[test]
fn test_report_reaches_sink() {
    let mut sink = CollectingSink::default();
    runner(small_params()).run_into(&mut sink).unwrap();

    let report = sink.last().unwrap();
    assert_eq!(report.records().len(), 24);
    assert!(report.data_init_count() > 0);
}
