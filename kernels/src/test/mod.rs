pub mod unit;

use perfsuite_device::MemorySpace;
use perfsuite_runtime::{RunParams, SuiteReport, SuiteRunner, VariantId};

use crate::KernelId;

/// Tiny problems and few repetitions.
pub fn small_params(space: MemorySpace) -> RunParams {
    RunParams::builder().size_factor(1.0e-3).rep_factor(1.0e-2).gpu_memory_space(space).build().unwrap()
}

/// Run one kernel through the suite driver.
pub fn run_one(id: KernelId, params: RunParams) -> SuiteReport {
    let mut runner = SuiteRunner::new(params);
    runner.add_kernel(id.create());
    let report = runner.run().unwrap();
    assert!(runner.memory().is_balanced(), "{id} leaked arrays");
    report
}

/// Checksum of the `Base_Seq` record.
pub fn base_seq_checksum(report: &SuiteReport, id: KernelId) -> f64 {
    report.record(id.name(), VariantId::BaseSeq, "default").unwrap().checksum
}
