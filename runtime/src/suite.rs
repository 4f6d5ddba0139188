//! Suite orchestration.
//!
//! For each selected kernel, each requested variant and each valid tuning the
//! runner performs `set_up`, then `npasses` rounds of `run_variant` +
//! `update_checksum`, then `tear_down`, and appends one [`ResultRecord`].
//! Kernels run strictly one after another.

use perfsuite_device::{MemorySpaceManager, reset_data_init_count};
use snafu::ResultExt;
use tracing::{debug, info, warn};

use crate::error::{Error, KernelFailureSnafu, LifecycleSnafu, ResourceLeakSnafu, Result};
use crate::kernel::{KernelBody, KernelInstance, Operation, RunOutcome};
use crate::params::RunParams;
use crate::report::{Diagnostic, ReportSink, ResultRecord, SkipReason, SuiteReport};
use crate::timer::TimingStats;
use crate::tuning::{Tuning, tunings_for};
use crate::variant::VariantId;

/// Drives a set of kernels through their lifecycles.
#[derive(Debug)]
pub struct SuiteRunner {
    params: RunParams,
    memory: MemorySpaceManager,
    kernels: Vec<KernelInstance>,
}

impl SuiteRunner {
    pub fn new(params: RunParams) -> Self {
        Self::with_memory(params, MemorySpaceManager::new())
    }

    /// Runner allocating through `memory`.
    pub fn with_memory(params: RunParams, memory: MemorySpaceManager) -> Self {
        Self { params, memory, kernels: Vec::new() }
    }

    pub fn add_kernel(&mut self, body: Box<dyn KernelBody>) -> &mut Self {
        self.kernels.push(KernelInstance::new(body));
        self
    }

    pub fn add_kernels(&mut self, bodies: impl IntoIterator<Item = Box<dyn KernelBody>>) -> &mut Self {
        self.kernels.extend(bodies.into_iter().map(KernelInstance::new));
        self
    }

    pub fn params(&self) -> &RunParams {
        &self.params
    }

    pub fn memory(&self) -> &MemorySpaceManager {
        &self.memory
    }

    pub fn kernels(&self) -> &[KernelInstance] {
        &self.kernels
    }

    /// Run every selected kernel and hand the report to `sink`.
    pub fn run_into(&mut self, sink: &mut dyn ReportSink) -> Result<()> {
        let report = self.run()?;
        sink.receive(&report)
    }

    /// Run every selected kernel.
    ///
    /// Skips are reported as diagnostics. Any other failure stops the suite and
    /// is returned as [`Error::KernelFailure`].
    #[tracing::instrument(skip_all, fields(kernels = self.kernels.len()))]
    pub fn run(&mut self) -> Result<SuiteReport> {
        reset_data_init_count();
        let mut report = SuiteReport::default();
        let inits_before = self.memory.initialization_count();

        let Self { params, memory, kernels } = self;
        for kernel in kernels.iter_mut().filter(|kernel| params.is_kernel_selected(kernel.name())) {
            run_kernel(kernel, params, memory, &mut report)?;
        }

        report.set_data_init_count(memory.initialization_count() - inits_before);
        info!(
            records = report.records().len(),
            diagnostics = report.diagnostics().len(),
            data_inits = report.data_init_count(),
            "suite finished"
        );
        Ok(report)
    }
}

fn diagnostic(kernel: &KernelInstance, variant: VariantId, reason: SkipReason) -> Diagnostic {
    warn!(kernel = %kernel.name(), variant = %variant, reason = %reason, "skipping");
    Diagnostic { kernel_id: kernel.info().id, kernel: kernel.name().to_string(), variant, reason }
}

fn run_kernel(
    kernel: &mut KernelInstance,
    params: &RunParams,
    memory: &MemorySpaceManager,
    report: &mut SuiteReport,
) -> Result<()> {
    let requested: Vec<VariantId> = match params.variants {
        Some(set) => set.iter().collect(),
        None => kernel.info().variants.iter().collect(),
    };
    debug!(kernel = %kernel.name(), variants = requested.len(), "running kernel");

    for variant in requested {
        if !kernel.supports(variant) {
            report.push_diagnostic(diagnostic(kernel, variant, SkipReason::UnsupportedVariant));
            continue;
        }

        let tunings = tunings_for(variant, &kernel.info().gpu_block_sizes, params);
        if tunings.is_empty() {
            report.push_diagnostic(diagnostic(kernel, variant, SkipReason::NoValidTuning));
            continue;
        }

        match kernel.set_up(variant, memory, params) {
            Ok(()) => {}
            Err(Error::Device { source }) => {
                let reason = SkipReason::SetUpFailed { message: source.to_string() };
                report.push_diagnostic(diagnostic(kernel, variant, reason));
                return Ok(());
            }
            Err(source) => {
                return Err(source).context(KernelFailureSnafu {
                    kernel: kernel.name(),
                    variant,
                    operation: Operation::SetUp,
                });
            }
        }

        for tuning in &tunings {
            match measure(kernel, variant, tuning, params, memory) {
                Ok(record) => report.push_record(record),
                Err(error) => {
                    release_after_failure(kernel, variant, params, memory);
                    return Err(error);
                }
            }
        }

        kernel.tear_down(variant, memory, params).context(KernelFailureSnafu {
            kernel: kernel.name(),
            variant,
            operation: Operation::TearDown,
        })?;

        let live = memory.live_arrays();
        snafu::ensure!(live == 0, ResourceLeakSnafu { kernel: kernel.name(), variant, live });
    }
    Ok(())
}

/// Tear down the data of a kernel whose run failed, keeping the original error.
fn release_after_failure(
    kernel: &mut KernelInstance,
    variant: VariantId,
    params: &RunParams,
    memory: &MemorySpaceManager,
) {
    if let Err(error) = kernel.tear_down(variant, memory, params) {
        warn!(kernel = %kernel.name(), variant = %variant, error = %error, "tear-down after failure failed");
    }
}

/// All passes of one tuning. `variant` must be supported by `kernel`.
fn measure(
    kernel: &mut KernelInstance,
    variant: VariantId,
    tuning: &Tuning,
    params: &RunParams,
    memory: &MemorySpaceManager,
) -> Result<ResultRecord> {
    let name = kernel.name().to_string();
    let mut runs = Vec::with_capacity(params.npasses);
    let mut reps = 0;

    for _ in 0..params.npasses {
        let outcome = kernel.run_variant(variant, tuning, memory, params).context(KernelFailureSnafu {
            kernel: name.as_str(),
            variant,
            operation: Operation::RunVariant,
        })?;
        match outcome {
            RunOutcome::Completed { elapsed, reps: run_reps } => {
                runs.push(elapsed);
                reps = run_reps;
            }
            // Support was checked before set-up.
            RunOutcome::Unsupported => {
                return LifecycleSnafu { kernel: name, operation: Operation::RunVariant, state: kernel.state() }.fail();
            }
        }

        kernel.update_checksum(variant, memory, params).context(KernelFailureSnafu {
            kernel: name.as_str(),
            variant,
            operation: Operation::UpdateChecksum,
        })?;
    }

    let checksum = kernel.checksum(variant, tuning.name()).map(|slot| slot.mean()).unwrap_or_default();
    let timing = TimingStats::from_runs(runs);
    debug!(kernel = %name, variant = %variant, tuning = %tuning, total = ?timing.total, checksum, "measured");

    Ok(ResultRecord {
        kernel_id: kernel.info().id,
        kernel: name,
        variant,
        tuning: tuning.name().to_string(),
        elapsed: timing.total,
        timing,
        checksum,
        checksum_tolerance: kernel.info().tolerance(params),
        problem_size: kernel.problem_size(),
        reps,
    })
}
