//! Kernel descriptions and the per-kernel lifecycle.
//!
//! A benchmark kernel is a [`KernelBody`]: it owns its arrays and knows how to
//! set them up, run one variant over them, checksum its outputs and release
//! them. [`KernelInstance`] wraps a body and enforces the order in which the
//! suite may call those hooks:
//!
//! ```text
//! Uninitialized --set_up--> DataReady --run_variant--> Running --> DataReady
//!                                |  \--update_checksum (once per run)
//!                                \--tear_down--> DataTornDown | ChecksumRecorded --set_up--> ...
//! ```

use std::time::Duration;

use bon::bon;
use perfsuite_device::{MemorySpace, MemorySpaceManager, Real, SpaceArray};
use snafu::ResultExt;
use tracing::{debug, trace, warn};

use crate::checksum::{ChecksumAccumulator, ChecksumSlot, calc_checksum};
use crate::error::{DeviceSnafu, LifecycleSnafu, Result, TimerSnafu};
use crate::exec::{Dispatch, Step};
use crate::params::RunParams;
use crate::timer::Timer;
use crate::tuning::{DEFAULT_GPU_BLOCK_SIZES, Tuning};
use crate::variant::{ExecutionFamily, VariantId, VariantSet};

/// Lifecycle states of a [`KernelInstance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(strum::Display, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LifecycleState {
    Uninitialized,
    DataReady,
    Running,
    DataTornDown,
    ChecksumRecorded,
}

/// Lifecycle operations, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(strum::Display, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operation {
    #[strum(serialize = "setUp")]
    SetUp,
    #[strum(serialize = "runVariant")]
    RunVariant,
    #[strum(serialize = "updateChecksum")]
    UpdateChecksum,
    #[strum(serialize = "tearDown")]
    TearDown,
}

/// Static description of a kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelInfo {
    pub id: u32,
    pub name: String,
    /// Problem size at size factor 1.
    pub default_size: usize,
    /// Repetitions per timed pass at rep factor 1.
    pub default_reps: usize,
    /// Variants this kernel implements.
    pub variants: VariantSet,
    /// Block-size candidates of the GPU-launch family.
    pub gpu_block_sizes: Vec<usize>,
    /// Multiplier applied inside the checksum.
    pub checksum_scale: Real,
    /// Relative tolerance overriding the suite default.
    pub checksum_tolerance: Option<f64>,
}

#[bon]
impl KernelInfo {
    #[builder]
    pub fn builder(
        id: u32,
        #[builder(into)] name: String,
        default_size: usize,
        default_reps: usize,
        variants: VariantSet,
        #[builder(default = DEFAULT_GPU_BLOCK_SIZES.to_vec())] gpu_block_sizes: Vec<usize>,
        #[builder(default = 1.0)] checksum_scale: Real,
        checksum_tolerance: Option<f64>,
    ) -> Self {
        Self { id, name, default_size, default_reps, variants, gpu_block_sizes, checksum_scale, checksum_tolerance }
    }

    pub fn supports(&self, variant: VariantId) -> bool {
        self.variants.contains(variant)
    }

    pub fn tolerance(&self, params: &RunParams) -> f64 {
        self.checksum_tolerance.unwrap_or(params.checksum_tolerance)
    }
}

/// Space the arrays of `variant` live in.
pub fn memory_space_for(variant: VariantId, params: &RunParams) -> MemorySpace {
    match variant.family() {
        ExecutionFamily::Seq | ExecutionFamily::Threads => MemorySpace::Host,
        ExecutionFamily::GpuLaunch | ExecutionFamily::GpuOffload => params.gpu_memory_space,
    }
}

// ============================================================================
// HOOK CONTEXTS
// ============================================================================

/// Everything a kernel needs to allocate, initialize or checksum its data.
#[derive(Debug, Clone, Copy)]
pub struct DataContext<'a> {
    memory: &'a MemorySpaceManager,
    params: &'a RunParams,
    space: MemorySpace,
    variant: VariantId,
}

impl<'a> DataContext<'a> {
    pub fn new(memory: &'a MemorySpaceManager, params: &'a RunParams, variant: VariantId) -> Self {
        Self { memory, params, space: memory_space_for(variant, params), variant }
    }

    pub fn memory(&self) -> &'a MemorySpaceManager {
        self.memory
    }

    pub fn params(&self) -> &'a RunParams {
        self.params
    }

    pub fn space(&self) -> MemorySpace {
        self.space
    }

    pub fn variant(&self) -> VariantId {
        self.variant
    }

    /// `default_size` scaled by the size factor.
    pub fn target_size(&self, default_size: usize) -> usize {
        self.params.target_size(default_size)
    }

    pub fn alloc_and_init_data(&self, len: usize, factor: Real) -> Result<SpaceArray> {
        self.memory.alloc_and_init_data(self.space, len, factor).context(DeviceSnafu)
    }

    pub fn alloc_and_init_const(&self, len: usize, value: Real) -> Result<SpaceArray> {
        self.memory.alloc_and_init_const(self.space, len, value).context(DeviceSnafu)
    }

    /// Overwrite an existing array from host values.
    pub fn reinit(&self, array: &mut SpaceArray, host: &[Real]) {
        self.memory.initialize_from_host(array, host);
    }

    /// Checksum of `array`, read back to the host first.
    pub fn checksum(&self, array: &SpaceArray, scale: Real) -> f64 {
        calc_checksum(&self.memory.to_host_vec(array), scale)
    }

    pub fn free(&self, array: SpaceArray) {
        self.memory.free(array);
    }
}

/// Execution context of one `run` hook.
///
/// A run has exactly one timed region, opened by [`RunContext::run_timed`].
/// Everything outside that call is excluded from the measurement.
pub struct RunContext<'a> {
    variant: VariantId,
    tuning: &'a Tuning,
    reps: usize,
    space: MemorySpace,
    memory: &'a MemorySpaceManager,
    timer: Timer,
    elapsed: Option<Duration>,
}

impl<'a> RunContext<'a> {
    pub fn variant(&self) -> VariantId {
        self.variant
    }

    pub fn tuning(&self) -> &Tuning {
        self.tuning
    }

    pub fn reps(&self) -> usize {
        self.reps
    }

    pub fn space(&self) -> MemorySpace {
        self.space
    }

    /// Time `reps` repetitions of `step` over `out`.
    ///
    /// GPU families synchronize the device before the timer stops.
    pub fn run_timed<S: Step>(&mut self, out: &mut SpaceArray, step: S) -> Result<()> {
        snafu::ensure!(self.elapsed.is_none(), TimerSnafu { reason: "run already recorded its timed region" });

        let dispatch = Dispatch::new(self.variant, self.tuning);
        let view = out.kernel_view_mut();

        self.timer.start()?;
        for _ in 0..self.reps {
            dispatch.forall(view, &step);
        }
        let synced =
            if self.variant.family().is_gpu() { self.memory.synchronize(self.space).context(DeviceSnafu) } else { Ok(()) };
        let elapsed = self.timer.stop()?;
        synced?;

        trace!(variant = %self.variant, tuning = %self.tuning, reps = self.reps, ?elapsed, "timed region");
        self.elapsed = Some(elapsed);
        Ok(())
    }
}

// ============================================================================
// KERNEL BODY
// ============================================================================

/// One benchmark kernel.
pub trait KernelBody: Send {
    fn info(&self) -> &KernelInfo;

    /// Allocate and initialize every array for `data.variant()`.
    fn set_up(&mut self, data: &DataContext<'_>) -> Result<()>;

    /// Restore initial values before a repeated run on the same data.
    ///
    /// The default releases and re-creates the arrays.
    fn reset(&mut self, data: &DataContext<'_>) -> Result<()> {
        self.tear_down(data);
        self.set_up(data)
    }

    /// Execute the variant once, opening one timed region through `ctx`.
    fn run(&mut self, ctx: &mut RunContext<'_>) -> Result<()>;

    /// Checksum of the outputs of the last run.
    fn checksum(&self, data: &DataContext<'_>) -> Result<f64>;

    /// Release every array.
    fn tear_down(&mut self, data: &DataContext<'_>);

    /// Problem size of the current data; zero when no data is set up.
    fn problem_size(&self) -> usize;
}

// ============================================================================
// LIFECYCLE
// ============================================================================

/// Outcome of [`KernelInstance::run_variant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { elapsed: Duration, reps: usize },
    Unsupported,
}

#[derive(Debug)]
struct ActiveData {
    variant: VariantId,
    runs: usize,
    pending: Option<Tuning>,
    checksums: usize,
}

/// A kernel together with its lifecycle state and checksums.
pub struct KernelInstance {
    body: Box<dyn KernelBody>,
    state: LifecycleState,
    active: Option<ActiveData>,
    checksums: ChecksumAccumulator,
}

impl KernelInstance {
    pub fn new(body: Box<dyn KernelBody>) -> Self {
        Self { body, state: LifecycleState::Uninitialized, active: None, checksums: ChecksumAccumulator::default() }
    }

    pub fn info(&self) -> &KernelInfo {
        self.body.info()
    }

    pub fn name(&self) -> &str {
        &self.body.info().name
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn supports(&self, variant: VariantId) -> bool {
        self.body.info().supports(variant)
    }

    pub fn problem_size(&self) -> usize {
        self.body.problem_size()
    }

    /// Accumulated checksum of one (variant, tuning).
    pub fn checksum(&self, variant: VariantId, tuning: &str) -> Option<ChecksumSlot> {
        self.checksums.get(variant, tuning)
    }

    pub fn checksums(&self) -> &ChecksumAccumulator {
        &self.checksums
    }

    fn lifecycle_error<T>(&self, operation: Operation) -> Result<T> {
        LifecycleSnafu { kernel: self.name(), operation, state: self.state }.fail()
    }

    fn active_for(&mut self, variant: VariantId, operation: Operation) -> Result<&mut ActiveData> {
        let kernel = self.body.info().name.clone();
        let state = self.state;
        match self.active.as_mut() {
            Some(active) if state == LifecycleState::DataReady && active.variant == variant => Ok(active),
            _ => LifecycleSnafu { kernel, operation, state }.fail(),
        }
    }

    /// Allocate and initialize data for `variant`.
    ///
    /// On failure nothing stays allocated and the instance stays where it was.
    #[tracing::instrument(skip_all, fields(kernel = %self.name(), variant = %variant))]
    pub fn set_up(&mut self, variant: VariantId, memory: &MemorySpaceManager, params: &RunParams) -> Result<()> {
        match self.state {
            LifecycleState::Uninitialized | LifecycleState::DataTornDown | LifecycleState::ChecksumRecorded => {}
            LifecycleState::DataReady | LifecycleState::Running => return self.lifecycle_error(Operation::SetUp),
        }

        let data = DataContext::new(memory, params, variant);
        if let Err(error) = self.body.set_up(&data) {
            self.body.tear_down(&data);
            return Err(error);
        }

        debug!(space = %data.space(), size = self.body.problem_size(), "data set up");
        self.active = Some(ActiveData { variant, runs: 0, pending: None, checksums: 0 });
        self.state = LifecycleState::DataReady;
        Ok(())
    }

    /// Execute `variant` once under `tuning`.
    ///
    /// An unsupported variant is not an error: nothing runs and
    /// [`RunOutcome::Unsupported`] is returned.
    pub fn run_variant(
        &mut self,
        variant: VariantId,
        tuning: &Tuning,
        memory: &MemorySpaceManager,
        params: &RunParams,
    ) -> Result<RunOutcome> {
        let runs = {
            let active = self.active_for(variant, Operation::RunVariant)?;
            if active.pending.is_some() {
                let kernel = self.body.info().name.clone();
                return LifecycleSnafu { kernel, operation: Operation::RunVariant, state: self.state }.fail();
            }
            active.runs
        };

        if !self.supports(variant) {
            warn!(kernel = %self.name(), variant = %variant, "variant not implemented");
            return Ok(RunOutcome::Unsupported);
        }

        let data = DataContext::new(memory, params, variant);
        if runs > 0 {
            self.body.reset(&data)?;
        }

        let reps = params.run_reps(self.body.info().default_reps);
        let mut ctx = RunContext {
            variant,
            tuning,
            reps,
            space: data.space(),
            memory,
            timer: Timer::new(),
            elapsed: None,
        };

        self.state = LifecycleState::Running;
        let result = self.body.run(&mut ctx);
        self.state = LifecycleState::DataReady;
        result?;

        let elapsed = match ctx.elapsed {
            Some(elapsed) => elapsed,
            None => return TimerSnafu { reason: format!("kernel '{}' ran without a timed region", self.name()) }.fail(),
        };

        if let Some(active) = self.active.as_mut() {
            active.runs += 1;
            active.pending = Some(tuning.clone());
        }
        Ok(RunOutcome::Completed { elapsed, reps })
    }

    /// Fold the outputs of the last run into the checksum of its tuning.
    pub fn update_checksum(&mut self, variant: VariantId, memory: &MemorySpaceManager, params: &RunParams) -> Result<f64> {
        let kernel = self.body.info().name.clone();
        let state = self.state;
        let tuning = match self.active_for(variant, Operation::UpdateChecksum)?.pending.take() {
            Some(tuning) => tuning,
            None => return LifecycleSnafu { kernel, operation: Operation::UpdateChecksum, state }.fail(),
        };

        let value = self.body.checksum(&DataContext::new(memory, params, variant))?;
        self.checksums.accumulate(variant, tuning.name(), value);
        if let Some(active) = self.active.as_mut() {
            active.checksums += 1;
        }

        trace!(kernel = %kernel, variant = %variant, tuning = %tuning, checksum = value, "checksum updated");
        Ok(value)
    }

    /// Release the data of `variant`.
    pub fn tear_down(&mut self, variant: VariantId, memory: &MemorySpaceManager, params: &RunParams) -> Result<()> {
        let active = self.active_for(variant, Operation::TearDown)?;
        if let Some(tuning) = &active.pending {
            warn!(tuning = %tuning, "tearing down with an unchecked run");
        }
        let recorded = active.checksums > 0;

        self.body.tear_down(&DataContext::new(memory, params, variant));
        self.active = None;
        self.state = if recorded { LifecycleState::ChecksumRecorded } else { LifecycleState::DataTornDown };
        debug!(kernel = %self.name(), variant = %variant, state = %self.state, "data torn down");
        Ok(())
    }
}

impl std::fmt::Debug for KernelInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelInstance")
            .field("name", &self.name())
            .field("state", &self.state)
            .field("active", &self.active)
            .finish()
    }
}
