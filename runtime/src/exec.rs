//! Loop execution for every (style, family) pair.
//!
//! Kernel bodies are element-wise: a [`Step`] maps `(index, current value)` to
//! the new value of one output element. The three implementation styles run
//! the same step through different code paths:
//!
//! * **Base** writes each family's loop inline around the step.
//! * **Lambda** erases the step into a `&dyn Fn` and launches that.
//! * **Library** hands the step to an [`ExecPolicy`] value via [`forall`].
//!
//! GPU families are emulated on the host thread pool. A launch covers the
//! output with a flat grid of `ceil(n / block_size)` blocks, each block owning
//! a contiguous run of indices; offload splits the output statically across
//! [`OFFLOAD_TEAMS`] teams.

use perfsuite_device::Real;
use rayon::prelude::*;

use crate::tuning::{DEFAULT_GPU_BLOCK_SIZE, Tuning};
use crate::variant::{ExecutionFamily, ImplStyle, VariantId};

/// Team count of the offload family.
pub const OFFLOAD_TEAMS: usize = 256;

/// Element-wise kernel body.
pub trait Step: Sync {
    fn apply(&self, index: usize, current: Real) -> Real;
}

impl<F> Step for F
where
    F: Fn(usize, Real) -> Real + Sync + ?Sized,
{
    #[inline]
    fn apply(&self, index: usize, current: Real) -> Real {
        self(index, current)
    }
}

/// Grid shape of one emulated launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchConfig {
    pub grid_size: usize,
    pub block_size: usize,
}

impl LaunchConfig {
    /// Smallest grid of `block_size` blocks covering `len` elements.
    pub fn for_len(len: usize, block_size: usize) -> Self {
        let block_size = block_size.max(1);
        Self { grid_size: len.div_ceil(block_size), block_size }
    }
}

// ============================================================================
// LIBRARY STYLE
// ============================================================================

/// Execution policy of the library style.
pub trait ExecPolicy: Sync {
    fn forall<S: Step + ?Sized>(&self, out: &mut [Real], step: &S);
}

/// Sequential policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeqExec;

/// Worker-pool policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadExec;

/// Grid-launch policy.
#[derive(Debug, Clone, Copy)]
pub struct GpuExec {
    pub block_size: usize,
}

/// Team-offload policy.
#[derive(Debug, Clone, Copy)]
pub struct OffloadExec {
    pub teams: usize,
}

impl ExecPolicy for SeqExec {
    fn forall<S: Step + ?Sized>(&self, out: &mut [Real], step: &S) {
        out.iter_mut().enumerate().for_each(|(i, value)| *value = step.apply(i, *value));
    }
}

impl ExecPolicy for ThreadExec {
    fn forall<S: Step + ?Sized>(&self, out: &mut [Real], step: &S) {
        out.par_iter_mut().enumerate().for_each(|(i, value)| *value = step.apply(i, *value));
    }
}

impl ExecPolicy for GpuExec {
    fn forall<S: Step + ?Sized>(&self, out: &mut [Real], step: &S) {
        let config = LaunchConfig::for_len(out.len(), self.block_size);
        launch_grid(out, config, step);
    }
}

impl ExecPolicy for OffloadExec {
    fn forall<S: Step + ?Sized>(&self, out: &mut [Real], step: &S) {
        offload_teams(out, self.teams, step);
    }
}

/// Run `step` over every element of `out` under `policy`.
pub fn forall<P: ExecPolicy, S: Step + ?Sized>(policy: &P, out: &mut [Real], step: &S) {
    policy.forall(out, step);
}

// ============================================================================
// EMULATED DEVICE LAUNCHES
// ============================================================================

fn launch_grid<S: Step + ?Sized>(out: &mut [Real], config: LaunchConfig, step: &S) {
    let block_size = config.block_size;
    out.par_chunks_mut(block_size).enumerate().for_each(|(block_idx, block)| {
        for (thread_idx, value) in block.iter_mut().enumerate() {
            let i = block_idx * block_size + thread_idx;
            *value = step.apply(i, *value);
        }
    });
}

fn offload_teams<S: Step + ?Sized>(out: &mut [Real], teams: usize, step: &S) {
    let chunk = out.len().div_ceil(teams.max(1)).max(1);
    out.par_chunks_mut(chunk).enumerate().for_each(|(team, elements)| {
        for (k, value) in elements.iter_mut().enumerate() {
            let i = team * chunk + k;
            *value = step.apply(i, *value);
        }
    });
}

/// Lambda-style launch: every thread of the grid evaluates the erased body for
/// its global index, guarded against the tail of the last block.
fn lambda_launch(out: &mut [Real], config: LaunchConfig, body: &(dyn Fn(usize, Real) -> Real + Sync)) {
    let iend = out.len();
    let block_size = config.block_size;
    out.par_chunks_mut(block_size).enumerate().for_each(|(block_idx, block)| {
        for thread_idx in 0..block_size {
            let i = block_idx * block_size + thread_idx;
            if i < iend {
                let slot = &mut block[thread_idx];
                *slot = body(i, *slot);
            }
        }
    });
}

// ============================================================================
// DISPATCH
// ============================================================================

/// Selects the code path of one (variant, tuning).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    style: ImplStyle,
    family: ExecutionFamily,
    block_size: usize,
}

impl Dispatch {
    pub fn new(variant: VariantId, tuning: &Tuning) -> Self {
        Self {
            style: variant.style(),
            family: variant.family(),
            block_size: tuning.block_size().unwrap_or(DEFAULT_GPU_BLOCK_SIZE),
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Run `step` once over `out`.
    pub fn forall<S: Step>(&self, out: &mut [Real], step: &S) {
        match self.style {
            ImplStyle::Base => self.base(out, step),
            ImplStyle::Lambda => {
                let body = |i: usize, value: Real| step.apply(i, value);
                self.lambda(out, &body);
            }
            ImplStyle::Library => self.library(out, step),
        }
    }

    fn base<S: Step>(&self, out: &mut [Real], step: &S) {
        match self.family {
            ExecutionFamily::Seq => {
                for i in 0..out.len() {
                    out[i] = step.apply(i, out[i]);
                }
            }
            ExecutionFamily::Threads => {
                out.par_iter_mut().enumerate().for_each(|(i, value)| *value = step.apply(i, *value));
            }
            ExecutionFamily::GpuLaunch => launch_grid(out, LaunchConfig::for_len(out.len(), self.block_size), step),
            ExecutionFamily::GpuOffload => offload_teams(out, OFFLOAD_TEAMS, step),
        }
    }

    fn lambda(&self, out: &mut [Real], body: &(dyn Fn(usize, Real) -> Real + Sync)) {
        match self.family {
            ExecutionFamily::Seq => {
                for (i, value) in out.iter_mut().enumerate() {
                    *value = body(i, *value);
                }
            }
            ExecutionFamily::Threads => {
                out.par_iter_mut().enumerate().for_each(|(i, value)| *value = body(i, *value));
            }
            ExecutionFamily::GpuLaunch => lambda_launch(out, LaunchConfig::for_len(out.len(), self.block_size), body),
            ExecutionFamily::GpuOffload => offload_teams(out, OFFLOAD_TEAMS, body),
        }
    }

    fn library<S: Step>(&self, out: &mut [Real], step: &S) {
        match self.family {
            ExecutionFamily::Seq => forall(&SeqExec, out, step),
            ExecutionFamily::Threads => forall(&ThreadExec, out, step),
            ExecutionFamily::GpuLaunch => forall(&GpuExec { block_size: self.block_size }, out, step),
            ExecutionFamily::GpuOffload => forall(&OffloadExec { teams: OFFLOAD_TEAMS }, out, step),
        }
    }
}
