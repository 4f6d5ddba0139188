//! `array[i, j, k] = 1e-8 * i * j * k` over a cube.
//!
//! The cube edge scales with the cube root of the size factor so the element
//! count scales linearly.

use perfsuite_device::{Real, SpaceArray};
use perfsuite_runtime::{
    DataContext, ExecutionFamily, ImplStyle, KernelBody, KernelInfo, MissingDataSnafu, Result, RunContext,
    variant_set,
};
use snafu::OptionExt;

use crate::KernelId;

const ID: KernelId = KernelId::BasicNestedInit;
const DEFAULT_EDGE: usize = 100;
const DEFAULT_REPS: usize = 1000;

/// Extents `(ni, nj, nk)`; `i` varies fastest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extents {
    pub ni: usize,
    pub nj: usize,
    pub nk: usize,
}

impl Extents {
    pub fn for_size_factor(size_factor: f64) -> Self {
        let edge = ((DEFAULT_EDGE as f64) * size_factor.cbrt()).round().max(1.0) as usize;
        Self { ni: edge, nj: edge, nk: edge }
    }

    pub fn len(&self) -> usize {
        self.ni * self.nj * self.nk
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(i, j, k)` of a flat index.
    pub fn decode(&self, index: usize) -> (usize, usize, usize) {
        (index % self.ni, (index / self.ni) % self.nj, index / (self.ni * self.nj))
    }
}

struct Cube {
    array: SpaceArray,
    extents: Extents,
}

pub struct NestedInit {
    info: KernelInfo,
    data: Option<Cube>,
}

impl NestedInit {
    pub fn new() -> Self {
        let variants = variant_set(
            &[ImplStyle::Base, ImplStyle::Lambda, ImplStyle::Library],
            &[ExecutionFamily::Seq, ExecutionFamily::Threads, ExecutionFamily::GpuLaunch],
        ) | variant_set(&[ImplStyle::Base, ImplStyle::Library], &[ExecutionFamily::GpuOffload]);

        let info = KernelInfo::builder()
            .id(ID as u32)
            .name(ID.name())
            .default_size(DEFAULT_EDGE * DEFAULT_EDGE * DEFAULT_EDGE)
            .default_reps(DEFAULT_REPS)
            .variants(variants)
            .build();
        Self { info, data: None }
    }
}

impl Default for NestedInit {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelBody for NestedInit {
    fn info(&self) -> &KernelInfo {
        &self.info
    }

    fn set_up(&mut self, data: &DataContext<'_>) -> Result<()> {
        let extents = Extents::for_size_factor(data.params().size_factor);
        let array = data.alloc_and_init_const(extents.len(), 0.0)?;
        self.data = Some(Cube { array, extents });
        Ok(())
    }

    fn run(&mut self, ctx: &mut RunContext<'_>) -> Result<()> {
        let Cube { array, extents } = self.data.as_mut().context(MissingDataSnafu { kernel: ID.name() })?;
        let extents = *extents;
        ctx.run_timed(array, move |index: usize, _: Real| {
            let (i, j, k) = extents.decode(index);
            0.00000001 * i as Real * j as Real * k as Real
        })
    }

    fn checksum(&self, data: &DataContext<'_>) -> Result<f64> {
        let cube = self.data.as_ref().context(MissingDataSnafu { kernel: ID.name() })?;
        Ok(data.checksum(&cube.array, self.info.checksum_scale))
    }

    fn tear_down(&mut self, data: &DataContext<'_>) {
        if let Some(cube) = self.data.take() {
            data.free(cube.array);
        }
    }

    fn problem_size(&self) -> usize {
        self.data.as_ref().map_or(0, |cube| cube.extents.len())
    }
}
