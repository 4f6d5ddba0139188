//! `C = beta * C + alpha * A * B` with row-major `A: ni×nk`, `B: nk×nj`, `C: ni×nj`.
//!
//! Each output element is computed independently by one loop iteration, so
//! the element-wise dispatcher drives the whole product.

use perfsuite_device::{Real, SpaceArray};
use perfsuite_runtime::{
    DataContext, ExecutionFamily, ImplStyle, KernelBody, KernelInfo, MissingDataSnafu, Result, RunContext,
    variant_set,
};
use snafu::OptionExt;

use crate::KernelId;

const ID: KernelId = KernelId::PolybenchGemm;
const DEFAULT_EDGE: usize = 1000;
const DEFAULT_REPS: usize = 4;

pub(crate) const ALPHA: Real = 0.62;
pub(crate) const BETA: Real = 1.002;

/// Matrix extents. Edges scale with the square root of the size factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GemmShape {
    pub ni: usize,
    pub nj: usize,
    pub nk: usize,
}

impl GemmShape {
    pub fn for_size_factor(size_factor: f64) -> Self {
        let edge = ((DEFAULT_EDGE as f64) * size_factor.sqrt()).round().max(1.0) as usize;
        Self { ni: edge, nj: edge, nk: edge }
    }
}

struct Matrices {
    a: SpaceArray,
    b: SpaceArray,
    c: SpaceArray,
    shape: GemmShape,
}

pub struct Gemm {
    info: KernelInfo,
    data: Option<Matrices>,
}

impl Gemm {
    pub fn new() -> Self {
        let variants = variant_set(
            &[ImplStyle::Base, ImplStyle::Lambda, ImplStyle::Library],
            &[ExecutionFamily::Seq, ExecutionFamily::Threads, ExecutionFamily::GpuLaunch],
        ) | variant_set(&[ImplStyle::Base, ImplStyle::Library], &[ExecutionFamily::GpuOffload]);

        let info = KernelInfo::builder()
            .id(ID as u32)
            .name(ID.name())
            .default_size(DEFAULT_EDGE * DEFAULT_EDGE)
            .default_reps(DEFAULT_REPS)
            .variants(variants)
            .checksum_scale(1.0e-3)
            .build();
        Self { info, data: None }
    }
}

impl Default for Gemm {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelBody for Gemm {
    fn info(&self) -> &KernelInfo {
        &self.info
    }

    fn set_up(&mut self, data: &DataContext<'_>) -> Result<()> {
        let shape = GemmShape::for_size_factor(data.params().size_factor);
        let a = data.alloc_and_init_data(shape.ni * shape.nk, 0.5)?;
        let b = data.alloc_and_init_data(shape.nk * shape.nj, 0.25)?;
        let c = data.alloc_and_init_data(shape.ni * shape.nj, 1.0)?;
        self.data = Some(Matrices { a, b, c, shape });
        Ok(())
    }

    fn run(&mut self, ctx: &mut RunContext<'_>) -> Result<()> {
        let Matrices { a, b, c, shape } = self.data.as_mut().context(MissingDataSnafu { kernel: ID.name() })?;
        let (a, b) = (a.kernel_view(), b.kernel_view());
        let GemmShape { nj, nk, .. } = *shape;

        ctx.run_timed(c, |index: usize, cij: Real| {
            let (i, j) = (index / nj, index % nj);
            let mut dot = cij * BETA;
            for k in 0..nk {
                dot += ALPHA * a[i * nk + k] * b[k * nj + j];
            }
            dot
        })
    }

    fn checksum(&self, data: &DataContext<'_>) -> Result<f64> {
        let matrices = self.data.as_ref().context(MissingDataSnafu { kernel: ID.name() })?;
        Ok(data.checksum(&matrices.c, self.info.checksum_scale))
    }

    fn tear_down(&mut self, data: &DataContext<'_>) {
        if let Some(matrices) = self.data.take() {
            data.free(matrices.a);
            data.free(matrices.b);
            data.free(matrices.c);
        }
    }

    fn problem_size(&self) -> usize {
        self.data.as_ref().map_or(0, |matrices| matrices.c.len())
    }
}
