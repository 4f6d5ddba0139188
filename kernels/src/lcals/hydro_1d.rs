//! One-dimensional hydro fragment: `x[i] = q + y[i] * (r * z[i+10] + t * z[i+11])`.

use perfsuite_device::{Real, SpaceArray, init_scalar};
use perfsuite_runtime::{
    DataContext, ExecutionFamily, ImplStyle, KernelBody, KernelInfo, MissingDataSnafu, Result, RunContext,
    variant_set,
};
use snafu::OptionExt;

use crate::KernelId;

const ID: KernelId = KernelId::LcalsHydro1d;
const DEFAULT_SIZE: usize = 1_000_000;
const DEFAULT_REPS: usize = 1000;

/// `z` is read up to `i + 11`.
const Z_PADDING: usize = 12;

pub(crate) const Y_FACTOR: Real = 1.5;
pub(crate) const Z_FACTOR: Real = 2.5;
pub(crate) const Q_FACTOR: Real = 0.5;
pub(crate) const R_FACTOR: Real = 0.25;
pub(crate) const T_FACTOR: Real = 0.125;

struct Arrays {
    x: SpaceArray,
    y: SpaceArray,
    z: SpaceArray,
    q: Real,
    r: Real,
    t: Real,
}

pub struct Hydro1d {
    info: KernelInfo,
    data: Option<Arrays>,
}

impl Hydro1d {
    pub fn new() -> Self {
        let variants = variant_set(
            &[ImplStyle::Base, ImplStyle::Lambda, ImplStyle::Library],
            &[ExecutionFamily::Seq, ExecutionFamily::Threads],
        ) | variant_set(&[ImplStyle::Base, ImplStyle::Library], &[ExecutionFamily::GpuLaunch, ExecutionFamily::GpuOffload]);

        let info = KernelInfo::builder()
            .id(ID as u32)
            .name(ID.name())
            .default_size(DEFAULT_SIZE)
            .default_reps(DEFAULT_REPS)
            .variants(variants)
            .build();
        Self { info, data: None }
    }
}

impl Default for Hydro1d {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelBody for Hydro1d {
    fn info(&self) -> &KernelInfo {
        &self.info
    }

    fn set_up(&mut self, data: &DataContext<'_>) -> Result<()> {
        let n = data.target_size(DEFAULT_SIZE);
        let x = data.alloc_and_init_const(n, 0.0)?;
        let y = data.alloc_and_init_data(n, Y_FACTOR)?;
        let z = data.alloc_and_init_data(n + Z_PADDING, Z_FACTOR)?;

        self.data = Some(Arrays {
            x,
            y,
            z,
            q: init_scalar(Q_FACTOR),
            r: init_scalar(R_FACTOR),
            t: init_scalar(T_FACTOR),
        });
        Ok(())
    }

    fn run(&mut self, ctx: &mut RunContext<'_>) -> Result<()> {
        let Arrays { x, y, z, q, r, t } = self.data.as_mut().context(MissingDataSnafu { kernel: ID.name() })?;
        let (y, z) = (y.kernel_view(), z.kernel_view());
        let (q, r, t) = (*q, *r, *t);

        ctx.run_timed(x, |i: usize, _: Real| q + y[i] * (r * z[i + 10] + t * z[i + 11]))
    }

    fn checksum(&self, data: &DataContext<'_>) -> Result<f64> {
        let arrays = self.data.as_ref().context(MissingDataSnafu { kernel: ID.name() })?;
        Ok(data.checksum(&arrays.x, self.info.checksum_scale))
    }

    fn tear_down(&mut self, data: &DataContext<'_>) {
        if let Some(arrays) = self.data.take() {
            data.free(arrays.x);
            data.free(arrays.y);
            data.free(arrays.z);
        }
    }

    fn problem_size(&self) -> usize {
        self.data.as_ref().map_or(0, |arrays| arrays.x.len())
    }
}
