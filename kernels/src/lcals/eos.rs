//! Equation-of-state fragment:
//!
//! ```text
//! x[i] = u[i] + r*(z[i] + r*y[i])
//!      + t*(u[i+3] + r*(u[i+2] + r*u[i+1])
//!      + t*(u[i+6] + q*(u[i+5] + q*u[i+4])))
//! ```

use perfsuite_device::{Real, SpaceArray, init_scalar};
use perfsuite_runtime::{
    DataContext, ExecutionFamily, ImplStyle, KernelBody, KernelInfo, MissingDataSnafu, Result, RunContext,
    variant_set,
};
use snafu::OptionExt;

use crate::KernelId;

const ID: KernelId = KernelId::LcalsEos;
const DEFAULT_SIZE: usize = 1_000_000;
const DEFAULT_REPS: usize = 500;

/// `u` is read up to `i + 6`.
const U_PADDING: usize = 7;

struct Arrays {
    x: SpaceArray,
    y: SpaceArray,
    z: SpaceArray,
    u: SpaceArray,
    q: Real,
    r: Real,
    t: Real,
}

pub struct Eos {
    info: KernelInfo,
    data: Option<Arrays>,
}

impl Eos {
    pub fn new() -> Self {
        let variants = variant_set(
            &[ImplStyle::Base, ImplStyle::Lambda, ImplStyle::Library],
            &[ExecutionFamily::Seq, ExecutionFamily::Threads],
        ) | variant_set(&[ImplStyle::Base, ImplStyle::Library], &[ExecutionFamily::GpuLaunch, ExecutionFamily::GpuOffload]);

        // Launches always use 256-wide blocks.
        let info = KernelInfo::builder()
            .id(ID as u32)
            .name(ID.name())
            .default_size(DEFAULT_SIZE)
            .default_reps(DEFAULT_REPS)
            .variants(variants)
            .gpu_block_sizes(vec![256])
            .build();
        Self { info, data: None }
    }
}

impl Default for Eos {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelBody for Eos {
    fn info(&self) -> &KernelInfo {
        &self.info
    }

    fn set_up(&mut self, data: &DataContext<'_>) -> Result<()> {
        let n = data.target_size(DEFAULT_SIZE);
        let x = data.alloc_and_init_const(n, 0.0)?;
        let y = data.alloc_and_init_data(n, 1.0)?;
        let z = data.alloc_and_init_data(n, 2.0)?;
        let u = data.alloc_and_init_data(n + U_PADDING, 3.0)?;

        self.data = Some(Arrays { x, y, z, u, q: init_scalar(0.5), r: init_scalar(0.25), t: init_scalar(0.125) });
        Ok(())
    }

    fn run(&mut self, ctx: &mut RunContext<'_>) -> Result<()> {
        let Arrays { x, y, z, u, q, r, t } = self.data.as_mut().context(MissingDataSnafu { kernel: ID.name() })?;
        let (y, z, u) = (y.kernel_view(), z.kernel_view(), u.kernel_view());
        let (q, r, t) = (*q, *r, *t);

        ctx.run_timed(x, |i: usize, _: Real| {
            u[i] + r * (z[i] + r * y[i])
                + t * (u[i + 3] + r * (u[i + 2] + r * u[i + 1]) + t * (u[i + 6] + q * (u[i + 5] + q * u[i + 4])))
        })
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
            data.free(arrays.u);
        }
    }

    fn problem_size(&self) -> usize {
        self.data.as_ref().map_or(0, |arrays| arrays.x.len())
    }
}
