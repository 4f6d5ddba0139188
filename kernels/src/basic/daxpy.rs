//! `y[i] += a * x[i]`

use perfsuite_device::{Real, SpaceArray, init_data, init_data_const, init_scalar};
use perfsuite_runtime::{
    DataContext, ExecutionFamily, ImplStyle, KernelBody, KernelInfo, MissingDataSnafu, Result, RunContext,
    variant_set,
};
use snafu::OptionExt;

use crate::KernelId;

const ID: KernelId = KernelId::BasicDaxpy;
const DEFAULT_SIZE: usize = 1_000_000;
const DEFAULT_REPS: usize = 500;

pub(crate) const X_FACTOR: Real = 1.0;
pub(crate) const A_FACTOR: Real = 1.0;

struct Arrays {
    x: SpaceArray,
    y: SpaceArray,
    a: Real,
}

pub struct Daxpy {
    info: KernelInfo,
    data: Option<Arrays>,
}

impl Daxpy {
    pub fn new() -> Self {
        let variants = variant_set(
            &[ImplStyle::Base, ImplStyle::Lambda, ImplStyle::Library],
            &[ExecutionFamily::Seq, ExecutionFamily::Threads, ExecutionFamily::GpuLaunch],
        ) | variant_set(&[ImplStyle::Base, ImplStyle::Library], &[ExecutionFamily::GpuOffload]);

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

impl Default for Daxpy {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelBody for Daxpy {
    fn info(&self) -> &KernelInfo {
        &self.info
    }

    fn set_up(&mut self, data: &DataContext<'_>) -> Result<()> {
        let n = data.target_size(DEFAULT_SIZE);
        let x = data.alloc_and_init_data(n, X_FACTOR)?;
        let y = data.alloc_and_init_const(n, 0.0)?;
        self.data = Some(Arrays { x, y, a: init_scalar(A_FACTOR) });
        Ok(())
    }

    fn reset(&mut self, data: &DataContext<'_>) -> Result<()> {
        let arrays = self.data.as_mut().context(MissingDataSnafu { kernel: ID.name() })?;
        let n = arrays.y.len();
        data.reinit(&mut arrays.x, &init_data(n, X_FACTOR));
        data.reinit(&mut arrays.y, &init_data_const(n, 0.0));
        Ok(())
    }

    fn run(&mut self, ctx: &mut RunContext<'_>) -> Result<()> {
        let Arrays { x, y, a } = self.data.as_mut().context(MissingDataSnafu { kernel: ID.name() })?;
        let (x, a) = (x.kernel_view(), *a);
        ctx.run_timed(y, |i: usize, yi: Real| yi + a * x[i])
    }

    fn checksum(&self, data: &DataContext<'_>) -> Result<f64> {
        let arrays = self.data.as_ref().context(MissingDataSnafu { kernel: ID.name() })?;
        Ok(data.checksum(&arrays.y, self.info.checksum_scale))
    }

    fn tear_down(&mut self, data: &DataContext<'_>) {
        if let Some(Arrays { x, y, .. }) = self.data.take() {
            data.free(x);
            data.free(y);
        }
    }

    fn problem_size(&self) -> usize {
        self.data.as_ref().map_or(0, |arrays| arrays.y.len())
    }
}
