//! `a[i] = (i + 1) * v` through a one-dimensional view.

use perfsuite_device::{Real, SpaceArray};
use perfsuite_runtime::{
    DataContext, ExecutionFamily, ImplStyle, KernelBody, KernelInfo, MissingDataSnafu, Result, RunContext,
    variant_set,
};
use snafu::OptionExt;

use crate::KernelId;

const ID: KernelId = KernelId::BasicInitView1d;
const DEFAULT_SIZE: usize = 1_000_000;
const DEFAULT_REPS: usize = 2500;

pub(crate) const VALUE: Real = 0.00000123;

pub struct InitView1d {
    info: KernelInfo,
    a: Option<SpaceArray>,
}

impl InitView1d {
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
        Self { info, a: None }
    }
}

impl Default for InitView1d {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelBody for InitView1d {
    fn info(&self) -> &KernelInfo {
        &self.info
    }

    fn set_up(&mut self, data: &DataContext<'_>) -> Result<()> {
        self.a = Some(data.alloc_and_init_const(data.target_size(DEFAULT_SIZE), 0.0)?);
        Ok(())
    }

    fn run(&mut self, ctx: &mut RunContext<'_>) -> Result<()> {
        let a = self.a.as_mut().context(MissingDataSnafu { kernel: ID.name() })?;
        ctx.run_timed(a, |i: usize, _: Real| (i + 1) as Real * VALUE)
    }

    fn checksum(&self, data: &DataContext<'_>) -> Result<f64> {
        let a = self.a.as_ref().context(MissingDataSnafu { kernel: ID.name() })?;
        Ok(data.checksum(a, self.info.checksum_scale))
    }

    fn tear_down(&mut self, data: &DataContext<'_>) {
        if let Some(a) = self.a.take() {
            data.free(a);
        }
    }

    fn problem_size(&self) -> usize {
        self.a.as_ref().map_or(0, SpaceArray::len)
    }
}
