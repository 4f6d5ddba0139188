//! Benchmark kernels.
//!
//! Each kernel implements [`KernelBody`] for the variants it supports and is
//! registered under a `Group_NAME` identifier in [`KernelId`].

pub mod basic;
pub mod lcals;
pub mod polybench;

#[cfg(test)]
pub mod test;

use perfsuite_runtime::KernelBody;
use strum::VariantArray;
use tracing::warn;

/// Kernel groups, used as name prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(strum::Display, strum::EnumString, strum::EnumIter, strum::VariantArray, strum::IntoStaticStr)]
pub enum KernelGroup {
    Basic,
    Lcals,
    Polybench,
}

/// Every kernel in the suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(strum::Display, strum::EnumString, strum::EnumIter, strum::VariantArray, strum::IntoStaticStr)]
pub enum KernelId {
    #[strum(serialize = "Basic_DAXPY")]
    BasicDaxpy,
    #[strum(serialize = "Basic_INIT_VIEW1D")]
    BasicInitView1d,
    #[strum(serialize = "Basic_INIT_VIEW1D_OFFSET")]
    BasicInitView1dOffset,
    #[strum(serialize = "Basic_NESTED_INIT")]
    BasicNestedInit,
    #[strum(serialize = "Lcals_EOS")]
    LcalsEos,
    #[strum(serialize = "Lcals_HYDRO_1D")]
    LcalsHydro1d,
    #[strum(serialize = "Polybench_GEMM")]
    PolybenchGemm,
}

impl KernelId {
    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn group(self) -> KernelGroup {
        match self {
            Self::BasicDaxpy | Self::BasicInitView1d | Self::BasicInitView1dOffset | Self::BasicNestedInit => {
                KernelGroup::Basic
            }
            Self::LcalsEos | Self::LcalsHydro1d => KernelGroup::Lcals,
            Self::PolybenchGemm => KernelGroup::Polybench,
        }
    }

    /// Fresh kernel instance with no data.
    pub fn create(self) -> Box<dyn KernelBody> {
        match self {
            Self::BasicDaxpy => Box::new(basic::Daxpy::new()),
            Self::BasicInitView1d => Box::new(basic::InitView1d::new()),
            Self::BasicInitView1dOffset => Box::new(basic::InitView1dOffset::new()),
            Self::BasicNestedInit => Box::new(basic::NestedInit::new()),
            Self::LcalsEos => Box::new(lcals::Eos::new()),
            Self::LcalsHydro1d => Box::new(lcals::Hydro1d::new()),
            Self::PolybenchGemm => Box::new(polybench::Gemm::new()),
        }
    }
}

/// One instance of every kernel, in suite order.
pub fn all_kernels() -> Vec<Box<dyn KernelBody>> {
    KernelId::VARIANTS.iter().map(|id| id.create()).collect()
}

/// Kernels selected by full name (`Lcals_EOS`) or group name (`Lcals`).
///
/// Each kernel appears once, in suite order. Names matching nothing are logged
/// and ignored.
pub fn kernels_matching<S: AsRef<str>>(names: &[S]) -> Vec<Box<dyn KernelBody>> {
    let names: Vec<&str> = names.iter().map(|name| name.as_ref()).collect();
    for &name in &names {
        if !KernelId::VARIANTS.iter().any(|&id| selects(name, id)) {
            warn!(name, "no kernel or group with this name");
        }
    }

    KernelId::VARIANTS
        .iter()
        .filter(|&&id| names.iter().any(|name| selects(name, id)))
        .map(|id| id.create())
        .collect()
}

fn selects(name: &str, id: KernelId) -> bool {
    id.name() == name || <&'static str>::from(id.group()) == name
}
